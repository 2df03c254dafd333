pub mod test_helpers {
    use crate::mcp::engine::{EngineError, EngineFactory, EngineSpec, ProtocolEngine};
    use crate::mcp::registry::McpServerRegistry;
    use crate::models::{ToolDescriptor, ToolSpec};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        extract::Request,
        http::{header, StatusCode},
        response::{IntoResponse, Response},
    };
    use rmcp::model::{CallToolResult, Content};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// In-memory engine that records what the core asked it to do
    ///
    /// `serve_connection` answers with a one-event SSE body and
    /// `serve_message` with `202 Accepted`, which is enough to observe routing
    /// without a real MCP transport.
    pub struct StubEngine {
        name: String,
        tools: Mutex<Vec<String>>,
        healthy: AtomicBool,
        ping_delay: Mutex<Option<Duration>>,
        shut_down: AtomicBool,
        start_calls: AtomicUsize,
        stop_calls: AtomicUsize,
        connections: AtomicUsize,
        messages: AtomicUsize,
    }

    impl StubEngine {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                tools: Mutex::new(Vec::new()),
                healthy: AtomicBool::new(true),
                ping_delay: Mutex::new(None),
                shut_down: AtomicBool::new(false),
                start_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
                connections: AtomicUsize::new(0),
                messages: AtomicUsize::new(0),
            }
        }

        pub fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }

        pub fn set_ping_delay(&self, delay: Duration) {
            *self.ping_delay.lock().unwrap() = Some(delay);
        }

        pub fn tool_names(&self) -> Vec<String> {
            self.tools.lock().unwrap().clone()
        }

        pub fn is_shut_down(&self) -> bool {
            self.shut_down.load(Ordering::SeqCst)
        }

        pub fn start_calls(&self) -> usize {
            self.start_calls.load(Ordering::SeqCst)
        }

        pub fn stop_calls(&self) -> usize {
            self.stop_calls.load(Ordering::SeqCst)
        }

        pub fn connections(&self) -> usize {
            self.connections.load(Ordering::SeqCst)
        }

        pub fn messages(&self) -> usize {
            self.messages.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProtocolEngine for StubEngine {
        async fn start(&self) -> Result<(), EngineError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<(), EngineError> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn serve_connection(&self, _request: Request) -> Result<Response, EngineError> {
            self.connections.fetch_add(1, Ordering::SeqCst);
            let body = format!("event: endpoint\ndata: /mcp/{}/message\n\n", self.name);
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from(body),
            )
                .into_response())
        }

        async fn serve_message(&self, _request: Request) -> Result<Response, EngineError> {
            self.messages.fetch_add(1, Ordering::SeqCst);
            Ok((StatusCode::ACCEPTED, "accepted").into_response())
        }

        async fn add_tool(&self, tool: ToolSpec) -> Result<(), EngineError> {
            self.tools.lock().unwrap().push(tool.name().to_string());
            Ok(())
        }

        async fn delete_tool(&self, name: &str) -> Result<(), EngineError> {
            let mut tools = self.tools.lock().unwrap();
            let before = tools.len();
            tools.retain(|t| t != name);
            if tools.len() == before {
                return Err(EngineError::ToolNotFound(name.to_string()));
            }
            Ok(())
        }

        async fn ping(&self) -> Result<(), EngineError> {
            let delay = *self.ping_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(EngineError::Unhealthy(format!("{} is unhealthy", self.name)))
            }
        }

        async fn shutdown(&self) {
            self.shut_down.store(true, Ordering::SeqCst);
        }
    }

    /// Factory that hands out [`StubEngine`]s and keeps them for inspection
    #[derive(Default)]
    pub struct StubEngineFactory {
        engines: Mutex<HashMap<String, Arc<StubEngine>>>,
        built: AtomicUsize,
        fail: AtomicBool,
    }

    impl StubEngineFactory {
        /// The most recent engine built for `name`
        pub fn engine(&self, name: &str) -> Option<Arc<StubEngine>> {
            self.engines.lock().unwrap().get(name).cloned()
        }

        pub fn built_count(&self) -> usize {
            self.built.load(Ordering::SeqCst)
        }

        pub fn fail_builds(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl EngineFactory for StubEngineFactory {
        fn build(&self, spec: &EngineSpec) -> Result<Arc<dyn ProtocolEngine>, EngineError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(EngineError::Transport("engine construction disabled".into()));
            }
            let engine = Arc::new(StubEngine::new(&spec.name));
            self.engines
                .lock()
                .unwrap()
                .insert(spec.name.clone(), engine.clone());
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(engine)
        }
    }

    /// Registry backed by [`StubEngineFactory`]
    pub fn stub_registry() -> (McpServerRegistry, Arc<StubEngineFactory>) {
        let factory = Arc::new(StubEngineFactory::default());
        (McpServerRegistry::new(factory.clone()), factory)
    }

    /// Tool that echoes its `text` argument back
    pub fn echo_tool(name: &str) -> ToolSpec {
        ToolSpec::new(
            ToolDescriptor::new(name, format!("Echo tool {}", name)),
            |args| async move {
                let text = args
                    .as_ref()
                    .and_then(|a| a.get("text"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Ok(CallToolResult::success(vec![Content::text(text)]))
            },
        )
    }
}
