//! rmcp-backed SSE protocol engine
//!
//! Each [`SseEngine`] owns an rmcp `SseServer` whose axum router is mounted
//! at `/mcp/{name}/sse` and `/mcp/{name}/message`. The server is never bound
//! to a socket of its own: the main application forwards matching requests
//! into the router with `tower::ServiceExt::oneshot`.
//!
//! Sessions share the engine's tool table, so tool changes reach sessions
//! that are already open. Event streams handed out by the engine end when
//! the engine shuts down.

use crate::mcp::engine::{EngineError, EngineFactory, EngineSpec, ProtocolEngine};
use crate::mcp::service::OmcpService;
use crate::models::ToolSpec;
use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{header, Method},
    response::Response,
    Router as AxumRouter,
};
use rmcp::transport::sse_server::{SseServer, SseServerConfig};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const DEFAULT_SSE_KEEP_ALIVE: Duration = Duration::from_secs(30);

const STREAM_BUFFER: usize = 64 * 1024;

pub struct SseEngine {
    name: String,
    sse_path: String,
    post_path: String,
    sse_router: AxumRouter,
    service: OmcpService,
    ct: CancellationToken,
}

impl SseEngine {
    /// Creates the engine and spawns the rmcp session loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(spec: &EngineSpec, keep_alive: Duration) -> Result<Self, EngineError> {
        let ct = CancellationToken::new();
        let sse_path = format!("/mcp/{}/sse", spec.name);
        let post_path = format!("/mcp/{}/message", spec.name);

        let bind = "127.0.0.1:0"
            .parse()
            .map_err(|e| EngineError::Transport(format!("Invalid bind addr: {}", e)))?;

        let config = SseServerConfig {
            bind,
            sse_path: sse_path.clone(),
            post_path: post_path.clone(),
            ct: ct.clone(),
            sse_keep_alive: Some(keep_alive),
        };

        let (sse_server, sse_router) = SseServer::new(config);

        let service = OmcpService::new(
            spec.name.clone(),
            spec.version.clone(),
            spec.description.clone(),
        );
        let session_service = service.clone();
        let _session_ct = sse_server.with_service(move || session_service.clone());

        Ok(Self {
            name: spec.name.clone(),
            sse_path,
            post_path,
            sse_router,
            service,
            ct,
        })
    }

    pub fn sse_path(&self) -> &str {
        &self.sse_path
    }

    pub fn post_path(&self) -> &str {
        &self.post_path
    }

    pub fn tool_count(&self) -> usize {
        self.service.tool_names().len()
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.ct.is_cancelled() {
            Err(EngineError::ShutDown)
        } else {
            Ok(())
        }
    }

    async fn forward(&self, request: Request) -> Result<Response, EngineError> {
        self.ensure_live()?;
        self.sse_router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ProtocolEngine for SseEngine {
    async fn start(&self) -> Result<(), EngineError> {
        self.ensure_live()?;
        tracing::debug!(server = %self.name, "SSE engine accepting traffic");
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        tracing::debug!(server = %self.name, "SSE engine no longer routed");
        Ok(())
    }

    async fn serve_connection(&self, request: Request) -> Result<Response, EngineError> {
        let response = self.forward(request).await?;
        Ok(until_cancelled(response, self.ct.clone()))
    }

    async fn serve_message(&self, request: Request) -> Result<Response, EngineError> {
        self.forward(request).await
    }

    async fn add_tool(&self, tool: ToolSpec) -> Result<(), EngineError> {
        self.service.register_tool(&tool)
    }

    async fn delete_tool(&self, name: &str) -> Result<(), EngineError> {
        if self.service.remove_tool(name)? {
            Ok(())
        } else {
            Err(EngineError::ToolNotFound(name.to_string()))
        }
    }

    /// Opens an SSE session on the connect path and drops it once the
    /// response head arrives
    async fn ping(&self) -> Result<(), EngineError> {
        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri(&self.sse_path)
            .header(header::ACCEPT, "text/event-stream")
            .body(Body::empty())
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let response = self.forward(request).await?;
        if !response.status().is_success() {
            return Err(EngineError::Unhealthy(format!(
                "{} answered {}",
                self.sse_path,
                response.status()
            )));
        }
        Ok(())
    }

    async fn shutdown(&self) {
        self.ct.cancel();
    }
}

/// Re-streams a response body so it ends once `ct` is cancelled
///
/// rmcp keeps an event stream open until the client hangs up, even after
/// its session task is gone.
fn until_cancelled(response: Response, ct: CancellationToken) -> Response {
    let (parts, mut body) = response.into_parts();
    let (mut writer, reader) = tokio::io::duplex(STREAM_BUFFER);

    tokio::spawn(async move {
        let pump = async {
            while let Some(Ok(frame)) =
                std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await
            {
                if let Ok(data) = frame.into_data() {
                    if writer.write_all(&data).await.is_err() {
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = ct.cancelled() => {}
            _ = pump => {}
        }
    });

    Response::from_parts(parts, Body::from_stream(ReaderStream::new(reader)))
}

/// Builds an [`SseEngine`] for every created instance
#[derive(Debug, Clone)]
pub struct SseEngineFactory {
    keep_alive: Duration,
}

impl SseEngineFactory {
    pub fn new(keep_alive: Duration) -> Self {
        Self { keep_alive }
    }
}

impl Default for SseEngineFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SSE_KEEP_ALIVE)
    }
}

impl EngineFactory for SseEngineFactory {
    fn build(&self, spec: &EngineSpec) -> Result<Arc<dyn ProtocolEngine>, EngineError> {
        Ok(Arc::new(SseEngine::new(spec, self.keep_alive)?))
    }
}
