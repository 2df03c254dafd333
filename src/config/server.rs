use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PLUGIN_DIR: &str = "./plugins";
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_SSE_KEEP_ALIVE_SECS: u64 = 30;
pub const DEFAULT_MAX_PLUGIN_BYTES: usize = 64 * 1024 * 1024;

/// Daemon settings, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub plugin_dir: PathBuf,
    pub ping_timeout: Duration,
    pub sse_keep_alive: Duration,
    pub max_plugin_bytes: usize,
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: DEFAULT_PORT,
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            ping_timeout: Duration::from_millis(DEFAULT_PING_TIMEOUT_MS),
            sse_keep_alive: Duration::from_secs(DEFAULT_SSE_KEEP_ALIVE_SECS),
            max_plugin_bytes: DEFAULT_MAX_PLUGIN_BYTES,
            seed_demo: false,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment
    ///
    /// Unset variables take their defaults; set but unparsable ones are
    /// errors.
    pub fn from_env() -> Result<Self> {
        let host = env_or("HOST", DEFAULT_HOST)
            .parse::<IpAddr>()
            .context("HOST must be an IP address")?;
        let port = env_parsed("PORT", DEFAULT_PORT)?;
        let plugin_dir = PathBuf::from(env_or("OMCP_PLUGIN_DIR", DEFAULT_PLUGIN_DIR));
        let ping_timeout_ms = env_parsed("OMCP_PING_TIMEOUT_MS", DEFAULT_PING_TIMEOUT_MS)?;
        let keep_alive_secs = env_parsed("OMCP_SSE_KEEP_ALIVE_SECS", DEFAULT_SSE_KEEP_ALIVE_SECS)?;
        let max_plugin_bytes = env_parsed("OMCP_MAX_PLUGIN_BYTES", DEFAULT_MAX_PLUGIN_BYTES)?;

        if ping_timeout_ms == 0 {
            anyhow::bail!("OMCP_PING_TIMEOUT_MS must be greater than zero");
        }

        Ok(Self {
            host,
            port,
            plugin_dir,
            ping_timeout: Duration::from_millis(ping_timeout_ms),
            sse_keep_alive: Duration::from_secs(keep_alive_secs),
            max_plugin_bytes,
            seed_demo: env_flag_enabled("OMCP_SEED_DEMO"),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", key, value)),
        Err(_) => Ok(default),
    }
}

fn env_flag_enabled(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}
