use crate::{env_or_default, env_parse_or, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// Listener settings for the WebSocket broadcast endpoint.
///
/// The broadcast endpoint runs on its own port, separate from the HTTP API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl BroadcastConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for BroadcastConfig {
    /// - WS_HOST: defaults to 0.0.0.0
    /// - WS_PORT: defaults to 9999
    /// - WS_PATH: defaults to "/"
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("WS_HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse_or("WS_PORT", 9999u16)?;
        let mut path = env_or_default("WS_PATH", "/");
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        Ok(Self { host, port, path })
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 9999,
            path: "/".to_string(),
        }
    }
}
