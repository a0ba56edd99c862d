use crate::{env_or_default, ConfigError, FromEnv};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Where the HTTP server listens: a TCP port or a named pipe (Unix socket path).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenTarget {
    Port(u16),
    Pipe(PathBuf),
}

impl ListenTarget {
    /// Normalizes a raw `PORT` value.
    ///
    /// Numeric values must fit in a TCP port; anything non-numeric is taken
    /// as a pipe path.
    pub fn normalize(raw: &str) -> Result<Self, ConfigError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ConfigError::ParseError {
                key: "PORT".to_string(),
                details: "value is empty".to_string(),
            });
        }

        match value.parse::<i64>() {
            Ok(number) => u16::try_from(number)
                .map(ListenTarget::Port)
                .map_err(|_| ConfigError::ParseError {
                    key: "PORT".to_string(),
                    details: format!("{} is not a valid port", number),
                }),
            Err(_) => Ok(ListenTarget::Pipe(PathBuf::from(value))),
        }
    }
}

impl fmt::Display for ListenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenTarget::Port(port) => write!(f, "Port {}", port),
            ListenTarget::Pipe(path) => write!(f, "Pipe {}", path.display()),
        }
    }
}

/// Server configuration for HTTP APIs
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub target: ListenTarget,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            target: ListenTarget::Port(port),
        }
    }

    pub fn with_pipe(path: impl Into<PathBuf>) -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            target: ListenTarget::Pipe(path.into()),
        }
    }

    /// Get the socket address as "host:port", `None` for pipes
    pub fn address(&self) -> Option<String> {
        match &self.target {
            ListenTarget::Port(port) => Some(format!("{}:{}", self.host, port)),
            ListenTarget::Pipe(_) => None,
        }
    }
}

impl FromEnv for ServerConfig {
    /// Reads from environment variables with defaults:
    /// - HOST: defaults to 0.0.0.0
    /// - PORT: defaults to 3000, a non-numeric value selects a pipe
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let target = ListenTarget::normalize(&env_or_default("PORT", "3000"))?;

        Ok(Self { host, target })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Ipv4Addr::UNSPECIFIED.to_string(), 3000)
    }
}
