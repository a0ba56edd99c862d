#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

/// MongoDB connection settings for one logical database.
///
/// # Example
///
/// ```ignore
/// use database::mongodb::MongoConfig;
///
/// let config = MongoConfig::new("mongodb://localhost:27017", "presence")
///     .with_app_name("presence-api");
///
/// // From environment variables (requires `config` feature)
/// let config = MongoConfig::from_env()?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MongoConfig {
    /// Connection string, also the key of the connection cache
    pub uri: String,

    /// Logical database name
    pub database: String,

    /// Optional application name for server logs
    pub app_name: Option<String>,

    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_pool_size(mut self, max_pool_size: u32, min_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self.min_pool_size = min_pool_size;
        self
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "default".to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 0,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

/// Load MongoConfig from environment variables
///
/// - `DB_URI` (required) - connection string
/// - `DB_NAME` (required) - database name
/// - `DB_APP_NAME` (optional)
/// - `DB_MAX_POOL_SIZE` (default: 100)
/// - `DB_MIN_POOL_SIZE` (default: 0)
/// - `DB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `DB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            uri: env_required("DB_URI")?,
            database: env_required("DB_NAME")?,
            app_name: std::env::var("DB_APP_NAME").ok(),
            max_pool_size: env_parse_or("DB_MAX_POOL_SIZE", defaults.max_pool_size)?,
            min_pool_size: env_parse_or("DB_MIN_POOL_SIZE", defaults.min_pool_size)?,
            connect_timeout_secs: env_parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            server_selection_timeout_secs: env_parse_or(
                "DB_SERVER_SELECTION_TIMEOUT_SECS",
                defaults.server_selection_timeout_secs,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_config_new() {
        let config = MongoConfig::new("mongodb://db:27017", "presence");
        assert_eq!(config.uri, "mongodb://db:27017");
        assert_eq!(config.database, "presence");
        assert_eq!(config.max_pool_size, 100);
        assert!(config.app_name.is_none());
    }

    #[test]
    fn test_mongo_config_builders() {
        let config = MongoConfig::new("mongodb://db:27017", "presence")
            .with_app_name("presence-api")
            .with_pool_size(20, 2);
        assert_eq!(config.app_name.as_deref(), Some("presence-api"));
        assert_eq!(config.max_pool_size, 20);
        assert_eq!(config.min_pool_size, 2);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env() {
        temp_env::with_vars(
            [
                ("DB_URI", Some("mongodb://localhost:27017")),
                ("DB_NAME", Some("testdb")),
                ("DB_MAX_POOL_SIZE", Some("10")),
            ],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.uri, "mongodb://localhost:27017");
                assert_eq!(config.database, "testdb");
                assert_eq!(config.max_pool_size, 10);
                assert_eq!(config.connect_timeout_secs, 10);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_missing_uri() {
        temp_env::with_vars(
            [("DB_URI", None::<&str>), ("DB_NAME", Some("testdb"))],
            || {
                let err = MongoConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_URI"));
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_missing_name() {
        temp_env::with_vars(
            [("DB_URI", Some("mongodb://localhost:27017")), ("DB_NAME", None)],
            || {
                let err = MongoConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_NAME"));
            },
        );
    }
}
