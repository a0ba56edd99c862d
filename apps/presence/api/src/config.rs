use core_config::{AppInfo, FromEnv, app_info, broadcast::BroadcastConfig, server::ServerConfig};
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// Application configuration, composed from the shared config components.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: MongoConfig,
    pub server: ServerConfig,
    pub broadcast: BroadcastConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = MongoConfig::from_env()?; // DB_URI and DB_NAME are required
        let server = ServerConfig::from_env()?;
        let broadcast = BroadcastConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            database,
            server,
            broadcast,
            environment,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            app: app_info!(),
            // Nothing listens on port 1; connects fail after one second
            database: MongoConfig {
                connect_timeout_secs: 1,
                server_selection_timeout_secs: 1,
                ..MongoConfig::new("mongodb://127.0.0.1:1", "presence")
            },
            server: ServerConfig::default(),
            broadcast: BroadcastConfig::default(),
            environment: Environment::Development,
        }
    }
}
