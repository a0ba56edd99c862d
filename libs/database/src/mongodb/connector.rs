use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::event::EventHandler;
use mongodb::event::sdam::SdamEvent;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;
use tracing::{info, warn};

use super::MongoConfig;
use crate::common::{CloseSignal, ConnectionCache, Connector, DatabaseError, DatabaseResult};

/// Connection cache backed by the MongoDB driver.
pub type MongoConnectionCache = ConnectionCache<MongoConnector>;

/// Creates MongoDB clients with shared pool and timeout settings.
///
/// Every client gets an SDAM handler that fires its [`CloseSignal`] when the
/// topology closes, and is verified with a `ping` before it is returned.
#[derive(Clone, Debug)]
pub struct MongoConnector {
    app_name: Option<String>,
    max_pool_size: u32,
    min_pool_size: u32,
    connect_timeout: Duration,
    server_selection_timeout: Duration,
}

impl MongoConnector {
    pub fn new() -> Self {
        Self::from_config(&MongoConfig::default())
    }

    pub fn from_config(config: &MongoConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            max_pool_size: config.max_pool_size,
            min_pool_size: config.min_pool_size,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            server_selection_timeout: Duration::from_secs(config.server_selection_timeout_secs),
        }
    }

    /// Parses `uri` and applies this connector's settings, without connecting.
    pub async fn options(&self, uri: &str) -> DatabaseResult<ClientOptions> {
        let mut options = ClientOptions::parse(uri).await?;

        options.max_pool_size = Some(self.max_pool_size);
        options.min_pool_size = Some(self.min_pool_size);
        options.connect_timeout = Some(self.connect_timeout);
        options.server_selection_timeout = Some(self.server_selection_timeout);

        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }

        Ok(options)
    }
}

impl Default for MongoConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Client = Client;

    async fn connect(&self, uri: &str, on_close: CloseSignal) -> DatabaseResult<Client> {
        info!("Attempting to connect to MongoDB at {}", uri);

        let mut options = self.options(uri).await?;
        options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
            if let SdamEvent::TopologyClosed(_) = event {
                on_close.notify();
            }
        }));

        let client = Client::with_options(options)?;

        ping(&client.database("admin")).await.map_err(|e| {
            warn!("MongoDB at {} did not answer ping: {}", uri, e);
            DatabaseError::ConnectionFailed(e.to_string())
        })?;

        Ok(client)
    }
}

pub(crate) async fn ping(database: &Database) -> Result<(), mongodb::error::Error> {
    database.run_command(doc! { "ping": 1 }).await.map(|_| ())
}
