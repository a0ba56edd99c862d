use mongodb::{Client, Collection};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::{MongoConfig, MongoConnector};
use crate::common::{
    ConnectionCache, Connector, DatabaseError, DatabaseResult, Model, ModelRegistry,
};

/// One logical database reached through a shared [`ConnectionCache`].
///
/// Construct once at startup and share it (usually behind an `Arc`) with the
/// request handlers. Nothing is connected until [`connect`](Self::connect)
/// is called.
pub struct Database<C = MongoConnector>
where
    C: Connector<Client = Client>,
{
    uri: String,
    name: String,
    cache: ConnectionCache<C>,
    registry: Arc<ModelRegistry>,
    client: Mutex<Option<Client>>,
}

impl<C> Database<C>
where
    C: Connector<Client = Client>,
{
    pub fn new(
        uri: impl Into<String>,
        name: impl Into<String>,
        cache: ConnectionCache<C>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            cache,
            registry,
            client: Mutex::new(None),
        }
    }

    pub fn from_config(
        config: &MongoConfig,
        cache: ConnectionCache<C>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        Self::new(&config.uri, &config.database, cache, registry)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Acquires a client for this database's URI and keeps a reference to it.
    pub async fn connect(&self) -> DatabaseResult<()> {
        let client = self.cache.acquire(&self.uri).await?;
        *self.stored() = Some(client);
        Ok(())
    }

    /// The selected database on the connected client.
    ///
    /// Fails with [`DatabaseError::NotConnected`] before the first successful
    /// [`connect`](Self::connect), and again once the client has closed.
    pub fn current(&self) -> DatabaseResult<mongodb::Database> {
        let mut stored = self.stored();
        if stored.is_none() {
            return Err(DatabaseError::NotConnected);
        }

        match self.cache.cached(&self.uri) {
            Some(live) => {
                let database = live.database(&self.name);
                *stored = Some(live);
                Ok(database)
            }
            None => {
                debug!("dropping stale client for {}", self.uri);
                *stored = None;
                Err(DatabaseError::NotConnected)
            }
        }
    }

    /// The collection registered for `T`, on the current database.
    pub fn collection<T: Model>(&self) -> DatabaseResult<Collection<T>> {
        let metadata = self
            .registry
            .metadata::<T>()
            .ok_or_else(|| DatabaseError::UnresolvedModel(T::NAME.to_string()))?;

        Ok(self.current()?.collection::<T>(&metadata.collection))
    }

    pub fn is_connected(&self) -> bool {
        self.current().is_ok()
    }

    /// Shuts the client down and forgets it. A no-op when not connected.
    pub async fn close(&self) {
        let client = self.stored().take();
        if let Some(client) = client {
            self.cache.invalidate(&self.uri);
            client.shutdown().await;
            debug!("closed connection to {}", self.uri);
        }
    }

    fn stored(&self) -> MutexGuard<'_, Option<Client>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
