//! Database library: a shared connection cache, a model registry and a
//! MongoDB-backed database handle built on top of them.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connector and [`mongodb::Database`] handle
//! - `config` - `core_config::FromEnv` support for [`mongodb::MongoConfig`]
//! - `all` - All features
//!
//! # Example
//!
//! ```ignore
//! use database::{ModelRegistry, Model};
//! use database::mongodb::{Database, MongoConfig, MongoConnectionCache, MongoConnector};
//! use std::sync::Arc;
//!
//! struct Note;
//! impl Model for Note {
//!     const NAME: &'static str = "Note";
//! }
//!
//! let config = MongoConfig::new("mongodb://localhost:27017", "presence");
//! let cache = MongoConnectionCache::new(MongoConnector::from_config(&config));
//! let registry = Arc::new(ModelRegistry::new().with::<Note>("notes"));
//!
//! let db = Database::from_config(&config, cache, registry);
//! db.connect().await?;
//! let notes = db.collection::<Note>()?;
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{
    CloseSignal, ConnectionCache, Connector, DatabaseError, DatabaseResult, Model, ModelMetadata,
    ModelRegistry,
};
