//! MongoDB connector, connection cache and database handle

mod config;
mod connector;
mod handle;
mod health;

pub use config::MongoConfig;
pub use connector::{MongoConnectionCache, MongoConnector};
pub use handle::Database;
pub use health::{HealthStatus, check_health, check_health_detailed};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, bson};
