//! Driver-agnostic pieces shared by the database connectors

pub mod cache;
pub mod error;
pub mod model;

pub use cache::{CloseSignal, ConnectionCache, Connector};
pub use error::{DatabaseError, DatabaseResult};
pub use model::{Model, ModelMetadata, ModelRegistry};
