//! # Axum Helpers
//!
//! Utilities for running Axum services.
//!
//! ## Modules
//!
//! - **[`server`]**: Listener binding, graceful shutdown, health checks
//! - **[`errors`]**: Structured JSON error responses
//! - **[`ws`]**: WebSocket connection tracking and broadcast
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{bind, create_production_app, create_router, ShutdownCoordinator};
//! use core_config::server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let router = create_router(Router::new());
//!     let listener = bind(&ServerConfig::default()).await?;
//!
//!     let coordinator = ShutdownCoordinator::new();
//!     tokio::spawn({
//!         let coordinator = coordinator.clone();
//!         async move { coordinator.wait_for_signal().await }
//!     });
//!
//!     create_production_app(router, listener, coordinator, Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod server;
pub mod ws;

pub use errors::{AppError, ErrorResponse};

pub use server::{
    BoundListener, HealthCheckFuture, HealthResponse, ListenError, ShutdownCoordinator, bind,
    create_production_app, create_router, health_router, run_health_checks, serve,
    shutdown_signal,
};

pub use ws::{ConnectionEvent, ConnectionId, ConnectionSet, ReadyState};
