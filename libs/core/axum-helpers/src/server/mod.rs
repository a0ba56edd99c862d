//! Server infrastructure module.
//!
//! This module provides:
//! - Listener binding with listen-error classification
//! - Serving with coordinated graceful shutdown and cleanup
//! - Health and readiness endpoints
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{bind, create_production_app, health_router, ShutdownCoordinator};
//! use core_config::app_info;
//!
//! let listener = match bind(&config.server).await {
//!     Ok(listener) => listener,
//!     Err(err) => match err.exit_code() {
//!         Some(code) => std::process::exit(code),
//!         None => return Err(err.into()),
//!     },
//! };
//!
//! let app = create_router(api_routes).merge(health_router(app_info!()));
//! create_production_app(app, listener, coordinator, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{BoundListener, ListenError, bind, create_production_app, create_router, serve};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
