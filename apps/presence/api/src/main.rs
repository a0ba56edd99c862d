use axum_helpers::server::{ShutdownCoordinator, bind, create_production_app, serve};
use axum_helpers::ws::ConnectionSet;
use core_config::server::ServerConfig;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::ModelRegistry;
use database::mongodb::{Database, MongoConnectionCache, MongoConnector};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod presence;
mod state;

use api::notes::Note;
use config::Config;
use state::AppState;

/// Binds `server`, ending the process with the classified exit status for
/// privilege and address-in-use failures.
async fn bind_or_exit(server: &ServerConfig) -> eyre::Result<axum_helpers::BoundListener> {
    match bind(server).await {
        Ok(listener) => Ok(listener),
        Err(e) => match e.exit_code() {
            Some(code) => {
                tracing::error!("{}", e);
                std::process::exit(code);
            }
            None => Err(e.into()),
        },
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before any fallible operation so startup errors are reported in color
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let cache = MongoConnectionCache::new(MongoConnector::from_config(&config.database));
    let registry = Arc::new(ModelRegistry::new().with::<Note>("notes"));
    let db = Arc::new(Database::from_config(&config.database, cache, registry));

    let state = AppState {
        config: config.clone(),
        db,
    };
    let app = api::app(&state);

    let coordinator = ShutdownCoordinator::new();
    tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.wait_for_signal().await }
    });

    let http_listener = bind_or_exit(&config.server).await?;
    let ws_listener = bind(&ServerConfig::new(
        config.broadcast.host.clone(),
        config.broadcast.port,
    ))
    .await?;

    // Requests before the connect lands get 503s; the listeners don't wait on it
    state.spawn_connect();

    let http = create_production_app(
        app,
        http_listener,
        coordinator.clone(),
        Duration::from_secs(30),
        {
            let db = state.db.clone();
            async move {
                info!("Shutting down: closing database connection");
                db.close().await;
            }
        },
    );

    let ws = {
        let url = format!("{}{}", ws_listener.url("ws"), config.broadcast.path);
        let router = presence::router(ConnectionSet::new(), &config.broadcast.path);
        let shutdown = coordinator.wait_for_shutdown();
        let coordinator = coordinator.clone();
        async move {
            info!("broadcast server running on {}", url);
            serve(router, ws_listener, shutdown)
                .await
                .inspect_err(|_| coordinator.shutdown())
        }
    };

    tokio::try_join!(http, ws).map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Presence API shutdown complete");
    Ok(())
}
