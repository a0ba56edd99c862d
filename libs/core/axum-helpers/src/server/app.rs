use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use axum::Router;
use core_config::server::{ListenTarget, ServerConfig};
use std::future::Future;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// A bound socket, ready to be served.
#[derive(Debug)]
pub enum BoundListener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(tokio::net::UnixListener),
}

impl BoundListener {
    /// Address of the bound socket as a URL, e.g. `http://127.0.0.1:3000` or `unix:/run/app.sock`.
    pub fn url(&self, scheme: &str) -> String {
        match self {
            BoundListener::Tcp(listener) => match listener.local_addr() {
                Ok(addr) => format!("{}://{}", scheme, addr),
                Err(_) => format!("{}://<unknown>", scheme),
            },
            #[cfg(unix)]
            BoundListener::Unix(listener) => match listener
                .local_addr()
                .ok()
                .and_then(|addr| addr.as_pathname().map(|path| path.display().to_string()))
            {
                Some(path) => format!("unix:{}", path),
                None => "unix:<unnamed>".to_string(),
            },
        }
    }

    pub fn local_port(&self) -> Option<u16> {
        match self {
            BoundListener::Tcp(listener) => listener.local_addr().ok().map(|addr| addr.port()),
            #[cfg(unix)]
            BoundListener::Unix(_) => None,
        }
    }
}

/// Failure to start listening, classified by what the operator can do about it.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("{bind} requires elevated privileges")]
    PermissionDenied {
        bind: String,
        #[source]
        source: io::Error,
    },

    #[error("{bind} is already in use")]
    AddrInUse {
        bind: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to listen on {bind}: {source}")]
    Other {
        bind: String,
        #[source]
        source: io::Error,
    },
}

impl ListenError {
    pub fn classify(bind: impl Into<String>, source: io::Error) -> Self {
        let bind = bind.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => ListenError::PermissionDenied { bind, source },
            io::ErrorKind::AddrInUse => ListenError::AddrInUse { bind, source },
            _ => ListenError::Other { bind, source },
        }
    }

    /// Process exit status for errors that end the process cleanly.
    ///
    /// `None` means the error is unclassified and should propagate as a fault.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ListenError::PermissionDenied { .. } | ListenError::AddrInUse { .. } => Some(1),
            ListenError::Other { .. } => None,
        }
    }
}

/// Binds the configured port or pipe.
///
/// # Errors
/// Bind failures come back as a [`ListenError`] whose message names the
/// target, e.g. `Port 3000 is already in use`.
pub async fn bind(server_config: &ServerConfig) -> Result<BoundListener, ListenError> {
    let bind = server_config.target.to_string();

    match &server_config.target {
        ListenTarget::Port(port) => TcpListener::bind((server_config.host.as_str(), *port))
            .await
            .map(BoundListener::Tcp)
            .map_err(|e| ListenError::classify(bind, e)),
        #[cfg(unix)]
        ListenTarget::Pipe(path) => tokio::net::UnixListener::bind(path)
            .map(BoundListener::Unix)
            .map_err(|e| ListenError::classify(bind, e)),
        #[cfg(not(unix))]
        ListenTarget::Pipe(_) => Err(ListenError::classify(
            bind,
            io::Error::new(io::ErrorKind::Unsupported, "pipes are only supported on unix"),
        )),
    }
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(router: Router, listener: BoundListener, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let result = match listener {
        BoundListener::Tcp(listener) => {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
        }
        #[cfg(unix)]
        BoundListener::Unix(listener) => {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
        }
    };

    result.inspect_err(|e| {
        tracing::error!("Server encountered an error: {:?}", e);
    })
}

/// Wraps application routes with request tracing and a JSON 404 fallback.
///
/// # Example
/// ```ignore
/// let api_routes = Router::new()
///     .route("/notes", get(list_notes))
///     .with_state(state);
///
/// let router = create_router(api_routes);
/// ```
pub fn create_router(apis: Router) -> Router {
    Router::new()
        .nest("/api", apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Production server with coordinated shutdown and cleanup.
///
/// Serves until `coordinator` signals shutdown, then runs `cleanup` (closing
/// database connections and the like) bounded by `shutdown_timeout`.
///
/// # Example
/// ```ignore
/// let listener = bind(&config.server).await?;
///
/// create_production_app(
///     router,
///     listener,
///     coordinator.clone(),
///     Duration::from_secs(30),
///     async move { db.close().await },
/// ).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    listener: BoundListener,
    coordinator: ShutdownCoordinator,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("server running on {}", listener.url("http"));

    let shutdown = coordinator.wait_for_shutdown();
    let cleanup_handle = tokio::spawn({
        let signalled = coordinator.wait_for_shutdown();
        async move {
            signalled.await;

            info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
            match tokio::time::timeout(shutdown_timeout, cleanup).await {
                Ok(_) => info!("Cleanup completed successfully"),
                Err(_) => tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                ),
            }
        }
    });

    let serve_result = serve(router, listener, shutdown).await;

    // A failed server never signals shutdown on its own
    if serve_result.is_err() {
        coordinator.shutdown();
    }
    cleanup_handle.await.ok();

    serve_result
}
