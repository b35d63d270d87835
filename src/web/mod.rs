//! Web layer module
//!
//! HTTP interface of the catalog: the REST endpoints under `/entries`, the
//! WebSocket push channel at `/ws` and a health probe. Handlers are thin and
//! delegate to [`CatalogService`].

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{config::Config, services::CatalogService};

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;

pub use extractors::PaginationParams;
pub use responses::{handle_error, ApiResponse};

/// Largest accepted request body, sized for import uploads
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogService,
}

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ws", get(handlers::notifications::notifications_socket))
        .nest("/entries", entry_routes())
        // Middleware (applied in reverse order)
        .layer(axum::middleware::from_fn(
            middleware::request_logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn entry_routes() -> Router<AppState> {
    use handlers::entries;

    Router::new()
        .route("/", get(entries::list_entries).post(entries::create_entry))
        .route("/import", post(entries::import_entries))
        .route("/recommendations/:genre", get(entries::recommendations))
        .route(
            "/:id",
            get(entries::get_entry)
                .put(entries::update_entry)
                .delete(entries::delete_entry),
        )
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, catalog: CatalogService) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = create_router(AppState { config, catalog });
        Ok(Self { app, addr })
    }

    /// Serve until Ctrl-C is received
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping web server");
}
