use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use service::{runtime, ResourceRegistry, Storage};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Router plus the storage handle it was built on; close `storage` after
/// the server stops.
pub struct App {
    pub router: Router,
    pub storage: Storage,
}

/// Open storage and build one service per configured resource.
pub async fn build_app(cfg: &AppConfig) -> Result<App, StartupError> {
    runtime::ensure_env(&cfg.storage).await?;

    let names: Vec<String> = cfg.resources.iter().map(|r| r.name.clone()).collect();
    let storage = Storage::open(&cfg.storage, &cfg.database, &names).await?;
    let timeout = Duration::from_millis(cfg.storage.op_timeout_ms);
    let registry = ResourceRegistry::from_configs(&cfg.resources, storage.store(), timeout)?;
    info!(resources = ?registry.names().collect::<Vec<_>>(), timeout_ms = cfg.storage.op_timeout_ms, "resources registered");

    let router = routes::build_router(AppState::new(registry), build_cors());
    Ok(App { router, storage })
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {}:{}: {e}", cfg.server.host, cfg.server.port)))
}

/// Serve `app` on `listener` until `shutdown` resolves, then close storage.
pub async fn serve<F>(app: App, listener: TcpListener, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let App { router, storage } = app;
    let served = axum::serve(listener, router).with_graceful_shutdown(shutdown).await;
    let closed = storage.close().await;
    served.map_err(|e| StartupError::Any(e.into()))?;
    closed?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(service = "server", event = "shutdown_signal", "received Ctrl+C, shutting down");
}

/// Public entry: load config, build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_default()?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, backend = ?app.storage.backend(), "starting server");
    serve(app, listener, shutdown_signal()).await?;
    Ok(())
}
