use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use axum::Router;
use configs::{AppConfig, StorageBackend};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use models::{RackLayout, RackSpec};
use service::storage::{FileVersionedStore, GithubConfig, GithubVersionedStore, MemoryVersionedStore, VersionedFileStore};
use service::RackStore;

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Read `config.toml` (or `CONFIG_PATH`); a missing file means defaults.
pub fn load_config() -> Result<AppConfig, StartupError> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut cfg = if Path::new(&path).exists() {
        configs::load_from_file(&path).map_err(|e| StartupError::InvalidConfig(format!("{path}: {e}")))?
    } else {
        warn!(%path, "config file not found; using defaults");
        AppConfig::with_defaults()
    };
    cfg.normalize_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(cfg)
}

pub fn build_layout(cfg: &AppConfig) -> Result<RackLayout, StartupError> {
    let racks = cfg.racks.iter().map(|r| RackSpec::new(r.name.clone(), r.rows, r.columns)).collect();
    RackLayout::new(racks).map_err(|e| StartupError::InvalidConfig(e.to_string()))
}

async fn build_backend(cfg: &AppConfig) -> Result<Arc<dyn VersionedFileStore>, StartupError> {
    let storage = &cfg.storage;
    let backend: Arc<dyn VersionedFileStore> = match storage.backend {
        StorageBackend::Github => {
            let gh = &storage.github;
            info!(repo = %gh.repo, branch = %gh.branch, path = %storage.path, "using GitHub storage");
            let store = GithubVersionedStore::new(GithubConfig {
                api_url: gh.api_url.clone(),
                repo: gh.repo.clone(),
                branch: gh.branch.clone(),
                token: gh.token.clone(),
                user_agent: gh.user_agent.clone(),
                timeout: Duration::from_secs(gh.timeout_secs),
            })
            .map_err(|e| StartupError::Storage(e.to_string()))?;
            Arc::new(store)
        }
        StorageBackend::File => {
            let dir = &storage.file.data_dir;
            common::env::ensure_data_dir(dir).await?;
            info!(data_dir = %dir, path = %storage.path, "using file storage");
            let store = FileVersionedStore::new(dir.as_str())
                .await
                .map_err(|e| StartupError::Storage(e.to_string()))?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage; edits are lost on restart");
            Arc::new(MemoryVersionedStore::new())
        }
    };
    Ok(backend)
}

/// Wire configuration into the shared application state
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let layout = build_layout(cfg)?;
    let backend = build_backend(cfg).await?;
    let store = RackStore::new(backend, layout, cfg.storage.path.clone());
    Ok(AppState { store: Arc::new(store) })
}

/// Resolves when the process receives Ctrl+C (or SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received; draining in-flight requests");
}

/// Build the app from a validated config and serve until `shutdown` resolves.
/// Requests already accepted, including saves, run to completion.
pub async fn serve<F>(cfg: &AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = build_state(cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, racks = cfg.racks.len(), backend = ?cfg.storage.backend, "rack tracker listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("rack tracker stopped");
    Ok(())
}

/// Public entry: serve until Ctrl+C or SIGTERM
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    serve(&cfg, shutdown_signal()).await
}
