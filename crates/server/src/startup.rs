use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use chrono::Local;
use common::{env::ensure_parent_dir, utils::logging::init_logging_from_env};
use configs::AppConfig;
use dotenvy::dotenv;
use service::{
    auth::AuthService,
    bootstrap, default_registry,
    employees::EmployeeRules,
    select_backend_key,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Resolve the backend under `key` and assemble handler state.
pub async fn build_state(cfg: &AppConfig, key: &str) -> Result<ServerState, StartupError> {
    let registry = default_registry()?;
    let facade = bootstrap(&registry, key, cfg).await?;
    let auth = AuthService::from_config(&cfg.auth).await?;
    let rules = EmployeeRules::from_config(&cfg.employees, Local::now().date_naive());
    Ok(ServerState { employees: Arc::new(facade), auth: Arc::new(auth), rules: Arc::new(rules) })
}

/// Application router for the given state.
pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}

/// Public entry: load config, resolve the backend, serve until a shutdown
/// signal, then save the backend.
///
/// `backend_override` (normally the first CLI argument) wins over
/// `EMPLOYEES_IMPL` and `storage.backend`.
pub async fn run(backend_override: Option<String>) -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate()?;
    ensure_parent_dir(&cfg.storage.data_file).await?;

    let key = select_backend_key(backend_override, &cfg);
    let state = build_state(&cfg, &key).await?;
    let employees = Arc::clone(&state.employees);
    let app = build_app(state);

    let addr = bind_addr(&cfg)?;
    info!(%addr, backend = %key, "starting employees server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;

    // 无论服务是否正常退出都要落盘
    if let Err(e) = employees.save().await {
        error!(error = %e, "failed to save employees on shutdown");
    }
    served?;
    info!("server stopped");
    Ok(())
}
