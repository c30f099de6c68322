//! Server startup

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use polyrisk_core::DomainConfig;
use polyrisk_runtime::{
    BackendConnector, BiomedSummaryService, HttpHealthProbe, ProviderRegistry, RunController,
    RuntimeConfig,
};

use crate::config::ServerConfig;
use crate::handlers::{biomed_router, pipeline_router, AppState, BiomedState};

/// Domain from the configured file, or the built-in panel.
pub fn load_domain(config: &ServerConfig) -> anyhow::Result<DomainConfig> {
    match &config.domain_file {
        Some(path) => {
            let domain = DomainConfig::from_file(path)?;
            info!(domain = %domain.name, path = %path.display(), "Loaded domain");
            Ok(domain)
        }
        None => Ok(DomainConfig::cardiometabolic()),
    }
}

/// Build the session and controller. Probes the backend once.
pub async fn build_controller(
    server: &ServerConfig,
    runtime: RuntimeConfig,
    offline: bool,
) -> anyhow::Result<RunController> {
    let controller = RunController::builder()
        .config(runtime)
        .domain(load_domain(server)?)
        .offline(offline)
        .build()
        .await;
    Ok(controller)
}

/// Serve `POST /run` and `GET /health` until the process stops.
pub async fn serve_pipeline(server: ServerConfig, runtime: RuntimeConfig) -> anyhow::Result<()> {
    server.validate().map_err(anyhow::Error::msg)?;
    let addr = server.socket_addr().map_err(anyhow::Error::msg)?;

    let controller = build_controller(&server, runtime, false).await?;
    info!(strategy = %controller.session().strategy(), "Session ready");

    let app = pipeline_router().with_state(AppState::new(controller));
    listen(addr, app).await
}

/// Serve `POST /summarize` until the process stops.
pub async fn serve_biomed(server: ServerConfig, runtime: RuntimeConfig) -> anyhow::Result<()> {
    server.validate().map_err(anyhow::Error::msg)?;
    let addr = server.biomed_socket_addr().map_err(anyhow::Error::msg)?;

    let probe = HttpHealthProbe::new(
        runtime.backend.health_endpoint(),
        runtime.backend.probe_timeout,
    );
    let connector = BackendConnector::new(
        Arc::new(ProviderRegistry::with_defaults()),
        &runtime.backend,
    );
    let service = BiomedSummaryService::connect(&probe, &connector, runtime.biomed).await;

    let app = biomed_router().with_state(BiomedState::new(service));
    listen(addr, app).await
}

async fn listen(addr: SocketAddr, app: axum::Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
