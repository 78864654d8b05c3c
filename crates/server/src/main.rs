use std::sync::Arc;

use anyhow::Context;
use backends::{DockerBackend, ExecutionBackend, FlyBackend};
use db::DBService;
use secrecy::ExposeSecret;
use server::{AppState, app};
use services::{
    config::{BackendConfig, Config},
    github::GithubService,
    runs::{RunService, RunSettings},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let db = DBService::new().await.context("failed to open database")?;

    let backend: Arc<dyn ExecutionBackend> = match &config.backend {
        BackendConfig::Docker { host, tls } => {
            tracing::info!("using docker execution backend at {host}");
            Arc::new(
                DockerBackend::new(host, tls.as_ref())
                    .context("failed to build docker client")?,
            )
        }
        BackendConfig::Fly { app, api_token, region } => {
            tracing::info!("using fly machines execution backend for app {app}");
            Arc::new(FlyBackend::new(app, api_token.expose_secret(), region))
        }
    };

    let finalizer = Arc::new(
        GithubService::new(&config).context("failed to initialize GitHub App credentials")?,
    );

    let runs = Arc::new(RunService::new(
        db,
        backend,
        finalizer,
        RunSettings::from_config(&config),
    ));

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app(AppState::new(runs))).await?;

    Ok(())
}
