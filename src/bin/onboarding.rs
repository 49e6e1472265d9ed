use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ondc_auth::{config::ServiceConfig, onboarding, FileSecretStore, OnboardingService};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Parser)]
#[command(name = "onboarding")]
#[command(about = "Subscription onboarding service: challenge callback and site verification")]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ServiceConfig::load_with_env_overrides(&args.config)?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    let registry_key = config
        .registry
        .encryption_public_key
        .as_deref()
        .context("registry.encryption_public_key is not configured")?;

    let secret_store = Arc::new(FileSecretStore::new(
        &config.secrets.dir,
        &config.secrets.secret_id,
    ));
    let service = Arc::new(OnboardingService::new(
        secret_store,
        registry_key,
        config.subscriber.request_id.clone(),
    )?);

    let app = onboarding::router(service).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.server_address()).await?;
    tracing::info!(address = %config.server_address(), "onboarding service listening");

    axum::serve(listener, app).await?;
    Ok(())
}
