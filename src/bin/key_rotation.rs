use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use clap::Parser;
use ondc_auth::rotation::RotationEvent;
use ondc_auth::{config::ServiceConfig, FileSecretStore, KeyRotationFlow, RegistryClient};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Parser)]
#[command(name = "key-rotation")]
#[command(about = "Key rotation service: rotates signing and encryption keys on trigger events")]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Clone)]
struct AppState {
    flow: Arc<KeyRotationFlow>,
    default_secret_id: String,
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

    let registry = Arc::new(RegistryClient::new(
        &config.registry.url,
        &config.registry.environment,
        config.registry_timeout(),
    )?);
    let secret_store = Arc::new(FileSecretStore::new(
        &config.secrets.dir,
        &config.secrets.secret_id,
    ));
    let flow = Arc::new(KeyRotationFlow::new(
        secret_store,
        registry,
        config.subscriber.request_id.clone(),
        config.subscriber.subscriber_id.clone(),
        config.rotation_period(),
    ));

    let state = AppState {
        flow,
        default_secret_id: config.secrets.secret_id.clone(),
    };
    let app = Router::new()
        .route("/", post(rotation_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(config.server_address()).await?;
    tracing::info!(address = %config.server_address(), "key rotation service listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn rotation_handler(
    State(state): State<AppState>,
    Json(event): Json<RotationEvent>,
) -> (StatusCode, Json<serde_json::Value>) {
    // The secret manager publishes many event types; only rotation triggers
    // are acted on, everything else is acknowledged and ignored.
    if !event.is_rotation() {
        let event_type = &event.message.attributes.event_type;
        tracing::info!(%event_type, "ignoring non-rotation event");
        return (
            StatusCode::OK,
            Json(serde_json::json!({ "message": format!("Ignore event type: {event_type:?}") })),
        );
    }

    let secret_id = if event.message.attributes.secret_id.is_empty() {
        state.default_secret_id.clone()
    } else {
        event.message.attributes.secret_id.clone()
    };

    match state.flow.rotate(&secret_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Key rotation is completed" })),
        ),
        Err(err) => {
            tracing::error!(%err, "key rotation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "message": err.to_string() })),
            )
        }
    }
}
