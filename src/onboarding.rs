//! Subscription onboarding endpoints.
//!
//! During onboarding the registry calls back with an encrypted challenge; the
//! participant proves possession of its encryption private key by returning
//! the decrypted value. The registry separately fetches a site-verification
//! page carrying the Ed25519 signature of the onboarding request id.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::challenge::decrypt_challenge;
use crate::error::Result;
use crate::keys::{extract_raw_public_key_from_der, SigningKeyset};
use crate::model::{OnSubscribeRequest, OnSubscribeResponse};
use crate::secrets::SecretStore;
use crate::signing;

/// Challenge-response and site-verification service for one participant.
pub struct OnboardingService {
    secret_store: Arc<dyn SecretStore>,
    registry_encryption_public_key: [u8; 32],
    request_id: String,
}

impl OnboardingService {
    /// `registry_encryption_public_key_der_b64` is the registry's X25519
    /// public key as published: base64 over its DER form.
    pub fn new(
        secret_store: Arc<dyn SecretStore>,
        registry_encryption_public_key_der_b64: &str,
        request_id: impl Into<String>,
    ) -> Result<Self> {
        let registry_encryption_public_key =
            extract_raw_public_key_from_der(registry_encryption_public_key_der_b64)?;
        Ok(Self {
            secret_store,
            registry_encryption_public_key,
            request_id: request_id.into(),
        })
    }

    /// Decrypts the registry's challenge with the recomputed shared secret.
    /// The registry compares the answer against the value it encrypted.
    pub async fn answer_challenge(&self, challenge: &str) -> Result<String> {
        let private_key = self.secret_store.encryption_private_key().await?;
        decrypt_challenge(challenge, &private_key, &self.registry_encryption_public_key)
    }

    /// Base64 Ed25519 signature over the onboarding request id, served on the
    /// site-verification page.
    pub async fn signed_request_id(&self) -> Result<String> {
        let keyset_json = self.secret_store.signing_private_keyset().await?;
        let keyset = SigningKeyset::from_json(&keyset_json)?;
        let signature = signing::sign(self.request_id.as_bytes(), &keyset)?;
        Ok(BASE64.encode(signature))
    }
}

/// Routes for the onboarding service.
pub fn router(service: Arc<OnboardingService>) -> Router {
    Router::new()
        .route("/on_subscribe", post(on_subscribe))
        .route("/ondc-site-verification.html", get(site_verification))
        .with_state(service)
}

async fn on_subscribe(
    State(service): State<Arc<OnboardingService>>,
    Json(request): Json<OnSubscribeRequest>,
) -> Response {
    match service.answer_challenge(&request.challenge).await {
        Ok(answer) => Json(OnSubscribeResponse { answer }).into_response(),
        Err(err) => {
            tracing::error!(%err, "failed to decrypt onboarding challenge");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn site_verification(State(service): State<Arc<OnboardingService>>) -> Response {
    match service.signed_request_id().await {
        Ok(signature) => Html(render_site_verification(&signature)).into_response(),
        Err(err) => {
            tracing::error!(%err, "failed to sign onboarding request id");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render_site_verification(signed_request_id: &str) -> String {
    format!(
        "<html>\n    <head>\n        <meta name='ondc-site-verification' content='{signed_request_id}' />\n    </head>\n    <body>\n        ONDC Site Verification Page\n    </body>\n</html>\n"
    )
}
