//! Key rotation flow.
//!
//! A rotation trigger produces a fresh Ed25519 signing keyset and X25519
//! encryption pair, persists the private forms, then submits the public forms
//! to the registry with a `[now, now + rotation_period)` validity window.
//! There is no rollback: if the registry call fails after the private
//! material was stored, the flow reports the split state as
//! `RotationIncomplete` instead of pretending nothing happened.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AuthError, Result};
use crate::keys::{EncryptionKeyPair, SigningKeyset};
use crate::registry::Registry;
use crate::secrets::{KeyMaterial, SecretStore};

/// Trigger event type a rotation service acts on; other event types from the
/// secret manager are acknowledged and ignored.
pub const EVENT_SECRET_ROTATE: &str = "SECRET_ROTATE";

/// Secret-manager event delivered to the rotation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RotationEvent {
    #[serde(default)]
    pub message: RotationEventMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RotationEventMessage {
    #[serde(default)]
    pub attributes: RotationEventAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RotationEventAttributes {
    #[serde(default, rename = "eventType")]
    pub event_type: String,
    #[serde(default, rename = "secretId")]
    pub secret_id: String,
}

impl RotationEvent {
    pub fn is_rotation(&self) -> bool {
        self.message.attributes.event_type == EVENT_SECRET_ROTATE
    }
}

/// Orchestrates one key rotation: generate, persist, register.
pub struct KeyRotationFlow {
    secret_store: Arc<dyn SecretStore>,
    registry: Arc<dyn Registry>,
    request_id: String,
    subscriber_id: String,
    rotation_period: chrono::Duration,
    // A second trigger arriving mid-rotation waits instead of interleaving.
    in_flight: Mutex<()>,
}

impl KeyRotationFlow {
    pub fn new(
        secret_store: Arc<dyn SecretStore>,
        registry: Arc<dyn Registry>,
        request_id: impl Into<String>,
        subscriber_id: impl Into<String>,
        rotation_period: chrono::Duration,
    ) -> Self {
        Self {
            secret_store,
            registry,
            request_id: request_id.into(),
            subscriber_id: subscriber_id.into(),
            rotation_period,
            in_flight: Mutex::new(()),
        }
    }

    /// Runs the full rotation for the given secret id. Any failing step
    /// aborts the flow.
    pub async fn rotate(&self, secret_id: &str) -> Result<()> {
        let _guard = self.in_flight.lock().await;

        let encryption = EncryptionKeyPair::generate();
        let signing = SigningKeyset::generate();
        let signing_public_key = signing.public_key()?;

        let material = KeyMaterial::from_generated(&encryption, &signing)?;
        let payload = serde_json::to_vec(&material)?;
        self.secret_store.add_key(secret_id, &payload).await?;

        let encryption_public_b64 = BASE64.encode(&encryption.public_key_der);
        let signing_public_b64 = BASE64.encode(&signing_public_key);
        if let Err(err) = self
            .registry
            .rotate_keys(
                &encryption_public_b64,
                &signing_public_b64,
                &self.request_id,
                &self.subscriber_id,
                self.rotation_period,
            )
            .await
        {
            // Private material is already persisted; surface the split state.
            tracing::error!(
                %err,
                subscriber_id = %self.subscriber_id,
                "registry rotation failed after new private keys were stored"
            );
            return Err(AuthError::RotationIncomplete(err.to_string()));
        }

        tracing::info!(subscriber_id = %self.subscriber_id, "key rotation completed");
        Ok(())
    }
}
