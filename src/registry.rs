//! Registry collaborator.
//!
//! The registry is the network's trust anchor: it resolves which public
//! signing key a subscriber is currently using and accepts key-rotation
//! submissions. Authentication consumes it through the [`Registry`] trait so
//! that the middleware can be exercised without a live registry.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::StatusCode;

use crate::error::{AuthError, Result};
use crate::model::{
    Entity, LookupEntry, LookupRequest, Operation, RegistryKeyPair, SubscribeContext,
    SubscribeMessage, SubscribeRequest, SubscribeResponse, TransactionContext,
};

/// Registry subscribe operation number for participant key rotation.
const OPS_NO_KEY_ROTATION: u32 = 6;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[async_trait]
pub trait Registry: Send + Sync {
    /// Resolves the current Ed25519 public signing key for a subscriber/key-id
    /// pair. An empty registry response is a `KeyNotFound` error.
    async fn public_signing_key(
        &self,
        subscriber_id: &str,
        unique_key_id: &str,
        context: &TransactionContext,
    ) -> Result<Vec<u8>>;

    /// Submits freshly rotated public keys with a validity window of
    /// `[now, now + rotation_period)`.
    async fn rotate_keys(
        &self,
        encryption_public_key_b64: &str,
        signing_public_key_b64: &str,
        request_id: &str,
        subscriber_id: &str,
        rotation_period: chrono::Duration,
    ) -> Result<()>;
}

/// HTTP client for the network registry.
pub struct RegistryClient {
    client: reqwest::Client,
    lookup_url: String,
    subscribe_url: String,
    environment: String,
}

impl RegistryClient {
    /// Creates a client rooted at `registry_url`. The timeout bounds every
    /// lookup so a hung registry stalls only the requests in flight.
    pub fn new(registry_url: &str, environment: &str, timeout: Duration) -> Result<Self> {
        let base = registry_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(AuthError::Config("registry URL is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            lookup_url: format!("{base}/lookup"),
            subscribe_url: format!("{base}/subscribe"),
            environment: environment.to_string(),
        })
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn public_signing_key(
        &self,
        subscriber_id: &str,
        unique_key_id: &str,
        _context: &TransactionContext,
    ) -> Result<Vec<u8>> {
        let request = LookupRequest {
            subscriber_id: subscriber_id.to_string(),
            unique_key_id: unique_key_id.to_string(),
        };

        let mut request_json = serde_json::to_string(&request)?;
        // The staging registry uses a different field name for the key id.
        if self.environment == "staging" {
            request_json = request_json.replacen("\"ukId\"", "\"unique_key_id\"", 1);
        }

        let response = self
            .client
            .post(&self.lookup_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request_json)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "registry lookup returned an error status");
            return Err(AuthError::Registry(format!(
                "lookup failed with status {status}"
            )));
        }

        let entries: Vec<LookupEntry> = response.json().await?;
        let Some(entry) = entries.first() else {
            return Err(AuthError::KeyNotFound {
                subscriber_id: subscriber_id.to_string(),
                unique_key_id: unique_key_id.to_string(),
            });
        };

        Ok(BASE64.decode(&entry.signing_public_key)?)
    }

    async fn rotate_keys(
        &self,
        encryption_public_key_b64: &str,
        signing_public_key_b64: &str,
        request_id: &str,
        subscriber_id: &str,
        rotation_period: chrono::Duration,
    ) -> Result<()> {
        let now = Utc::now();
        let valid_until = now + rotation_period;

        let request = SubscribeRequest {
            context: SubscribeContext {
                operation: Operation {
                    ops_no: OPS_NO_KEY_ROTATION,
                },
            },
            message: SubscribeMessage {
                request_id: request_id.to_string(),
                timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
                entity: Entity {
                    subscriber_id: subscriber_id.to_string(),
                    key_pair: RegistryKeyPair {
                        signing_public_key: signing_public_key_b64.to_string(),
                        encryption_public_key: encryption_public_key_b64.to_string(),
                        valid_from: now.format(TIMESTAMP_FORMAT).to_string(),
                        valid_until: valid_until.format(TIMESTAMP_FORMAT).to_string(),
                    },
                },
            },
        };

        let response = self
            .client
            .post(&self.subscribe_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: SubscribeResponse = response.json().await?;
        let acked = body
            .message
            .as_ref()
            .map(|m| m.ack.status == "ACK")
            .unwrap_or(false);

        if status != StatusCode::OK || !acked {
            return Err(AuthError::Registry(format!(
                "key rotation rejected: status={status}, error={:?}",
                body.error
            )));
        }
        Ok(())
    }
}
