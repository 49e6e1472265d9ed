//! Minimal protocol wire types.
//!
//! Only the shapes the authentication core needs cross this boundary: the
//! ACK/NACK acknowledgement envelope, the transaction context used for key
//! lookup, the registry lookup/subscribe documents and the onboarding
//! callback payloads. Business payload schemas are deliberately absent;
//! authentication operates on raw bytes plus this minimal context.

use serde::{Deserialize, Serialize};

/// Acknowledgement sent back to a peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageAck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAck {
    pub ack: Ack,
}

/// Status is `ACK` when the request was accepted, `NACK` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AckResponse {
    pub fn ack() -> Self {
        Self {
            message: Some(MessageAck {
                ack: Ack {
                    status: "ACK".to_string(),
                },
            }),
            error: None,
        }
    }

    pub fn nack(error_type: &str, code: u32) -> Self {
        Self {
            message: Some(MessageAck {
                ack: Ack {
                    status: "NACK".to_string(),
                },
            }),
            error: Some(ProtocolError {
                kind: error_type.to_string(),
                code: Some(code.to_string()),
            }),
        }
    }
}

/// The slice of a request's `context` block that key resolution needs.
///
/// Everything else in the business payload is opaque to this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Outer envelope used to pull the context out of an arbitrary request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub context: TransactionContext,
}

/// Registry `/lookup` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    pub subscriber_id: String,
    #[serde(rename = "ukId")]
    pub unique_key_id: String,
}

/// One record of a registry `/lookup` response. An empty response array means
/// the key is unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber_id: Option<String>,
    pub signing_public_key: String,
}

/// Registry `/subscribe` request used for key rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub context: SubscribeContext,
    pub message: SubscribeMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeContext {
    pub operation: Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub ops_no: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeMessage {
    pub request_id: String,
    pub timestamp: String,
    pub entity: Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub subscriber_id: String,
    pub key_pair: RegistryKeyPair,
}

/// Public key material submitted to the registry, base64-encoded, with an
/// ISO-8601 validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryKeyPair {
    pub signing_public_key: String,
    pub encryption_public_key: String,
    pub valid_from: String,
    pub valid_until: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    #[serde(default)]
    pub message: Option<MessageAck>,
    #[serde(default)]
    pub error: Option<ProtocolError>,
}

/// Onboarding callback request sent by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnSubscribeRequest {
    #[serde(default)]
    pub subscriber_id: Option<String>,
    pub challenge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnSubscribeResponse {
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nack_serialization() {
        let response = AckResponse::nack("CONTEXT-ERROR", 30016);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"message":{"ack":{"status":"NACK"}},"error":{"type":"CONTEXT-ERROR","code":"30016"}}"#
        );
    }

    #[test]
    fn test_ack_omits_error() {
        let json = serde_json::to_string(&AckResponse::ack()).unwrap();
        assert_eq!(json, r#"{"message":{"ack":{"status":"ACK"}}}"#);
    }

    #[test]
    fn test_envelope_extracts_context_only() {
        let body = r#"{"context":{"domain":"nic2004:60212","country":"IND","city":"Kochi","action":"search"},"message":{"intent":{}}}"#;
        let envelope: RequestEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.context.domain.as_deref(), Some("nic2004:60212"));
        assert_eq!(envelope.context.city.as_deref(), Some("Kochi"));
    }

    #[test]
    fn test_envelope_tolerates_missing_context() {
        let envelope: RequestEnvelope = serde_json::from_str(r#"{"message":{}}"#).unwrap();
        assert_eq!(envelope.context, TransactionContext::default());
    }

    #[test]
    fn test_lookup_request_wire_field_names() {
        let request = LookupRequest {
            subscriber_id: "example-bap.com".to_string(),
            unique_key_id: "bap1234".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""ukId":"bap1234""#));
    }
}
