//! Request authentication middleware.
//!
//! One generic authenticator covers both inbound paths: peer-to-peer calls
//! carry their signature in `Authorization` and are challenged via
//! `WWW-Authenticate`; gateway-relayed calls use `X-Gateway-Authorization`
//! and `Proxy-Authenticate`. The checks run as ordered hard gates and the
//! first failure rejects the request with HTTP 401, a NACK body and the
//! role-specific protocol error code.
//!
//! The scheme bounds replay only by the signature's validity window: a
//! signature replayed inside its window verifies again. Peers rely on this
//! wire contract, so no nonce tracking is layered on top here.
//!
//! ```ignore
//! let authenticator = Authenticator::network_participant(registry, clock, role, subscriber_id);
//! let app = Router::new()
//!     .route("/search", post(handler))
//!     .layer(axum::middleware::from_fn_with_state(
//!         authenticator,
//!         ondc_auth::middleware::authenticate,
//!     ));
//! ```

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};

use crate::error::AuthError;
use crate::errorcode::{self, ProtocolErrorType, Role};
use crate::header::parse_header;
use crate::model::{AckResponse, RequestEnvelope};
use crate::registry::Registry;
use crate::signing::verify_signature;

/// Request bodies larger than this are rejected outright.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Injected time source, so window checks are testable and tolerance policies
/// stay out of the verification path.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock used by real deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock frozen at a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// Decision produced for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    Authenticated { subscriber_id: String },
    Rejected(RejectReason),
}

/// Closed set of rejection reasons, one per gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MalformedHeader,
    AlgorithmMismatch,
    OutsideValidityWindow,
    MalformedContext,
    UnknownKey,
    SignatureMismatch,
    RegistryUnavailable,
}

/// Per-service authenticator. Construct once at startup and share; all state
/// is read-only configuration plus the injected clock and registry.
#[derive(Clone)]
pub struct Authenticator {
    registry: Arc<dyn Registry>,
    clock: Arc<dyn Clock>,
    role: Role,
    subscriber_id: String,
    verifying_header: HeaderName,
    nack_header: HeaderName,
}

impl Authenticator {
    /// Authenticator for calls signed by network participants.
    pub fn network_participant(
        registry: Arc<dyn Registry>,
        clock: Arc<dyn Clock>,
        role: Role,
        subscriber_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            clock,
            role,
            subscriber_id: subscriber_id.into(),
            verifying_header: HeaderName::from_static("authorization"),
            nack_header: HeaderName::from_static("www-authenticate"),
        }
    }

    /// Authenticator for calls relayed and re-signed by the gateway.
    pub fn gateway(
        registry: Arc<dyn Registry>,
        clock: Arc<dyn Clock>,
        role: Role,
        subscriber_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            clock,
            role,
            subscriber_id: subscriber_id.into(),
            verifying_header: HeaderName::from_static("x-gateway-authorization"),
            nack_header: HeaderName::from_static("proxy-authenticate"),
        }
    }

    /// Runs the gate sequence against one request.
    ///
    /// Gates, in order: header parse, algorithm binding, validity window,
    /// context extraction, key resolution, signature verification. The first
    /// failure short-circuits; no gate is retried.
    pub async fn check(&self, header_value: Option<&str>, body: &[u8]) -> AuthenticationOutcome {
        let Some(header_value) = header_value else {
            tracing::warn!(header = %self.verifying_header, "authentication header is missing");
            return AuthenticationOutcome::Rejected(RejectReason::MalformedHeader);
        };

        let info = match parse_header(header_value) {
            Ok(info) => info,
            Err(err) => {
                tracing::warn!(header = %self.verifying_header, %err, "invalid header format");
                return AuthenticationOutcome::Rejected(RejectReason::MalformedHeader);
            }
        };

        if info.algorithm != info.key_id_algorithm {
            let err = AuthError::AlgorithmMismatch {
                algorithm: info.algorithm,
                key_id_algorithm: info.key_id_algorithm,
            };
            tracing::warn!(%err, "header algorithms do not match");
            return AuthenticationOutcome::Rejected(RejectReason::AlgorithmMismatch);
        }

        // Boundary-inclusive on both ends.
        let now = self.clock.now_unix();
        if info.created > now || info.expired < now {
            let err = AuthError::OutsideValidityWindow {
                created: info.created,
                expired: info.expired,
                now,
            };
            tracing::warn!(%err, "signature outside its validity window");
            return AuthenticationOutcome::Rejected(RejectReason::OutsideValidityWindow);
        }

        let envelope: RequestEnvelope = match serde_json::from_slice(body) {
            Ok(envelope) => envelope,
            Err(err) => {
                let err = AuthError::MalformedContext(err.to_string());
                tracing::warn!(%err, "failed to extract transaction context");
                return AuthenticationOutcome::Rejected(RejectReason::MalformedContext);
            }
        };

        let public_key = match self
            .registry
            .public_signing_key(&info.subscriber_id, &info.unique_key_id, &envelope.context)
            .await
        {
            Ok(key) => key,
            Err(err @ AuthError::KeyNotFound { .. }) => {
                tracing::warn!(%err, "registry has no key for this caller");
                return AuthenticationOutcome::Rejected(RejectReason::UnknownKey);
            }
            Err(err) => {
                // Infrastructure fault, not a forged-request signal; still
                // fail closed.
                tracing::error!(%err, infrastructure = err.is_infrastructure(), "registry lookup failed");
                return AuthenticationOutcome::Rejected(RejectReason::RegistryUnavailable);
            }
        };

        if let Err(err) =
            verify_signature(&info.signature, body, &public_key, info.created, info.expired)
        {
            tracing::warn!(%err, subscriber_id = %info.subscriber_id, "signature verification failed");
            return AuthenticationOutcome::Rejected(RejectReason::SignatureMismatch);
        }

        AuthenticationOutcome::Authenticated {
            subscriber_id: info.subscriber_id,
        }
    }

    /// 401 response with the NACK body and role-specific protocol code.
    fn unauthenticated(&self) -> Response {
        let Some(code) = errorcode::lookup(self.role, ProtocolErrorType::InvalidSignature) else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };

        let challenge = format!(
            "Signature realm=\"{}\",headers=\"(created) (expires) digest\"",
            self.subscriber_id
        );
        let mut response =
            (StatusCode::UNAUTHORIZED, Json(AckResponse::nack("CONTEXT-ERROR", code)))
                .into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(self.nack_header.clone(), value);
        }
        response
    }
}

/// Axum middleware entry point; install with
/// `axum::middleware::from_fn_with_state(authenticator, authenticate)`.
///
/// The body is buffered for context extraction and verification, then handed
/// to the downstream handler intact.
pub async fn authenticate(
    State(authenticator): State<Authenticator>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "failed to buffer request body");
            return authenticator.unauthenticated();
        }
    };

    let header_value = parts
        .headers
        .get(&authenticator.verifying_header)
        .and_then(|value| value.to_str().ok());

    match authenticator.check(header_value, &bytes).await {
        AuthenticationOutcome::Authenticated { subscriber_id } => {
            tracing::debug!(%subscriber_id, "request authenticated");
            let request = Request::from_parts(parts, Body::from(bytes));
            next.run(request).await
        }
        AuthenticationOutcome::Rejected(reason) => {
            tracing::warn!(?reason, "request rejected");
            authenticator.unauthenticated()
        }
    }
}
