//! End-to-end authentication flow over a real axum router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::Router;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use ondc_auth::model::TransactionContext;
use ondc_auth::signing::create_auth_signature;
use ondc_auth::{
    authenticate, AuthError, Authenticator, FixedClock, Registry, Result, Role, SigningKeyset,
};

const EXAMPLE_PRIVATE_KEY_B64: &str =
    "lP3sHA+9gileOkXYJXh4Jg8tK0gEEMbf9yCPnFpbldhrAY+NErqL9WD+Vav7TE5tyVXGXBle9ONZi2W7o144eQ==";
const EXAMPLE_PUBLIC_KEY_B64: &str = "awGPjRK6i/Vg/lWr+0xObclVxlwZXvTjWYtlu6NeOHk=";
const PAYLOAD: &[u8] =
    br#"{"context":{"domain":"nic2004:60212","country":"IND","city":"Kochi"},"message":{}}"#;
const CREATED: i64 = 1641287875;
const EXPIRED: i64 = 1641291475;
const IN_WINDOW: i64 = 1641290475;

struct MockRegistry {
    key: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl MockRegistry {
    fn with_example_key() -> Self {
        Self {
            key: Some(BASE64.decode(EXAMPLE_PUBLIC_KEY_B64).unwrap()),
            calls: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn public_signing_key(
        &self,
        subscriber_id: &str,
        unique_key_id: &str,
        _context: &TransactionContext,
    ) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.key.clone().ok_or_else(|| AuthError::KeyNotFound {
            subscriber_id: subscriber_id.to_string(),
            unique_key_id: unique_key_id.to_string(),
        })
    }

    async fn rotate_keys(
        &self,
        _encryption_public_key_b64: &str,
        _signing_public_key_b64: &str,
        _request_id: &str,
        _subscriber_id: &str,
        _rotation_period: chrono::Duration,
    ) -> Result<()> {
        unimplemented!("not used by authentication tests")
    }
}

fn example_keyset() -> SigningKeyset {
    let private = BASE64.decode(EXAMPLE_PRIVATE_KEY_B64).unwrap();
    SigningKeyset::from_seed(private[..32].try_into().unwrap())
}

fn signed_header() -> String {
    create_auth_signature(
        PAYLOAD,
        &example_keyset(),
        CREATED,
        EXPIRED,
        "example-bap.com",
        "bap1234",
    )
    .unwrap()
}

/// Handler that echoes the request body, so the tests can observe that the
/// middleware hands the buffered body on intact.
async fn echo(body: axum::body::Bytes) -> axum::body::Bytes {
    body
}

fn app(authenticator: Authenticator) -> Router {
    Router::new()
        .route("/search", post(echo))
        .layer(from_fn_with_state(authenticator, authenticate))
}

fn participant_app(registry: Arc<MockRegistry>, now: i64) -> Router {
    app(Authenticator::network_participant(
        registry,
        Arc::new(FixedClock(now)),
        Role::SellerApp,
        "seller.example.com",
    ))
}

#[tokio::test]
async fn test_signed_request_passes_and_body_survives() {
    let registry = Arc::new(MockRegistry::with_example_key());
    let app = participant_app(registry.clone(), IN_WINDOW);

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("authorization", signed_header())
        .body(Body::from(PAYLOAD))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], PAYLOAD);
    assert_eq!(registry.lookups(), 1);
}

#[tokio::test]
async fn test_expired_signature_yields_nack_without_lookup() {
    let registry = Arc::new(MockRegistry::with_example_key());
    // A full hour past the window's end.
    let app = participant_app(registry.clone(), EXPIRED + 3600);

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("authorization", signed_header())
        .body(Body::from(PAYLOAD))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()["www-authenticate"],
        "Signature realm=\"seller.example.com\",headers=\"(created) (expires) digest\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let nack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(nack["message"]["ack"]["status"], "NACK");
    assert_eq!(nack["error"]["type"], "CONTEXT-ERROR");
    assert_eq!(nack["error"]["code"], "30016");

    // The window gate fires before the registry is ever consulted.
    assert_eq!(registry.lookups(), 0);
}

#[tokio::test]
async fn test_missing_header_is_rejected() {
    let app = participant_app(Arc::new(MockRegistry::with_example_key()), IN_WINDOW);

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .body(Body::from(PAYLOAD))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
}

#[tokio::test]
async fn test_algorithm_substitution_is_rejected_before_lookup() {
    let registry = Arc::new(MockRegistry::with_example_key());
    let app = participant_app(registry.clone(), IN_WINDOW);

    let header = signed_header().replace("algorithm=\"ed25519\"", "algorithm=\"rsa\"");
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("authorization", header)
        .body(Body::from(PAYLOAD))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(registry.lookups(), 0);
}

#[tokio::test]
async fn test_gateway_parameterization_uses_its_own_headers() {
    let registry = Arc::new(MockRegistry::with_example_key());
    let app = app(Authenticator::gateway(
        registry.clone(),
        Arc::new(FixedClock(IN_WINDOW)),
        Role::Gateway,
        "gateway.example.com",
    ));

    // The gateway's signature travels in its own header; a value in
    // `Authorization` alone must not satisfy the gateway authenticator.
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("x-gateway-authorization", signed_header())
        .body(Body::from(PAYLOAD))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("authorization", signed_header())
        .body(Body::from(PAYLOAD))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()["proxy-authenticate"],
        "Signature realm=\"gateway.example.com\",headers=\"(created) (expires) digest\""
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let nack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(nack["error"]["code"], "10001");
}

#[tokio::test]
async fn test_tampered_body_is_rejected_after_lookup() {
    let registry = Arc::new(MockRegistry::with_example_key());
    let app = participant_app(registry.clone(), IN_WINDOW);

    let tampered =
        br#"{"context":{"domain":"nic2004:60212","country":"IND","city":"Delhi"},"message":{}}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("authorization", signed_header())
        .body(Body::from(&tampered[..]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(registry.lookups(), 1);
}
