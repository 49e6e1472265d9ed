//! # ondc-auth — participant authentication for a decentralized commerce network
//!
//! Every participant of the network (buyer app, seller app, gateway) must
//! cryptographically prove its identity on every request. This crate is that
//! core: the signature scheme on inbound HTTP calls, the canonical
//! signing-string/digest construction, the key-rotation and challenge-response
//! onboarding flow, and the policy layer turning verification outcomes into
//! protocol-correct accept/reject decisions.
//!
//! ## Architecture
//!
//! - **signing**: BLAKE2b-512 signing string + deterministic Ed25519 sign/verify
//! - **header**: codec for the `Signature keyId=...` authentication header
//! - **middleware**: axum authenticator gating every protected request
//! - **challenge**: X25519 + AES challenge cipher for onboarding
//! - **rotation**: fresh-keypair generation, persistence and registry submission
//! - **registry / secrets**: narrow contracts to the two external collaborators

pub mod challenge;
pub mod config;
pub mod error;
pub mod errorcode;
pub mod header;
pub mod keys;
pub mod middleware;
pub mod model;
pub mod onboarding;
pub mod registry;
pub mod rotation;
pub mod secrets;
pub mod signing;

pub use config::ServiceConfig;
pub use error::{AuthError, Result};
pub use errorcode::{ProtocolErrorType, Role};
pub use header::SigningInfo;
pub use keys::{EncryptionKeyPair, SigningKeyset};
pub use middleware::{
    authenticate, AuthenticationOutcome, Authenticator, Clock, FixedClock, RejectReason,
    SystemClock,
};
pub use onboarding::OnboardingService;
pub use registry::{Registry, RegistryClient};
pub use rotation::KeyRotationFlow;
pub use secrets::{FileSecretStore, SecretStore};

/// Unix timestamp in seconds, the unit of all validity windows.
pub type UnixSeconds = i64;
