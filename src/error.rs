use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the authentication core.
///
/// Malformed input, policy violations and trust failures always turn into a
/// definitive rejection at the HTTP boundary. Collaborator failures are also
/// rejected (fail closed) but are logged as infrastructure faults rather than
/// forged-request signals.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed authentication header: {0}")]
    MalformedHeader(String),

    #[error("Algorithm mismatch: algorithm={algorithm:?}, key ID algorithm={key_id_algorithm:?}")]
    AlgorithmMismatch {
        algorithm: String,
        key_id_algorithm: String,
    },

    #[error("Signature outside validity window: created={created}, expired={expired}, now={now}")]
    OutsideValidityWindow { created: i64, expired: i64, now: i64 },

    #[error("Malformed transaction context: {0}")]
    MalformedContext(String),

    #[error("No public signing key for subscriber {subscriber_id:?} with key ID {unique_key_id:?}")]
    KeyNotFound {
        subscriber_id: String,
        unique_key_id: String,
    },

    #[error("Signature verification failed")]
    SignatureMismatch,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid PKCS7 padding")]
    InvalidPadding,

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("Key rotation incomplete: {0}")]
    RotationIncomplete(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// True for collaborator faults (registry, secret store, transport) as
    /// opposed to bad or forged input from the peer.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AuthError::Registry(_)
                | AuthError::SecretStore(_)
                | AuthError::RotationIncomplete(_)
                | AuthError::Network(_)
                | AuthError::Io(_)
        )
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Serialization(err.to_string())
    }
}
