//! Key material containers and codecs.
//!
//! Signing keys (Ed25519) travel inside a portable JSON keyset; the key in
//! use is identified by position, not by an embedded id. Encryption keys
//! (X25519) are raw 32-byte values with a DER (SubjectPublicKeyInfo) form for
//! the public half, which is what the registry exchanges on the wire.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{AuthError, Result};

/// Portable container for one Ed25519 private/public key pair.
///
/// The private form must never leave the secret store boundary except to be
/// handed to the signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKeyset {
    keys: Vec<SigningKeyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SigningKeyEntry {
    algorithm: String,
    /// Base64 of the 32-byte Ed25519 seed.
    private_key: String,
    /// Base64 of the 32-byte Ed25519 public key.
    public_key: String,
}

impl SigningKeyset {
    /// Generates a keyset with a fresh Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_seed(signing_key.to_bytes())
    }

    /// Builds a keyset from a raw 32-byte Ed25519 seed, deriving the public
    /// counterpart.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let public_key = signing_key.verifying_key().to_bytes();
        Self {
            keys: vec![SigningKeyEntry {
                algorithm: "ed25519".to_string(),
                private_key: BASE64.encode(seed),
                public_key: BASE64.encode(public_key),
            }],
        }
    }

    /// Serializes the keyset to its portable JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes a keyset from its portable JSON form.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let keyset: SigningKeyset = serde_json::from_slice(bytes)?;
        if keyset.keys.is_empty() {
            return Err(AuthError::InvalidKey("keyset contains no keys".to_string()));
        }
        Ok(keyset)
    }

    /// Decodes the active private key into a usable signing key.
    pub(crate) fn signing_key(&self) -> Result<SigningKey> {
        let entry = self.active_entry()?;
        if entry.algorithm != "ed25519" {
            return Err(AuthError::InvalidKey(format!(
                "unsupported signing algorithm: {:?}",
                entry.algorithm
            )));
        }
        let seed = BASE64.decode(&entry.private_key)?;
        let seed: [u8; 32] = seed.as_slice().try_into().map_err(|_| {
            AuthError::InvalidKey(format!("Ed25519 seed must be 32 bytes, got {}", seed.len()))
        })?;
        Ok(SigningKey::from_bytes(&seed))
    }

    /// Extracts the raw public key without exposing the private scalar.
    pub fn public_key(&self) -> Result<Vec<u8>> {
        let entry = self.active_entry()?;
        let public = BASE64.decode(&entry.public_key)?;
        if public.len() != 32 {
            return Err(AuthError::InvalidKey(format!(
                "Ed25519 public key must be 32 bytes, got {}",
                public.len()
            )));
        }
        Ok(public)
    }

    fn active_entry(&self) -> Result<&SigningKeyEntry> {
        self.keys
            .first()
            .ok_or_else(|| AuthError::InvalidKey("keyset contains no keys".to_string()))
    }
}

/// Fresh X25519 key pair with the public half in both raw and DER form.
#[derive(Debug, Clone)]
pub struct EncryptionKeyPair {
    pub private_key: [u8; 32],
    pub public_key: [u8; 32],
    pub public_key_der: Vec<u8>,
}

impl EncryptionKeyPair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        let public_key = public.to_bytes();
        Self {
            private_key: secret.to_bytes(),
            public_key,
            public_key_der: encode_x25519_public_der(&public_key),
        }
    }
}

// Fixed SubjectPublicKeyInfo header for the X25519 OID (1.3.101.110) followed
// by a 32-byte BIT STRING. Constant for this algorithm.
const X25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

/// DER-encodes a raw X25519 public key as a SubjectPublicKeyInfo document.
pub fn encode_x25519_public_der(raw: &[u8; 32]) -> Vec<u8> {
    let mut der = Vec::with_capacity(X25519_SPKI_PREFIX.len() + raw.len());
    der.extend_from_slice(&X25519_SPKI_PREFIX);
    der.extend_from_slice(raw);
    der
}

/// Extracts the raw 32-byte X25519 public key from a base64 DER document.
///
/// Rejects any document that is not an X25519 SubjectPublicKeyInfo.
pub fn extract_raw_public_key_from_der(der_b64: &str) -> Result<[u8; 32]> {
    let der = BASE64.decode(der_b64)?;
    if der.len() != X25519_SPKI_PREFIX.len() + 32 || der[..X25519_SPKI_PREFIX.len()] != X25519_SPKI_PREFIX
    {
        return Err(AuthError::InvalidKey(
            "not an X25519 SubjectPublicKeyInfo document".to_string(),
        ));
    }
    let mut raw = [0u8; 32];
    raw.copy_from_slice(&der[X25519_SPKI_PREFIX.len()..]);
    Ok(raw)
}
