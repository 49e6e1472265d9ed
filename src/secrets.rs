//! Secret store collaborator.
//!
//! Private key material lives outside this process; the core only needs the
//! narrow contract below. The file-backed implementation covers local and
//! single-node deployments, where the newest payload for a secret id simply
//! replaces the previous one.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::keys::{EncryptionKeyPair, SigningKeyset};

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// The service's Ed25519 private keyset in its portable JSON form.
    async fn signing_private_keyset(&self) -> Result<Vec<u8>>;

    /// The service's raw 32-byte X25519 private key.
    async fn encryption_private_key(&self) -> Result<Vec<u8>>;

    /// Stores a new key-material payload under the given secret id,
    /// superseding the previous version.
    async fn add_key(&self, secret_id: &str, payload: &[u8]) -> Result<()>;
}

/// Stored shape of one rotation's key material. Byte fields are base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMaterial {
    pub encryption_key: EncryptionKeyMaterial,
    pub signing_key: SigningKeyMaterial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionKeyMaterial {
    pub private_key_encryption: String,
    pub public_key_encryption: String,
    pub public_key_encryption_der: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKeyMaterial {
    pub signing_keyset: String,
    pub public_key_signing: String,
}

impl KeyMaterial {
    /// Packs one rotation's freshly generated pairs into the stored shape.
    pub fn from_generated(encryption: &EncryptionKeyPair, signing: &SigningKeyset) -> Result<Self> {
        Ok(Self {
            encryption_key: EncryptionKeyMaterial {
                private_key_encryption: BASE64.encode(encryption.private_key),
                public_key_encryption: BASE64.encode(encryption.public_key),
                public_key_encryption_der: BASE64.encode(&encryption.public_key_der),
            },
            signing_key: SigningKeyMaterial {
                signing_keyset: BASE64.encode(signing.to_json()?),
                public_key_signing: BASE64.encode(signing.public_key()?),
            },
        })
    }
}

/// File-backed secret store keeping one JSON payload per secret id.
pub struct FileSecretStore {
    dir: PathBuf,
    secret_id: String,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>, secret_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            secret_id: secret_id.into(),
        }
    }

    fn path_for(&self, secret_id: &str) -> PathBuf {
        self.dir.join(format!("{secret_id}.json"))
    }

    async fn read_material(&self) -> Result<KeyMaterial> {
        let path = self.path_for(&self.secret_id);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            AuthError::SecretStore(format!("read {}: {e}", path.display()))
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::SecretStore(format!("parse {}: {e}", path.display())))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn signing_private_keyset(&self) -> Result<Vec<u8>> {
        let material = self.read_material().await?;
        Ok(BASE64.decode(&material.signing_key.signing_keyset)?)
    }

    async fn encryption_private_key(&self) -> Result<Vec<u8>> {
        let material = self.read_material().await?;
        Ok(BASE64.decode(&material.encryption_key.private_key_encryption)?)
    }

    async fn add_key(&self, secret_id: &str, payload: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AuthError::SecretStore(format!("create {}: {e}", self.dir.display())))?;
        let path = self.path_for(secret_id);
        tokio::fs::write(&path, payload)
            .await
            .map_err(|e| AuthError::SecretStore(format!("write {}: {e}", path.display())))
    }
}
