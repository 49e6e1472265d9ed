//! Challenge cipher for the subscription handshake.
//!
//! The registry proves a new participant holds its encryption private key by
//! sending a random challenge encrypted under the X25519 shared secret of the
//! two parties. The symmetric layer is AES-256-ECB with PKCS7 padding over the
//! raw shared secret; that construction is what the registry speaks on the
//! wire, so it is reproduced here exactly. The caller compares the decrypted
//! answer against the original challenge, not this module.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{AuthError, Result};

type Aes256EcbEnc = ecb::Encryptor<Aes256>;
type Aes256EcbDec = ecb::Decryptor<Aes256>;

fn shared_secret(private_key: &[u8], public_key: &[u8]) -> Result<[u8; 32]> {
    let private: [u8; 32] = private_key.try_into().map_err(|_| {
        AuthError::InvalidKey(format!(
            "X25519 private key must be 32 bytes, got {}",
            private_key.len()
        ))
    })?;
    let public: [u8; 32] = public_key.try_into().map_err(|_| {
        AuthError::InvalidKey(format!(
            "X25519 public key must be 32 bytes, got {}",
            public_key.len()
        ))
    })?;

    let secret = StaticSecret::from(private).diffie_hellman(&PublicKey::from(public));
    Ok(*secret.as_bytes())
}

/// Encrypts a challenge string the way the registry does: X25519 ECDH, then
/// AES-256-ECB with PKCS7 padding, base64-encoded.
pub fn encrypt_challenge(message: &str, private_key: &[u8], public_key: &[u8]) -> Result<String> {
    let key = shared_secret(private_key, public_key)?;
    let ciphertext =
        Aes256EcbEnc::new((&key).into()).encrypt_padded_vec_mut::<Pkcs7>(message.as_bytes());
    Ok(BASE64.encode(ciphertext))
}

/// Decrypts a base64 challenge with the recomputed shared secret.
///
/// Malformed base64, a key of the wrong length and invalid PKCS7 padding each
/// surface as their own error.
pub fn decrypt_challenge(
    encrypted_b64: &str,
    private_key: &[u8],
    public_key: &[u8],
) -> Result<String> {
    let key = shared_secret(private_key, public_key)?;
    let ciphertext = BASE64.decode(encrypted_b64)?;
    let plaintext = Aes256EcbDec::new((&key).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| AuthError::InvalidPadding)?;
    String::from_utf8(plaintext).map_err(|e| AuthError::Serialization(e.to_string()))
}
