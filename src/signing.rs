//! Request signing and verification.
//!
//! What gets signed is never the raw body: it is a canonical signing string
//! derived from a BLAKE2b-512 digest of the body and the signature's validity
//! window. The signature itself is deterministic Ed25519, so peers can
//! reproduce and check it byte for byte.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Signature, Signer as _, Verifier as _, VerifyingKey};

use crate::error::{AuthError, Result};
use crate::keys::SigningKeyset;
use crate::UnixSeconds;

/// Renders the canonical string that gets signed and verified.
///
/// Digesting never fails; any byte sequence has a well-defined signing string.
pub fn signing_string(payload: &[u8], created: UnixSeconds, expired: UnixSeconds) -> String {
    let digest = Blake2b512::digest(payload);
    format!(
        "(created): {created}\n(expires): {expired}\ndigest: BLAKE-512={}",
        BASE64.encode(digest)
    )
}

/// Signs arbitrary bytes with the keyset's active private key.
///
/// Used directly for the site-verification signature, which signs a request id
/// without a signing-string construction.
pub fn sign(data: &[u8], keyset: &SigningKeyset) -> Result<Vec<u8>> {
    let signing_key = keyset.signing_key()?;
    Ok(signing_key.sign(data).to_bytes().to_vec())
}

/// Signs a request payload over its signing string, returning base64.
pub fn sign_payload(
    payload: &[u8],
    keyset: &SigningKeyset,
    created: UnixSeconds,
    expired: UnixSeconds,
) -> Result<String> {
    let signature = sign(signing_string(payload, created, expired).as_bytes(), keyset)?;
    Ok(BASE64.encode(signature))
}

/// Verifies a base64 signature over the payload's signing string.
///
/// Fails closed: malformed base64, a wrong-length signature or key, and a
/// cryptographic mismatch all collapse into the same error so callers cannot
/// leak which one happened.
pub fn verify_signature(
    signature_b64: &str,
    payload: &[u8],
    public_key: &[u8],
    created: UnixSeconds,
    expired: UnixSeconds,
) -> Result<()> {
    let signature = BASE64
        .decode(signature_b64)
        .map_err(|_| AuthError::SignatureMismatch)?;
    let signature = Signature::from_slice(&signature).map_err(|_| AuthError::SignatureMismatch)?;
    let public_key: [u8; 32] = public_key
        .try_into()
        .map_err(|_| AuthError::SignatureMismatch)?;
    let verifying_key =
        VerifyingKey::from_bytes(&public_key).map_err(|_| AuthError::SignatureMismatch)?;

    verifying_key
        .verify(signing_string(payload, created, expired).as_bytes(), &signature)
        .map_err(|_| AuthError::SignatureMismatch)
}

/// Builds the complete authentication header value for an outbound request.
pub fn create_auth_signature(
    payload: &[u8],
    keyset: &SigningKeyset,
    created: UnixSeconds,
    expired: UnixSeconds,
    subscriber_id: &str,
    unique_key_id: &str,
) -> Result<String> {
    let signature = sign_payload(payload, keyset, created, expired)?;
    Ok(format!(
        "Signature keyId=\"{subscriber_id}|{unique_key_id}|ed25519\",algorithm=\"ed25519\",\
         created=\"{created}\",expires=\"{expired}\",headers=\"(created) (expires) digest\",\
         signature=\"{signature}\""
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixtures from the network's reference signing example.
    const EXAMPLE_PRIVATE_KEY_B64: &str =
        "lP3sHA+9gileOkXYJXh4Jg8tK0gEEMbf9yCPnFpbldhrAY+NErqL9WD+Vav7TE5tyVXGXBle9ONZi2W7o144eQ==";
    const EXAMPLE_PUBLIC_KEY_B64: &str = "awGPjRK6i/Vg/lWr+0xObclVxlwZXvTjWYtlu6NeOHk=";
    const EXAMPLE_PAYLOAD: &[u8] = br#"{"context":{"domain":"nic2004:60212","country":"IND","city":"Kochi","action":"search","core_version":"0.9.1","bap_id":"bap.stayhalo.in","bap_uri":"https://8f9f-49-207-209-131.ngrok.io/protocol/","transaction_id":"e6d9f908-1d26-4ff3-a6d1-3af3d3721054","message_id":"a2fe6d52-9fe4-4d1a-9d0b-dccb8b48522d","timestamp":"2022-01-04T09:17:55.971Z","ttl":"P1M"},"message":{"intent":{"fulfillment":{"start":{"location":{"gps":"10.108768, 76.347517"}},"end":{"location":{"gps":"10.102997, 76.353480"}}}}}}"#;
    const CREATED: i64 = 1641287875;
    const EXPIRED: i64 = 1641291475;
    const EXPECTED_SIGNATURE: &str =
        "cjbhP0PFyrlSCNszJM1F/YmHDVAWsZqJUPzojnE/7TJU3fJ/rmIlgaUHEr5E0/2PIyf0tpSnWtT6cyNNlpmoAQ==";

    fn example_keyset() -> SigningKeyset {
        let private = BASE64.decode(EXAMPLE_PRIVATE_KEY_B64).unwrap();
        SigningKeyset::from_seed(private[..32].try_into().unwrap())
    }

    fn example_public_key() -> Vec<u8> {
        BASE64.decode(EXAMPLE_PUBLIC_KEY_B64).unwrap()
    }

    #[test]
    fn test_signing_string_format() {
        let s = signing_string(b"hello", 1, 2);
        let mut lines = s.lines();
        assert_eq!(lines.next(), Some("(created): 1"));
        assert_eq!(lines.next(), Some("(expires): 2"));
        let digest_line = lines.next().unwrap();
        assert!(digest_line.starts_with("digest: BLAKE-512="));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_sign_payload_known_vector() {
        let signature =
            sign_payload(EXAMPLE_PAYLOAD, &example_keyset(), CREATED, EXPIRED).unwrap();
        assert_eq!(signature, EXPECTED_SIGNATURE);
    }

    #[test]
    fn test_create_auth_signature_known_vector() {
        let header = create_auth_signature(
            EXAMPLE_PAYLOAD,
            &example_keyset(),
            CREATED,
            EXPIRED,
            "example-bap.com",
            "bap1234",
        )
        .unwrap();
        assert_eq!(
            header,
            "Signature keyId=\"example-bap.com|bap1234|ed25519\",algorithm=\"ed25519\",\
             created=\"1641287875\",expires=\"1641291475\",\
             headers=\"(created) (expires) digest\",\
             signature=\"cjbhP0PFyrlSCNszJM1F/YmHDVAWsZqJUPzojnE/7TJU3fJ/rmIlgaUHEr5E0/2PIyf0tpSnWtT6cyNNlpmoAQ==\""
        );
    }

    #[test]
    fn test_sign_verify_round_trip_with_fresh_keyset() {
        let keyset = SigningKeyset::generate();
        let public_key = keyset.public_key().unwrap();
        let signature = sign_payload(EXAMPLE_PAYLOAD, &keyset, CREATED, EXPIRED).unwrap();
        verify_signature(&signature, EXAMPLE_PAYLOAD, &public_key, CREATED, EXPIRED).unwrap();
    }

    #[test]
    fn test_verify_known_vector() {
        verify_signature(
            EXPECTED_SIGNATURE,
            EXAMPLE_PAYLOAD,
            &example_public_key(),
            CREATED,
            EXPIRED,
        )
        .unwrap();
    }

    #[test]
    fn test_tampered_payload_fails() {
        let mut tampered = EXAMPLE_PAYLOAD.to_vec();
        tampered[10] ^= 0x01;
        assert!(matches!(
            verify_signature(EXPECTED_SIGNATURE, &tampered, &example_public_key(), CREATED, EXPIRED),
            Err(AuthError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_tampered_window_fails() {
        assert!(verify_signature(
            EXPECTED_SIGNATURE,
            EXAMPLE_PAYLOAD,
            &example_public_key(),
            CREATED + 1,
            EXPIRED,
        )
        .is_err());
        assert!(verify_signature(
            EXPECTED_SIGNATURE,
            EXAMPLE_PAYLOAD,
            &example_public_key(),
            CREATED,
            EXPIRED - 1,
        )
        .is_err());
    }

    #[test]
    fn test_wrong_public_key_fails() {
        let other = SigningKeyset::generate().public_key().unwrap();
        assert!(
            verify_signature(EXPECTED_SIGNATURE, EXAMPLE_PAYLOAD, &other, CREATED, EXPIRED)
                .is_err()
        );
    }

    #[test]
    fn test_malformed_inputs_collapse_to_mismatch() {
        let public_key = example_public_key();
        // bad base64
        assert!(matches!(
            verify_signature("!!!", EXAMPLE_PAYLOAD, &public_key, CREATED, EXPIRED),
            Err(AuthError::SignatureMismatch)
        ));
        // signature too short
        assert!(matches!(
            verify_signature("c2hvcnQ=", EXAMPLE_PAYLOAD, &public_key, CREATED, EXPIRED),
            Err(AuthError::SignatureMismatch)
        ));
        // key of the wrong length
        assert!(matches!(
            verify_signature(EXPECTED_SIGNATURE, EXAMPLE_PAYLOAD, &public_key[..16], CREATED, EXPIRED),
            Err(AuthError::SignatureMismatch)
        ));
    }
}
