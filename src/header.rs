//! Authentication header codec.
//!
//! The header value is a `Signature ` prefix followed by comma-separated
//! `key="value"` pairs. The `keyId` field packs the subscriber id, the unique
//! key id and the algorithm into one `|`-separated value; the `headers` field
//! documents which components were signed and is checked for presence only,
//! since this scheme fixes the signed set.

use std::collections::HashMap;

use crate::error::{AuthError, Result};
use crate::UnixSeconds;

const REQUIRED_FIELDS: [&str; 6] = [
    "keyId",
    "algorithm",
    "created",
    "expires",
    "headers",
    "signature",
];

/// Authentication information carried on a signed request.
///
/// Immutable once parsed; a request is well-formed only when `algorithm`
/// matches `key_id_algorithm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningInfo {
    pub subscriber_id: String,
    pub unique_key_id: String,
    pub key_id_algorithm: String,
    pub algorithm: String,
    pub created: UnixSeconds,
    pub expired: UnixSeconds,
    pub signature: String,
}

/// Parses a `SigningInfo` out of an authentication header value.
pub fn parse_header(header: &str) -> Result<SigningInfo> {
    let trimmed = header.strip_prefix("Signature ").unwrap_or(header);

    let mut values: HashMap<&str, &str> = HashMap::new();
    for element in trimmed.split(',') {
        if let Some((key, value)) = element.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            values.insert(key, value);
        }
    }

    for field in REQUIRED_FIELDS {
        if !values.contains_key(field) {
            return Err(AuthError::MalformedHeader(format!("missing {field}")));
        }
    }

    let key_id = values["keyId"];
    let key_parts: Vec<&str> = key_id.split('|').collect();
    let [subscriber_id, unique_key_id, key_id_algorithm] = key_parts.as_slice() else {
        return Err(AuthError::MalformedHeader(format!("invalid keyId: {key_id:?}")));
    };

    let created: UnixSeconds = values["created"]
        .parse()
        .map_err(|_| AuthError::MalformedHeader(format!("invalid created: {:?}", values["created"])))?;
    let expired: UnixSeconds = values["expires"]
        .parse()
        .map_err(|_| AuthError::MalformedHeader(format!("invalid expires: {:?}", values["expires"])))?;

    Ok(SigningInfo {
        subscriber_id: subscriber_id.to_string(),
        unique_key_id: unique_key_id.to_string(),
        key_id_algorithm: key_id_algorithm.to_string(),
        algorithm: values["algorithm"].to_string(),
        created,
        expired,
        signature: values["signature"].to_string(),
    })
}

/// Renders a `SigningInfo` back into a header value.
pub fn encode_header(info: &SigningInfo) -> String {
    format!(
        "Signature keyId=\"{}|{}|{}\",algorithm=\"{}\",created=\"{}\",expires=\"{}\",\
         headers=\"(created) (expires) digest\",signature=\"{}\"",
        info.subscriber_id,
        info.unique_key_id,
        info.key_id_algorithm,
        info.algorithm,
        info.created,
        info.expired,
        info.signature,
    )
}
