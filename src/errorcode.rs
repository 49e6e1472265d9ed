//! Protocol error codes.
//!
//! Every rejection sent to a peer carries a stable numeric code from this
//! closed per-role table, so that peers can tell signature failures apart from
//! schema failures without parsing free text. The table covers only the codes
//! this system emits, not the full network specification.

use std::str::FromStr;

use crate::error::AuthError;

/// Role of a participant in the commerce network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Gateway,
    BuyerApp,
    SellerApp,
    Logistics,
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gateway" => Ok(Role::Gateway),
            "buyer-app" => Ok(Role::BuyerApp),
            "seller-app" => Ok(Role::SellerApp),
            "logistics" => Ok(Role::Logistics),
            other => Err(AuthError::Config(format!("unknown role: {other:?}"))),
        }
    }
}

/// Protocol-level error categories with per-role numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorType {
    InvalidSignature,
    InvalidRequest,
}

/// Looks up the numeric protocol code for a role/error combination.
///
/// Returns `None` for combinations the network specification does not define.
pub fn lookup(role: Role, err: ProtocolErrorType) -> Option<u32> {
    use ProtocolErrorType::{InvalidRequest, InvalidSignature};

    match (role, err) {
        (Role::Gateway, InvalidRequest) => Some(10000),
        (Role::Gateway, InvalidSignature) => Some(10001),
        (Role::BuyerApp, InvalidSignature) => Some(20001),
        (Role::BuyerApp, InvalidRequest) => None,
        (Role::SellerApp, InvalidRequest) => Some(30000),
        (Role::SellerApp, InvalidSignature) => Some(30016),
        (Role::Logistics, InvalidSignature) => Some(60005),
        (Role::Logistics, InvalidRequest) => Some(60006),
    }
}
