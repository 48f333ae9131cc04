//! Opaque identifiers for proposal links.
//!
//! Tokens are never decoded: they are compared for equality and checked for
//! the `prop_<hex>` shape, nothing else.

use crate::errors::TokenError;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of every proposal token.
pub const PROPOSAL_TOKEN_PREFIX: &str = "prop_";

/// Default number of random bytes in a secure token.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

/// Random bytes in a freshly generated proposal token.
const PROPOSAL_TOKEN_BYTES: usize = 24;

/// Shortest hex part accepted by [`is_valid_proposal_token`].
const MIN_PROPOSAL_HEX_LEN: usize = 32;

/// `length` bytes from the OS random source, as `2 * length` lowercase hex
/// characters.
pub fn generate_secure_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A new `prop_` token carrying 24 random bytes.
pub fn generate_proposal_token() -> String {
    format!(
        "{PROPOSAL_TOKEN_PREFIX}{}",
        generate_secure_token(PROPOSAL_TOKEN_BYTES)
    )
}

/// Whether `token` matches `^prop_[a-f0-9]{32,}$`.
///
/// Accepts shorter tokens than [`generate_proposal_token`] produces.
pub fn is_valid_proposal_token(token: &str) -> bool {
    token.strip_prefix(PROPOSAL_TOKEN_PREFIX).is_some_and(|hex| {
        hex.len() >= MIN_PROPOSAL_HEX_LEN
            && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// A proposal token whose format has been checked
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProposalToken(String);

impl ProposalToken {
    /// Generate a new token.
    pub fn generate() -> Self {
        Self(generate_proposal_token())
    }

    /// Check the format of `token`.
    pub fn parse(token: &str) -> Result<Self, TokenError> {
        if is_valid_proposal_token(token) {
            Ok(Self(token.to_owned()))
        } else {
            Err(TokenError)
        }
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProposalToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProposalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens grant access to a proposal; keep them out of debug logs.
impl fmt::Debug for ProposalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalToken({PROPOSAL_TOKEN_PREFIX}…)")
    }
}

impl<'de> Deserialize<'de> for ProposalToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
