//! Session identifiers.
//!
//! # Format
//! Exactly 24 characters drawn from `[0-9a-zA-Z]`. Generated by the
//! registry, validated strictly when parsed from a request path.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of every session identifier.
pub const SESSION_ID_LEN: usize = 24;

/// Opaque 24-character alphanumeric session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

/// Returned when a string is not a well-formed session identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid session id: expected {SESSION_ID_LEN} alphanumeric characters")]
pub struct InvalidSessionId;

impl SessionId {
    /// Generate a fresh random identifier.
    ///
    /// Uniqueness among live sessions is enforced by the registry, not here.
    pub fn generate() -> Self {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    /// Parse a candidate token, rejecting anything but exactly 24 alphanumerics.
    pub fn parse(token: &str) -> Result<Self, InvalidSessionId> {
        if Self::is_valid(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(InvalidSessionId)
        }
    }

    /// Check a token without allocating.
    pub fn is_valid(token: &str) -> bool {
        token.len() == SESSION_ID_LEN && token.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidSessionId)
        }
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}
