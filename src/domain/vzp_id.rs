//! Type-safe identifiers for events, members and roles.
//!
//! [`VzpId`] is the short token printed in the event footer and typed back
//! by operators in commands. [`UserId`] and [`RoleId`] wrap the chat
//! platform's numeric snowflakes so they cannot be mixed up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of a [`VzpId`] token.
pub const VZP_ID_LEN: usize = 8;

/// Unique identifier for a VZP event.
///
/// Eight lowercase hex characters taken from a UUID v4. Generated once at
/// creation and immutable thereafter. Used as the key in
/// [`super::VzpStore`], as the subscription target on the WebSocket feed
/// and as the argument of every operator command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VzpId(String);

impl VzpId {
    /// Creates a new random `VzpId`.
    #[must_use]
    pub fn generate() -> Self {
        let token: String = uuid::Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(VZP_ID_LEN)
            .collect();
        Self(token)
    }

    /// Parses an operator-supplied token.
    ///
    /// Surrounding whitespace and backticks are ignored and hex digits are
    /// lowercased. Returns `None` if the token is not eight hex digits.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().trim_matches('`').to_ascii_lowercase();
        let valid = token.len() == VZP_ID_LEN && token.chars().all(|c| c.is_ascii_hexdigit());
        valid.then_some(Self(token))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VzpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform identity of a member.
///
/// Serialized as a decimal string: snowflakes exceed the integer range
/// JSON clients can represent exactly. Numbers are still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "RawUserId")]
pub struct UserId(u64);

/// Accepted wire forms of a [`UserId`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Text(String),
    Number(u64),
}

impl TryFrom<RawUserId> for UserId {
    type Error = String;

    fn try_from(raw: RawUserId) -> Result<Self, Self::Error> {
        match raw {
            RawUserId::Number(n) => Ok(Self(n)),
            RawUserId::Text(s) => s
                .trim()
                .parse()
                .map(Self)
                .map_err(|_| format!("'{s}' is not a user id")),
        }
    }
}

impl From<UserId> for String {
    fn from(user: UserId) -> Self {
        user.0.to_string()
    }
}

impl UserId {
    /// Wraps a raw platform snowflake.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw snowflake.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Platform mention markup, used when no display name is known.
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Platform identity of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(u64);

impl RoleId {
    /// Wraps a raw platform snowflake.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
