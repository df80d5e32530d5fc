use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder emitted wherever a secret would otherwise be printed.
pub const REDACTED: &str = "[redacted]";

/// A string that never shows up in `Debug` output or serialized reports and
/// is wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain value. Only renderers that must write the secret to
    /// its destination should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(***)")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

/// Auth token as supplied by the caller: plain text or already marked
/// sensitive (`auth_token = { sensitive = "…" }` in the parameter file).
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "AuthTokenRepr")]
pub enum AuthToken {
    Plain(String),
    Secret(SecretString),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthTokenRepr {
    Plain(String),
    Wrapped { sensitive: String },
}

impl From<AuthTokenRepr> for AuthToken {
    fn from(value: AuthTokenRepr) -> Self {
        match value {
            AuthTokenRepr::Plain(plain) => Self::Plain(plain),
            AuthTokenRepr::Wrapped { sensitive } => Self::Secret(SecretString::new(sensitive)),
        }
    }
}

impl AuthToken {
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Plain(value.into())
    }

    pub fn secret(value: impl Into<String>) -> Self {
        Self::Secret(SecretString::new(value))
    }

    /// Always yields the secret-wrapped form; an already wrapped token is
    /// passed through as-is.
    pub fn normalized(&self) -> SecretString {
        match self {
            Self::Plain(plain) => SecretString::new(plain.as_str()),
            Self::Secret(secret) => secret.clone(),
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => write!(f, "AuthToken::Plain(***)"),
            Self::Secret(_) => write!(f, "AuthToken::Secret(***)"),
        }
    }
}
