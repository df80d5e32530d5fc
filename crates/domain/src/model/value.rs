//! Validated parameter values. Each type rejects malformed input while the
//! parameter file is being bound, so component logic only ever sees values
//! that already satisfy their format contract.

use std::{fmt, net::IpAddr, path::Path};

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a DNS name, excluding the optional trailing dot.
pub const MAX_HOSTNAME_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Accepts both padded and unpadded input, matching the `={0,2}` contract.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors emitted when a parameter value fails its format contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{0}` is neither a valid hostname nor an IP address")]
    InvalidHost(String),
    #[error("port {0} is outside 0..=65535")]
    InvalidPort(i64),
    #[error("`{0}` is not an absolute path")]
    NotAbsolutePath(String),
    #[error("invalid base64 content: {0}")]
    InvalidBase64(String),
    #[error("`{0}` is not a valid interval (expected seconds or e.g. `10s`, `1.5m`)")]
    InvalidInterval(String),
    #[error("flush threshold must be at least 1, got {0}")]
    InvalidFlushThreshold(i64),
}

/// Hostname or IP literal of the InfluxDB endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(String);

impl Host {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.parse::<IpAddr>().is_ok() || is_valid_hostname(trimmed) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(ValidationError::InvalidHost(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_hostname(value: &str) -> bool {
    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() || name.len() > MAX_HOSTNAME_LENGTH {
        return false;
    }

    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

impl TryFrom<String> for Host {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Host> for String {
    fn from(value: Host) -> Self {
        value.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// TCP port of the InfluxDB endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct Port(u16);

impl Port {
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for Port {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .map(Self)
            .map_err(|_| ValidationError::InvalidPort(value))
    }
}

impl From<Port> for u16 {
    fn from(value: Port) -> Self {
        value.0
    }
}

/// Absolute path on either a Unix or a Windows host. Kept as a string so a
/// Windows path stays verbatim when the tool itself runs elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AbsolutePath(String);

impl AbsolutePath {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if is_unix_absolute(value) || is_windows_absolute(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(ValidationError::NotAbsolutePath(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

fn is_unix_absolute(value: &str) -> bool {
    value.starts_with('/') && !value.contains(['\n', '\0'])
}

fn is_windows_absolute(value: &str) -> bool {
    let bytes = value.as_bytes();
    let is_sep = |b: u8| b == b'\\' || b == b'/';

    // `C:\…` or `C:/…`
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && is_sep(bytes[2])
    {
        return true;
    }

    // `\\server\share…` or `\\?\…`
    if bytes.len() >= 3 && is_sep(bytes[0]) && is_sep(bytes[1]) {
        let rest = &value[2..];
        if let Some(stripped) = rest.strip_prefix('?') {
            return stripped.starts_with(['\\', '/']) && stripped.len() > 1;
        }
        let mut parts = rest.split(['\\', '/']);
        let server = parts.next().unwrap_or_default();
        let share = parts.next().unwrap_or_default();
        return !server.is_empty() && !share.is_empty();
    }

    false
}

impl TryFrom<String> for AbsolutePath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AbsolutePath> for String {
    fn from(value: AbsolutePath) -> Self {
        value.0
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inline base64 content. Decoded once while binding so a value that passes
/// validation can always be written.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Base64Content {
    decoded: Vec<u8>,
}

impl Base64Content {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let body = value.trim_end_matches('=');
        let padding = value.len() - body.len();
        if body.is_empty() {
            return Err(ValidationError::InvalidBase64("content is empty".into()));
        }
        if padding > 2 {
            return Err(ValidationError::InvalidBase64(
                "more than two padding characters".into(),
            ));
        }
        if let Some(bad) = body
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '+' || *c == '/'))
        {
            return Err(ValidationError::InvalidBase64(format!(
                "unexpected character {bad:?}"
            )));
        }

        let decoded = LENIENT_BASE64
            .decode(value)
            .map_err(|err| ValidationError::InvalidBase64(err.to_string()))?;
        Ok(Self { decoded })
    }

    /// Wraps already-decoded bytes.
    pub fn from_decoded(decoded: impl Into<Vec<u8>>) -> Self {
        Self {
            decoded: decoded.into(),
        }
    }

    pub fn decoded(&self) -> &[u8] {
        &self.decoded
    }
}

impl TryFrom<String> for Base64Content {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Debug for Base64Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base64Content({} bytes)", self.decoded.len())
    }
}

/// Icinga 2 duration: a plain number of seconds or a number with a
/// `d`/`h`/`m`/`s` unit suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr", into = "String")]
pub struct Interval(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum IntervalRepr {
    Seconds(i64),
    Literal(String),
}

impl Interval {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if is_interval_literal(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(ValidationError::InvalidInterval(value.to_owned()))
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_interval_literal(value: &str) -> bool {
    let number = value
        .strip_suffix(['d', 'h', 'm', 's'])
        .unwrap_or(value);
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = ValidationError;

    fn try_from(value: IntervalRepr) -> Result<Self, Self::Error> {
        match value {
            IntervalRepr::Seconds(secs) => u64::try_from(secs)
                .map(Self::from_secs)
                .map_err(|_| ValidationError::InvalidInterval(secs.to_string())),
            IntervalRepr::Literal(literal) => Self::parse(&literal),
        }
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.0
    }
}

/// Number of buffered data points that forces a flush; at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct FlushThreshold(u64);

impl FlushThreshold {
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::InvalidFlushThreshold(0));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for FlushThreshold {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u64::try_from(value) {
            Ok(v) if v >= 1 => Ok(Self(v)),
            _ => Err(ValidationError::InvalidFlushThreshold(value)),
        }
    }
}

impl From<FlushThreshold> for u64 {
    fn from(value: FlushThreshold) -> Self {
        value.0
    }
}
