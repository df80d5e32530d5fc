use std::path::{Path, PathBuf};

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use super::value::{AbsolutePath, Base64Content};

/// File stem shared by every default TLS asset path.
pub const DEFAULT_ASSET_STEM: &str = "Influxdb2Writer_influxdb2";

/// The three TLS assets the writer can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TlsAssetKind {
    Key,
    Cert,
    CaCert,
}

impl TlsAssetKind {
    pub const ALL: [TlsAssetKind; 3] = [Self::Key, Self::Cert, Self::CaCert];

    /// Suffix appended to [`DEFAULT_ASSET_STEM`]. The key deliberately has
    /// none.
    pub fn default_suffix(self) -> &'static str {
        match self {
            Self::Key => "",
            Self::Cert => ".crt",
            Self::CaCert => "_ca.crt",
        }
    }

    pub fn default_path(self, cert_dir: &Path) -> PathBuf {
        cert_dir.join(format!("{DEFAULT_ASSET_STEM}{}", self.default_suffix()))
    }

    /// Only the private key gets a restricted mode and a suppressed diff.
    pub fn is_private(self) -> bool {
        matches!(self, Self::Key)
    }

    /// Writer attribute that carries the resolved path.
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Key => "ssl_key",
            Self::Cert => "ssl_cert",
            Self::CaCert => "ssl_ca_cert",
        }
    }
}

/// One TLS asset as configured: inline content, an explicit path, both or
/// neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsAsset {
    pub kind: TlsAssetKind,
    pub content: Option<Base64Content>,
    pub path: Option<AbsolutePath>,
}

impl TlsAsset {
    pub fn new(kind: TlsAssetKind) -> Self {
        Self {
            kind,
            content: None,
            path: None,
        }
    }

    pub fn with_content(mut self, content: Base64Content) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_path(mut self, path: AbsolutePath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn is_inline(&self) -> bool {
        self.content.is_some()
    }
}
