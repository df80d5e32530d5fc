//! Collaborator contracts consumed by the configurator: managed files, the
//! object renderer, the feature toggle and the service notifier.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;
use strum_macros::AsRefStr;
use thiserror::Error;

use crate::{attrs::RenderedAttributes, model::Ensure};

/// Common result alias for collaborator operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown user `{0}`")]
    UnknownUser(String),
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Desired state of one file.
#[derive(Clone, PartialEq, Eq)]
pub struct ManagedFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub mode: Option<u32>,
    /// When false, content never appears in change output.
    pub show_diff: bool,
}

impl ManagedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            owner: None,
            group: None,
            mode: None,
            show_diff: true,
        }
    }

    pub fn owned_by(mut self, owner: Option<&str>, group: Option<&str>) -> Self {
        self.owner = owner.map(str::to_owned);
        self.group = group.map(str::to_owned);
        self
    }

    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }

    pub fn hide_diff(mut self) -> Self {
        self.show_diff = false;
        self
    }
}

impl fmt::Debug for ManagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedFile")
            .field("path", &self.path)
            .field("content_len", &self.content.len())
            .field("owner", &self.owner)
            .field("group", &self.group)
            .field("mode", &self.mode.map(|mode| format!("{mode:o}")))
            .field("show_diff", &self.show_diff)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileStatus {
    Created,
    Updated,
    Unchanged,
    Removed,
    /// Asked to be absent and already was.
    Absent,
}

impl FileStatus {
    pub fn is_change(self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Removed)
    }
}

/// What happened (or, in noop mode, would happen) to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    /// SHA3-256 of the desired content; unset for removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// New content, only for changed files whose diff may be shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileOutcome {
    pub fn is_change(&self) -> bool {
        self.status.is_change()
    }
}

/// A configuration object to be serialized into its target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSpec {
    pub object_type: String,
    pub object_name: String,
    pub attrs: RenderedAttributes,
    pub target: PathBuf,
    pub order: u32,
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Enable/disable request for one named feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: String,
    pub ensure: Ensure,
    pub conf_dir: PathBuf,
    pub owner: Option<String>,
    pub group: Option<String>,
}

impl FeatureSpec {
    pub fn available_path(&self) -> PathBuf {
        self.conf_dir
            .join("features-available")
            .join(format!("{}.conf", self.name))
    }

    pub fn enabled_path(&self) -> PathBuf {
        self.conf_dir
            .join("features-enabled")
            .join(format!("{}.conf", self.name))
    }
}

pub trait FileStore: Send + Sync {
    fn ensure_file(&self, file: &ManagedFile) -> StoreResult<FileOutcome>;
    fn ensure_absent(&self, path: &Path) -> StoreResult<FileOutcome>;
}

pub trait ObjectRenderer: Send + Sync {
    fn render_object(&self, object: &ObjectSpec) -> StoreResult<FileOutcome>;
}

pub trait FeatureToggle: Send + Sync {
    fn set_feature(&self, feature: &FeatureSpec) -> StoreResult<FileOutcome>;
}

pub trait ServiceNotifier: Send + Sync {
    fn request_reload(&self, reason: &str);
}
