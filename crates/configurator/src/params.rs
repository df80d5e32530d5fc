//! Parameter file loading.

use std::{
    fs,
    path::{Path, PathBuf},
};

use influxdb2_feature_domain::FeatureConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("failed to read parameter file `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid parameters: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Reads and validates a TOML parameter file. Malformed values are rejected
/// here, before any component logic runs.
pub fn load_params(path: &Path) -> Result<FeatureConfig, ParamsError> {
    let raw = fs::read_to_string(path).map_err(|source| ParamsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded parameter file");
    from_toml_str(&raw)
}

pub fn from_toml_str(input: &str) -> Result<FeatureConfig, ParamsError> {
    Ok(toml::from_str(input)?)
}
