use std::env;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::hydrate_env_file;

static SUBSCRIBER_INSTALLED: OnceCell<()> = OnceCell::new();

/// Logging options for binaries.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    log_filter: String,
    with_ansi: bool,
}

impl TelemetryConfig {
    /// Loads logging knobs from optional environment variables prefixed with
    /// `<PREFIX>_`, e.g. `INFLUXDB2_FEATURE_LOG_FILTER`. Missing entries fall
    /// back to defaults so binaries do not require extra configuration.
    pub fn from_env(prefix: &str) -> Self {
        let _ = hydrate_env_file();
        let upper = prefix.trim().to_ascii_uppercase();
        let log_key = format!("{}_LOG_FILTER", upper);
        let ansi_key = format!("{}_LOG_ANSI", upper);

        let log_filter = env::var(log_key)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        let with_ansi = env::var(ansi_key)
            .ok()
            .and_then(|value| value.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            log_filter,
            with_ansi,
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn with_ansi(&self) -> bool {
        self.with_ansi
    }
}

/// Installs the tracing subscriber once per process. Logs go to stderr so
/// stdout stays free for the apply report.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if SUBSCRIBER_INSTALLED.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(config.log_filter())
        .map_err(|err| TelemetryError::InvalidLogFilter(err.to_string()))?;

    if SUBSCRIBER_INSTALLED.set(()).is_ok() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(config.with_ansi())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|err| TelemetryError::Tracing(err.to_string()))?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidLogFilter(String),
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),
}
