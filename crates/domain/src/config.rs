//! Environment-driven configuration: base-system facts and run options.

use std::{
    env,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::platform::{PlatformCapabilities, PlatformFamily};

/// Placeholder accepted by `ICINGA2_USER`/`ICINGA2_GROUP` to clear the
/// platform default.
pub const NO_IDENTITY: &str = "-";

/// Facts about the base monitoring-system installation the feature builds on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSystem {
    platform: PlatformFamily,
    user: Option<String>,
    group: Option<String>,
    conf_dir: PathBuf,
    cert_dir: PathBuf,
}

impl BaseSystem {
    /// Base system with the defaults of the platform's capability table.
    pub fn for_platform(platform: PlatformFamily) -> Self {
        let caps = platform.capabilities();
        Self {
            platform,
            user: caps.default_user.map(str::to_owned),
            group: caps.default_group.map(str::to_owned),
            conf_dir: PathBuf::from(caps.conf_dir),
            cert_dir: PathBuf::from(caps.cert_dir),
        }
    }

    pub fn with_identity(mut self, user: Option<&str>, group: Option<&str>) -> Self {
        self.user = user.map(str::to_owned);
        self.group = group.map(str::to_owned);
        self
    }

    pub fn with_conf_dir(mut self, conf_dir: impl Into<PathBuf>) -> Self {
        self.conf_dir = conf_dir.into();
        self
    }

    pub fn with_cert_dir(mut self, cert_dir: impl Into<PathBuf>) -> Self {
        self.cert_dir = cert_dir.into();
        self
    }

    pub fn platform(&self) -> PlatformFamily {
        self.platform
    }

    pub fn capabilities(&self) -> &'static PlatformCapabilities {
        self.platform.capabilities()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }

    pub fn cert_dir(&self) -> &Path {
        &self.cert_dir
    }
}

/// Ambient state handed to the configurator at call time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentContext {
    base: Option<BaseSystem>,
}

impl EnvironmentContext {
    pub fn with_base(base: BaseSystem) -> Self {
        Self { base: Some(base) }
    }

    pub fn without_base() -> Self {
        Self { base: None }
    }

    pub fn base(&self) -> Option<&BaseSystem> {
        self.base.as_ref()
    }

    /// Reads base-system facts from the process environment. The base system
    /// counts as configured only when `ICINGA2_CONF_DIR` is set; every other
    /// variable overrides a platform default.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let Some(conf_dir) = get_optional_var("ICINGA2_CONF_DIR") else {
            debug!("ICINGA2_CONF_DIR unset, no base system");
            return Ok(Self::without_base());
        };

        let platform = match get_optional_var("ICINGA2_PLATFORM") {
            Some(value) => value
                .parse::<PlatformFamily>()
                .map_err(|_| ConfigError::InvalidPlatform { value })?,
            None => PlatformFamily::detect(),
        };

        let mut base = BaseSystem::for_platform(platform).with_conf_dir(conf_dir);
        let user = identity_override("ICINGA2_USER").unwrap_or_else(|| base.user.clone());
        let group = identity_override("ICINGA2_GROUP").unwrap_or_else(|| base.group.clone());
        base = base.with_identity(user.as_deref(), group.as_deref());
        if let Some(cert_dir) = get_optional_var("ICINGA2_CERT_DIR") {
            base = base.with_cert_dir(cert_dir);
        }
        debug!(
            platform = %base.platform,
            conf_dir = %base.conf_dir.display(),
            user = ?base.user,
            "base system loaded from environment"
        );

        Ok(Self::with_base(base))
    }
}

/// Options of one configurator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    params_path: PathBuf,
    noop: bool,
}

impl RunOptions {
    /// Parses `[--noop] [<params.toml>]`, falling back to
    /// `INFLUXDB2_FEATURE_PARAMS` and `INFLUXDB2_FEATURE_NOOP`.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        hydrate_env_file()?;

        let mut noop = env::var_os("INFLUXDB2_FEATURE_NOOP").is_some();
        let mut params_path = None;
        for arg in args {
            if arg == "--noop" || arg == "-n" {
                noop = true;
            } else if arg.starts_with('-') || params_path.is_some() {
                return Err(ConfigError::UnknownArgument { arg });
            } else {
                params_path = Some(PathBuf::from(arg));
            }
        }

        let params_path = match params_path {
            Some(path) => path,
            None => PathBuf::from(get_required_var("INFLUXDB2_FEATURE_PARAMS")?),
        };

        Ok(Self { params_path, noop })
    }

    pub fn params_path(&self) -> &Path {
        &self.params_path
    }

    pub fn noop(&self) -> bool {
        self.noop
    }
}

fn identity_override(key: &'static str) -> Option<Option<String>> {
    get_optional_var(key).map(|value| (value != NO_IDENTITY).then_some(value))
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    get_optional_var(key).ok_or(ConfigError::MissingVar { key })
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("INFLUXDB2_FEATURE_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("unknown platform family `{value}`")]
    InvalidPlatform { value: String },
    #[error("unexpected argument `{arg}`")]
    UnknownArgument { arg: String },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}

/// Serializes every test in this crate that touches the process environment.
#[cfg(test)]
pub(crate) static ENV_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 8] = [
        "ICINGA2_CONF_DIR",
        "ICINGA2_PLATFORM",
        "ICINGA2_USER",
        "ICINGA2_GROUP",
        "ICINGA2_CERT_DIR",
        "INFLUXDB2_FEATURE_PARAMS",
        "INFLUXDB2_FEATURE_NOOP",
        "INFLUXDB2_FEATURE_SKIP_DOTENV",
    ];

    fn reset_env() {
        for var in VARS {
            env::remove_var(var);
        }
        env::set_var("INFLUXDB2_FEATURE_SKIP_DOTENV", "1");
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn platform_defaults_fill_the_base_system() {
        let base = BaseSystem::for_platform(PlatformFamily::RedHat);
        assert_eq!(base.user(), Some("icinga"));
        assert_eq!(base.conf_dir(), Path::new("/etc/icinga2"));
        assert_eq!(base.cert_dir(), Path::new("/var/lib/icinga2/certs"));

        let windows = BaseSystem::for_platform(PlatformFamily::Windows);
        assert_eq!(windows.user(), None);
        assert!(windows.capabilities().crlf_line_endings);
    }

    #[test]
    fn missing_conf_dir_means_no_base_system() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        let context = EnvironmentContext::load_from_env().expect("context loads");
        assert!(context.base().is_none());
    }

    #[test]
    fn env_overrides_platform_defaults() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        env::set_var("ICINGA2_CONF_DIR", " /opt/icinga2/etc ");
        env::set_var("ICINGA2_PLATFORM", "Debian");
        env::set_var("ICINGA2_GROUP", "-");
        env::set_var("ICINGA2_CERT_DIR", "/opt/icinga2/certs");

        let context = EnvironmentContext::load_from_env().expect("context loads");
        let base = context.base().expect("base configured");
        assert_eq!(base.platform(), PlatformFamily::Debian);
        assert_eq!(base.conf_dir(), Path::new("/opt/icinga2/etc"));
        assert_eq!(base.cert_dir(), Path::new("/opt/icinga2/certs"));
        assert_eq!(base.user(), Some("nagios"));
        assert_eq!(base.group(), None);

        reset_env();
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        env::set_var("ICINGA2_CONF_DIR", "/etc/icinga2");
        env::set_var("ICINGA2_PLATFORM", "solaris");

        let err = EnvironmentContext::load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlatform { value } if value == "solaris"));

        reset_env();
    }

    #[test]
    fn run_options_prefer_arguments() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        env::set_var("INFLUXDB2_FEATURE_PARAMS", "/etc/from-env.toml");

        let options = RunOptions::from_args(args(&["--noop", "/etc/params.toml"])).unwrap();
        assert!(options.noop());
        assert_eq!(options.params_path(), Path::new("/etc/params.toml"));

        let from_env = RunOptions::from_args(Vec::new()).unwrap();
        assert!(!from_env.noop());
        assert_eq!(from_env.params_path(), Path::new("/etc/from-env.toml"));

        reset_env();
    }

    #[test]
    fn run_options_require_a_parameter_file() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        let err = RunOptions::from_args(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                key: "INFLUXDB2_FEATURE_PARAMS"
            }
        ));

        let err = RunOptions::from_args(args(&["--verbose"])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownArgument { .. }));
    }
}
