//! Parameter model for the InfluxDB v2 writer feature.

mod secret;
mod tls;
mod value;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;

pub use secret::{AuthToken, SecretString, REDACTED};
pub use tls::{TlsAsset, TlsAssetKind, DEFAULT_ASSET_STEM};
pub use value::{
    AbsolutePath, Base64Content, FlushThreshold, Host, Interval, Port, ValidationError,
    MAX_HOSTNAME_LENGTH,
};

/// Name of the feature as seen by the feature toggle.
pub const FEATURE_NAME: &str = "influxdb2";
/// Icinga 2 object type of the rendered writer.
pub const OBJECT_TYPE: &str = "Influxdb2Writer";
/// Icinga 2 object name of the rendered writer.
pub const OBJECT_NAME: &str = "influxdb2";
/// Ordering hint among objects that target the same file.
pub const OBJECT_ORDER: u32 = 10;

pub const DEFAULT_HOST_MEASUREMENT: &str = "$host.check_command$";
pub const DEFAULT_SERVICE_MEASUREMENT: &str = "$service.check_command$";

/// Whether the feature should be loaded by the monitoring daemon.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl Ensure {
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

/// Measurement name plus tag expressions; both are evaluated by the
/// monitoring daemon when data is sent, never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTemplate {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
}

impl TagTemplate {
    pub fn new(measurement: impl Into<String>, tags: BTreeMap<String, String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags,
        }
    }
}

/// Full parameter set of the writer feature.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureConfig {
    #[serde(default)]
    pub ensure: Ensure,
    pub host: Option<Host>,
    pub port: Option<Port>,
    pub organization: String,
    pub bucket: String,
    pub auth_token: AuthToken,
    pub enable_ssl: Option<bool>,
    pub ssl_noverify: Option<bool>,
    pub ssl_key_path: Option<AbsolutePath>,
    pub ssl_cert_path: Option<AbsolutePath>,
    pub ssl_cacert_path: Option<AbsolutePath>,
    pub ssl_key: Option<Base64Content>,
    pub ssl_cert: Option<Base64Content>,
    pub ssl_cacert: Option<Base64Content>,
    #[serde(default = "default_host_measurement")]
    pub host_measurement: String,
    #[serde(default = "default_host_tags")]
    pub host_tags: BTreeMap<String, String>,
    #[serde(default = "default_service_measurement")]
    pub service_measurement: String,
    #[serde(default = "default_service_tags")]
    pub service_tags: BTreeMap<String, String>,
    pub enable_send_thresholds: Option<bool>,
    pub enable_send_metadata: Option<bool>,
    pub flush_interval: Option<Interval>,
    pub flush_threshold: Option<FlushThreshold>,
    pub enable_ha: Option<bool>,
}

fn default_host_measurement() -> String {
    DEFAULT_HOST_MEASUREMENT.to_owned()
}

fn default_service_measurement() -> String {
    DEFAULT_SERVICE_MEASUREMENT.to_owned()
}

fn default_host_tags() -> BTreeMap<String, String> {
    BTreeMap::from([("hostname".to_owned(), "$host.name$".to_owned())])
}

fn default_service_tags() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("hostname".to_owned(), "$host.name$".to_owned()),
        ("service".to_owned(), "$service.name$".to_owned()),
    ])
}

impl FeatureConfig {
    /// Builds a parameter set with the three required values and every other
    /// parameter at its default.
    pub fn new(
        organization: impl Into<String>,
        bucket: impl Into<String>,
        auth_token: AuthToken,
    ) -> Self {
        Self {
            ensure: Ensure::default(),
            host: None,
            port: None,
            organization: organization.into(),
            bucket: bucket.into(),
            auth_token,
            enable_ssl: None,
            ssl_noverify: None,
            ssl_key_path: None,
            ssl_cert_path: None,
            ssl_cacert_path: None,
            ssl_key: None,
            ssl_cert: None,
            ssl_cacert: None,
            host_measurement: default_host_measurement(),
            host_tags: default_host_tags(),
            service_measurement: default_service_measurement(),
            service_tags: default_service_tags(),
            enable_send_thresholds: None,
            enable_send_metadata: None,
            flush_interval: None,
            flush_threshold: None,
            enable_ha: None,
        }
    }

    pub fn ssl_enabled(&self) -> bool {
        self.enable_ssl.unwrap_or(false)
    }

    pub fn host_template(&self) -> TagTemplate {
        TagTemplate::new(self.host_measurement.clone(), self.host_tags.clone())
    }

    pub fn service_template(&self) -> TagTemplate {
        TagTemplate::new(self.service_measurement.clone(), self.service_tags.clone())
    }

    pub fn tls_asset(&self, kind: TlsAssetKind) -> TlsAsset {
        let (content, path) = match kind {
            TlsAssetKind::Key => (&self.ssl_key, &self.ssl_key_path),
            TlsAssetKind::Cert => (&self.ssl_cert, &self.ssl_cert_path),
            TlsAssetKind::CaCert => (&self.ssl_cacert, &self.ssl_cacert_path),
        };
        TlsAsset {
            kind,
            content: content.clone(),
            path: path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
organization = "ICINGA"
bucket = "icinga2"
auth_token = "supersecret"
"#;

    #[test]
    fn minimal_parameters_take_defaults() {
        let config: FeatureConfig = toml::from_str(MINIMAL).expect("minimal parameters bind");
        assert_eq!(config, FeatureConfig::new("ICINGA", "icinga2", AuthToken::plain("supersecret")));
        assert_eq!(config.ensure, Ensure::Present);
        assert_eq!(config.host_measurement, "$host.check_command$");
        assert_eq!(config.service_tags.len(), 2);
        assert!(!config.ssl_enabled());
    }

    #[test]
    fn templates_combine_measurement_and_tags() {
        let config = FeatureConfig::new("org", "bucket", AuthToken::plain("t"));
        let host = config.host_template();
        assert_eq!(host.measurement, "$host.check_command$");
        assert_eq!(host.tags.get("hostname").map(String::as_str), Some("$host.name$"));

        let service = config.service_template();
        assert_eq!(service.measurement, "$service.check_command$");
        assert_eq!(service.tags.get("service").map(String::as_str), Some("$service.name$"));
    }

    #[test]
    fn full_parameter_file_binds() {
        let toml_str = r#"
ensure = "absent"
host = "influx.example.com"
port = 8086
organization = "ICINGA"
bucket = "icinga2"
auth_token = { sensitive = "supersecret" }
enable_ssl = true
ssl_noverify = false
ssl_key = "a2V5"
ssl_cert_path = "/etc/icinga2/certs/influx.crt"
host_tags = { fqdn = "$host.name$", zone = "$host.zone$" }
flush_interval = "10s"
flush_threshold = 1024
enable_ha = true
"#;
        let config: FeatureConfig = toml::from_str(toml_str).expect("full parameters bind");
        assert_eq!(config.ensure, Ensure::Absent);
        assert_eq!(config.port.map(Port::get), Some(8086));
        assert!(config.auth_token.is_wrapped());
        assert_eq!(config.host_tags.len(), 2);
        assert_eq!(config.flush_interval.as_ref().map(Interval::as_str), Some("10s"));

        let key = config.tls_asset(TlsAssetKind::Key);
        assert_eq!(key.content.as_ref().map(Base64Content::decoded), Some(&b"key"[..]));
        assert!(key.path.is_none());
        let cert = config.tls_asset(TlsAssetKind::Cert);
        assert!(!cert.is_inline());
        assert_eq!(
            cert.path.as_ref().map(AbsolutePath::as_str),
            Some("/etc/icinga2/certs/influx.crt")
        );
    }

    #[test]
    fn malformed_values_fail_while_binding() {
        let bad_port = format!("{MINIMAL}port = 99999\n");
        let err = toml::from_str::<FeatureConfig>(&bad_port).unwrap_err();
        assert!(err.to_string().contains("port 99999"), "{err}");

        let bad_path = format!("{MINIMAL}ssl_key_path = \"certs/key.pem\"\n");
        assert!(toml::from_str::<FeatureConfig>(&bad_path).is_err());

        let bad_base64 = format!("{MINIMAL}ssl_cert = \"not base64!\"\n");
        assert!(toml::from_str::<FeatureConfig>(&bad_base64).is_err());

        let unknown = format!("{MINIMAL}enable_tls = true\n");
        assert!(toml::from_str::<FeatureConfig>(&unknown).is_err());
    }

    #[test]
    fn required_parameters_are_enforced() {
        let missing = "organization = \"ICINGA\"\nbucket = \"icinga2\"\n";
        let err = toml::from_str::<FeatureConfig>(missing).unwrap_err();
        assert!(err.to_string().contains("auth_token"), "{err}");
    }
}
