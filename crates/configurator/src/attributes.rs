//! Assembly of the writer's attribute mapping.

use std::path::Path;

use influxdb2_feature_domain::{
    AttrValue, AttributeGroup, FeatureConfig, RenderedAttributes, TlsAssetKind,
};

use crate::tls::ResolvedTls;

/// Declaration order of the base group; the renderer lays attributes out in
/// this order.
pub const BASE_KEYS: [&str; 12] = [
    "host",
    "port",
    "organization",
    "bucket",
    "auth_token",
    "host_template",
    "service_template",
    "enable_send_thresholds",
    "enable_send_metadata",
    "flush_interval",
    "flush_threshold",
    "enable_ha",
];

/// Connection, identity, tagging, buffering and HA attributes. The auth
/// token is always secret-wrapped here.
pub fn base_group(config: &FeatureConfig) -> AttributeGroup {
    AttributeGroup::new()
        .with("host", config.host.clone())
        .with("port", config.port)
        .with("organization", Some(config.organization.as_str()))
        .with("bucket", Some(config.bucket.as_str()))
        .with("auth_token", Some(config.auth_token.normalized()))
        .with("host_template", Some(config.host_template()))
        .with("service_template", Some(config.service_template()))
        .with("enable_send_thresholds", config.enable_send_thresholds)
        .with("enable_send_metadata", config.enable_send_metadata)
        .with("flush_interval", config.flush_interval.clone())
        .with("flush_threshold", config.flush_threshold)
        .with("enable_ha", config.enable_ha)
}

/// With SSL off only `ssl_enable` is emitted, carrying the caller's value.
pub fn ssl_group(config: &FeatureConfig, tls: &ResolvedTls) -> AttributeGroup {
    if !config.ssl_enabled() {
        return AttributeGroup::new().with("ssl_enable", config.enable_ssl);
    }

    AttributeGroup::new()
        .with("ssl_enable", Some(true))
        .with("ssl_insecure_noverify", config.ssl_noverify)
        .with(
            TlsAssetKind::CaCert.attribute(),
            tls.path(TlsAssetKind::CaCert).map(path_value),
        )
        .with(
            TlsAssetKind::Cert.attribute(),
            tls.path(TlsAssetKind::Cert).map(path_value),
        )
        .with(
            TlsAssetKind::Key.attribute(),
            tls.path(TlsAssetKind::Key).map(path_value),
        )
}

/// Merges both groups, drops unset values and keeps the full base key order.
pub fn assemble(config: &FeatureConfig, tls: &ResolvedTls) -> RenderedAttributes {
    let base = base_group(config);
    let order = base.keys().map(str::to_owned).collect();
    RenderedAttributes::compact(base.union(ssl_group(config, tls)), order)
}

fn path_value(path: &Path) -> AttrValue {
    AttrValue::String(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use influxdb2_feature_domain::{AuthToken, Host, Interval, Port, SecretString};
    use std::path::PathBuf;

    fn config() -> FeatureConfig {
        FeatureConfig::new("ICINGA", "icinga2", AuthToken::plain("supersecret"))
    }

    #[test]
    fn base_group_follows_the_declaration_order() {
        let keys: Vec<&str> = base_group(&config()).keys().collect();
        assert_eq!(keys, BASE_KEYS);
    }

    #[test]
    fn ssl_off_emits_only_the_flag() {
        let mut config = config();
        let group = ssl_group(&config, &ResolvedTls::default());
        assert_eq!(group.len(), 1);
        assert_eq!(group.get("ssl_enable"), Some(&None));

        config.enable_ssl = Some(false);
        let group = ssl_group(&config, &ResolvedTls::default());
        assert_eq!(group.len(), 1);
        assert_eq!(group.get("ssl_enable"), Some(&Some(AttrValue::Boolean(false))));

        let rendered = assemble(&config, &ResolvedTls::default());
        assert_eq!(rendered.get("ssl_enable"), Some(&AttrValue::Boolean(false)));
    }

    #[test]
    fn ssl_on_carries_the_resolved_paths() {
        let mut config = config();
        config.enable_ssl = Some(true);
        config.ssl_noverify = Some(true);
        let tls = ResolvedTls {
            key: Some(PathBuf::from("/certs/key")),
            cert: None,
            ca_cert: Some(PathBuf::from("/certs/ca.crt")),
        };

        let rendered = assemble(&config, &tls);
        assert_eq!(rendered.get("ssl_enable"), Some(&AttrValue::Boolean(true)));
        assert_eq!(
            rendered.get("ssl_insecure_noverify"),
            Some(&AttrValue::Boolean(true))
        );
        assert_eq!(rendered.get("ssl_key"), Some(&AttrValue::from("/certs/key")));
        assert_eq!(rendered.get("ssl_ca_cert"), Some(&AttrValue::from("/certs/ca.crt")));
        assert!(!rendered.contains_key("ssl_cert"));
    }

    #[test]
    fn ssl_group_names_match_asset_attributes() {
        let mut config = config();
        config.enable_ssl = Some(true);

        let group = ssl_group(&config, &ResolvedTls::default());
        assert_eq!(
            group.keys().collect::<Vec<_>>(),
            [
                "ssl_enable",
                "ssl_insecure_noverify",
                "ssl_ca_cert",
                "ssl_cert",
                "ssl_key",
            ]
        );
        for kind in [TlsAssetKind::CaCert, TlsAssetKind::Cert, TlsAssetKind::Key] {
            assert!(group.keys().any(|key| key == kind.attribute()));
        }
    }

    #[test]
    fn unset_values_are_removed_but_the_order_is_complete() {
        let rendered = assemble(&config(), &ResolvedTls::default());
        for key in ["host", "port", "flush_interval", "flush_threshold", "enable_ha", "ssl_enable"] {
            assert!(!rendered.contains_key(key), "{key} should be absent");
        }
        assert_eq!(rendered.order(), BASE_KEYS);
        assert_eq!(rendered.len(), 5);
    }

    #[test]
    fn auth_token_is_always_wrapped() {
        for token in [AuthToken::plain("supersecret"), AuthToken::secret("supersecret")] {
            let config = FeatureConfig::new("ICINGA", "icinga2", token);
            let rendered = assemble(&config, &ResolvedTls::default());
            assert_eq!(
                rendered.get("auth_token"),
                Some(&AttrValue::Secret(SecretString::new("supersecret")))
            );
        }
    }

    #[test]
    fn populated_values_keep_their_types() {
        let mut config = config();
        config.host = Some(Host::parse("127.0.0.1").unwrap());
        config.port = Some(Port::new(8086));
        config.flush_interval = Some(Interval::parse("10s").unwrap());

        let rendered = assemble(&config, &ResolvedTls::default());
        assert_eq!(rendered.get("host"), Some(&AttrValue::from("127.0.0.1")));
        assert_eq!(rendered.get("port"), Some(&AttrValue::Integer(8086)));
        assert_eq!(
            rendered.get("flush_interval"),
            Some(&AttrValue::Interval("10s".into()))
        );
    }
}
