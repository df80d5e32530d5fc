//! The feature configurator: precondition, TLS resolution, attribute
//! assembly and handoff to the collaborators.

use chrono::{DateTime, Utc};
use influxdb2_feature_domain::{
    ConfigError, Ensure, EnvironmentContext, FeatureConfig, FeatureSpec, FeatureToggle,
    FileOutcome, FileStore, ObjectRenderer, ObjectSpec, RenderedAttributes, ServiceNotifier,
    StoreError, FEATURE_NAME, OBJECT_NAME, OBJECT_ORDER, OBJECT_TYPE,
};
use influxdb2_feature_domain::services::telemetry::TelemetryError;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    attributes::assemble,
    params::ParamsError,
    tls::{resolve_tls, ResolvedTls},
};

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("the base icinga2 configuration must be declared before the influxdb2 feature")]
    MissingBase,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("parameter error: {0}")]
    Params(#[from] ParamsError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub feature: &'static str,
    pub ensure: Ensure,
    pub tls: ResolvedTls,
    /// TLS assets first, then the object file, then the feature include.
    pub files: Vec<FileOutcome>,
    pub attributes: RenderedAttributes,
    pub reload_requested: bool,
    pub applied_at: DateTime<Utc>,
}

impl ApplyReport {
    pub fn changed(&self) -> bool {
        self.files.iter().any(FileOutcome::is_change)
    }
}

/// Applies the writer feature. Fails before touching anything when the base
/// system is not configured. A reload is requested only when the feature is
/// enabled and some managed file changed.
pub fn apply_feature<S, N>(
    ctx: &EnvironmentContext,
    config: &FeatureConfig,
    store: &S,
    notifier: &N,
) -> Result<ApplyReport, ApplyError>
where
    S: FileStore + ObjectRenderer + FeatureToggle + ?Sized,
    N: ServiceNotifier + ?Sized,
{
    let base = ctx.base().ok_or(ApplyError::MissingBase)?;

    let (tls, mut files) = if config.ssl_enabled() {
        resolve_tls(config, base, store)?
    } else {
        debug!("ssl disabled, no TLS assets resolved");
        (ResolvedTls::default(), Vec::new())
    };

    let attributes = assemble(config, &tls);
    let feature = FeatureSpec {
        name: FEATURE_NAME.to_owned(),
        ensure: config.ensure,
        conf_dir: base.conf_dir().to_path_buf(),
        owner: base.user().map(str::to_owned),
        group: base.group().map(str::to_owned),
    };
    let object = ObjectSpec {
        object_type: OBJECT_TYPE.to_owned(),
        object_name: OBJECT_NAME.to_owned(),
        attrs: attributes.clone(),
        target: feature.available_path(),
        order: OBJECT_ORDER,
        owner: feature.owner.clone(),
        group: feature.group.clone(),
    };

    files.push(store.render_object(&object)?);
    files.push(store.set_feature(&feature)?);

    let changed = files.iter().any(FileOutcome::is_change);
    let reload_requested = config.ensure.is_present() && changed;
    if reload_requested {
        notifier.request_reload(&format!("{FEATURE_NAME} feature configuration changed"));
    }

    info!(
        feature = FEATURE_NAME,
        ensure = config.ensure.as_ref(),
        platform = %base.platform(),
        files = files.len(),
        changed,
        reload_requested,
        "feature applied"
    );

    Ok(ApplyReport {
        feature: FEATURE_NAME,
        ensure: config.ensure,
        tls,
        files,
        attributes,
        reload_requested,
        applied_at: Utc::now(),
    })
}
