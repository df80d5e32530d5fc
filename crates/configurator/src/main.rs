//! Applies the InfluxDB v2 writer feature described by a TOML parameter file
//! and prints the apply report as JSON.

use std::{env, io};

use influxdb2_feature::{apply_feature, load_params, ApplyError, PendingReload};
use influxdb2_feature_domain::services::telemetry::{init_telemetry, TelemetryConfig};
use influxdb2_feature_domain::{EnvironmentContext, RunOptions};
use influxdb2_feature_storage::FsStore;

fn main() -> io::Result<()> {
    if let Err(err) = bootstrap() {
        eprintln!("[influxdb2-feature] apply failed: {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}

fn bootstrap() -> Result<(), ApplyError> {
    let options = RunOptions::from_args(env::args().skip(1))?;
    let telemetry_config = TelemetryConfig::from_env("INFLUXDB2_FEATURE");
    init_telemetry(&telemetry_config)?;
    let context = EnvironmentContext::load_from_env()?;
    let config = load_params(options.params_path())?;
    let store = FsStore::builder().noop(options.noop()).build();
    let notifier = PendingReload::new();
    let report = apply_feature(&context, &config, &store, &notifier)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    for reason in notifier.reasons() {
        eprintln!("[influxdb2-feature] icinga2 reload pending: {reason}");
    }
    Ok(())
}
