//! Configurator for the Icinga 2 InfluxDB v2 writer feature. Validated
//! parameters go in; TLS assets, the writer object file and the feature
//! include come out through the collaborator traits of the domain crate.

pub mod attributes;
pub mod configurator;
pub mod notify;
pub mod params;
pub mod tls;


pub use configurator::{apply_feature, ApplyError, ApplyReport};
pub use notify::PendingReload;
pub use params::{from_toml_str, load_params, ParamsError};
pub use tls::{resolve_asset, resolve_tls, ResolvedTls};
