//! Shared service helpers such as content fingerprints and telemetry wiring.

pub mod fingerprint;
pub mod telemetry;

pub use fingerprint::*;
pub use telemetry::*;
