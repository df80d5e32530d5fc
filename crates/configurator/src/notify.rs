use std::sync::{Mutex, PoisonError};

use influxdb2_feature_domain::ServiceNotifier;
use tracing::info;

/// Collects reload requests so the caller can act on them after the run.
#[derive(Debug, Default)]
pub struct PendingReload {
    reasons: Mutex<Vec<String>>,
}

impl PendingReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.reasons.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ServiceNotifier for PendingReload {
    fn request_reload(&self, reason: &str) {
        info!(reason, "icinga2 reload requested");
        self.lock().push(reason.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_every_request() {
        let pending = PendingReload::new();
        assert!(!pending.is_requested());

        pending.request_reload("influxdb2 feature changed");
        pending.request_reload("again");
        assert!(pending.is_requested());
        assert_eq!(pending.reasons(), ["influxdb2 feature changed", "again"]);
    }
}
