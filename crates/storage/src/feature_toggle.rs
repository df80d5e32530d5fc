use influxdb2_feature_domain::{
    Ensure, FeatureSpec, FeatureToggle, FileOutcome, FileStore, ManagedFile, StoreResult,
};
use tracing::debug;

use crate::FsStore;

impl FeatureToggle for FsStore {
    /// Enabling writes an include of the available feature file into
    /// `features-enabled/`; disabling removes it.
    fn set_feature(&self, feature: &FeatureSpec) -> StoreResult<FileOutcome> {
        let path = feature.enabled_path();
        debug!(feature = %feature.name, ensure = ?feature.ensure, "toggling feature");
        match feature.ensure {
            Ensure::Present => {
                let include = format!(
                    "include \"../features-available/{}.conf\"\n",
                    feature.name
                );
                let file = ManagedFile::new(path, include)
                    .owned_by(feature.owner.as_deref(), feature.group.as_deref());
                self.ensure_file(&file)
            }
            Ensure::Absent => self.ensure_absent(&path),
        }
    }
}
