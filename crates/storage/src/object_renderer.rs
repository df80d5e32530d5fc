use influxdb2_feature_domain::{
    FileOutcome, FileStore, ManagedFile, ObjectRenderer, ObjectSpec, StoreResult,
};
use tracing::debug;

use crate::{dsl, FsStore};

impl ObjectRenderer for FsStore {
    fn render_object(&self, object: &ObjectSpec) -> StoreResult<FileOutcome> {
        let fragment = dsl::render_object(object);
        let content =
            self.compose_target(&object.target, object.order, &object.object_name, fragment);
        debug!(
            object_type = %object.object_type,
            object_name = %object.object_name,
            target = %object.target.display(),
            order = object.order,
            "rendered object"
        );

        let mut file = ManagedFile::new(&object.target, content)
            .owned_by(object.owner.as_deref(), object.group.as_deref());
        if object.attrs.contains_secret() {
            file = file.hide_diff();
        }
        self.ensure_file(&file)
    }
}
