//! Filesystem-backed adapters that satisfy the domain collaborator traits:
//! managed files, Icinga 2 object files and the feature include link.

mod builder;
mod dsl;
mod feature_toggle;
mod file_store;
mod object_renderer;
mod ownership;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

pub use builder::FsStoreBuilder;

pub use dsl::{render_object, MANAGED_HEADER};

/// Rendered object fragments per target file, keyed by `(order, name)`.
type FragmentRegistry = BTreeMap<PathBuf, BTreeMap<(u32, String), String>>;

/// Shared store handle. Clones share the fragment registry, so objects that
/// land in the same target file are concatenated in order.
#[derive(Clone, Default)]
pub struct FsStore {
    noop: bool,
    fragments: Arc<Mutex<FragmentRegistry>>,
}

impl FsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FsStoreBuilder {
        FsStoreBuilder::new()
    }

    pub(crate) fn with_noop(noop: bool) -> Self {
        Self {
            noop,
            ..Self::default()
        }
    }

    /// In noop mode every operation reports what it would do and touches
    /// nothing.
    pub fn is_noop(&self) -> bool {
        self.noop
    }

    /// Records `fragment` for `target` and returns the full file content.
    pub(crate) fn compose_target(
        &self,
        target: &Path,
        order: u32,
        name: &str,
        fragment: String,
    ) -> String {
        let mut registry = self
            .fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let fragments = registry.entry(target.to_path_buf()).or_default();
        fragments.insert((order, name.to_owned()), fragment);

        let mut content = String::from(MANAGED_HEADER);
        for fragment in fragments.values() {
            content.push('\n');
            content.push_str(fragment);
        }
        content
    }
}
