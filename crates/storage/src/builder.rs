use crate::FsStore;

#[derive(Debug, Default)]
pub struct FsStoreBuilder {
    noop: bool,
}

impl FsStoreBuilder {
    pub fn new() -> Self {
        Self { noop: false }
    }

    pub fn noop(mut self, noop: bool) -> Self {
        self.noop = noop;
        self
    }

    pub fn build(self) -> FsStore {
        FsStore::with_noop(self.noop)
    }
}
