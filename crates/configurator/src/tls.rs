//! TLS asset resolution: pass an explicit path through, or write inline
//! content to its resolved path.

use std::path::{Path, PathBuf};

use influxdb2_feature_domain::{
    BaseSystem, FeatureConfig, FileOutcome, FileStore, ManagedFile, StoreResult, TlsAsset,
    TlsAssetKind,
};
use serde::Serialize;
use tracing::debug;

/// Resolved path per asset kind. Unset means the writer gets no such
/// attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedTls {
    pub key: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub ca_cert: Option<PathBuf>,
}

impl ResolvedTls {
    pub fn path(&self, kind: TlsAssetKind) -> Option<&Path> {
        self.slot(kind).as_deref()
    }

    fn slot(&self, kind: TlsAssetKind) -> &Option<PathBuf> {
        match kind {
            TlsAssetKind::Key => &self.key,
            TlsAssetKind::Cert => &self.cert,
            TlsAssetKind::CaCert => &self.ca_cert,
        }
    }

    fn slot_mut(&mut self, kind: TlsAssetKind) -> &mut Option<PathBuf> {
        match kind {
            TlsAssetKind::Key => &mut self.key,
            TlsAssetKind::Cert => &mut self.cert,
            TlsAssetKind::CaCert => &mut self.ca_cert,
        }
    }
}

/// Resolves one asset. Returns the resolved path and, when inline content was
/// written, the file outcome.
pub fn resolve_asset<S>(
    asset: &TlsAsset,
    base: &BaseSystem,
    store: &S,
) -> StoreResult<(Option<PathBuf>, Option<FileOutcome>)>
where
    S: FileStore + ?Sized,
{
    let explicit = asset.path.as_ref().map(|path| path.as_path().to_path_buf());
    let Some(content) = &asset.content else {
        debug!(asset = %asset.kind, path = ?explicit, "no inline content, passing path through");
        return Ok((explicit, None));
    };

    let path = explicit.unwrap_or_else(|| asset.kind.default_path(base.cert_dir()));
    let caps = base.capabilities();
    let mut file = ManagedFile::new(&path, caps.normalize_line_endings(content.decoded()))
        .owned_by(base.user(), base.group());
    if asset.kind.is_private() {
        file = file.with_mode(caps.private_key_mode).hide_diff();
    }
    debug!(asset = %asset.kind, path = %path.display(), "writing inline TLS asset");

    let outcome = store.ensure_file(&file)?;
    Ok((Some(path), Some(outcome)))
}

/// Resolves every asset kind in a fixed order: key, cert, CA cert.
pub fn resolve_tls<S>(
    config: &FeatureConfig,
    base: &BaseSystem,
    store: &S,
) -> StoreResult<(ResolvedTls, Vec<FileOutcome>)>
where
    S: FileStore + ?Sized,
{
    let mut resolved = ResolvedTls::default();
    let mut outcomes = Vec::new();
    for kind in TlsAssetKind::ALL {
        let (path, outcome) = resolve_asset(&config.tls_asset(kind), base, store)?;
        *resolved.slot_mut(kind) = path;
        outcomes.extend(outcome);
    }
    Ok((resolved, outcomes))
}
