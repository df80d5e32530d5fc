use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::Path,
};

use influxdb2_feature_domain::{
    services::content_fingerprint, FileOutcome, FileStatus, FileStore, ManagedFile, StoreError,
    StoreResult,
};
use tracing::{debug, info, warn};

use crate::{ownership, FsStore};

impl FileStore for FsStore {
    fn ensure_file(&self, file: &ManagedFile) -> StoreResult<FileOutcome> {
        let path = file.path.as_path();
        let fingerprint = content_fingerprint(&file.content);
        let identity = ownership::resolve(file.owner.as_deref(), file.group.as_deref())?;

        let current = read_existing(path)?;
        let content_changed = current
            .as_deref()
            .map_or(true, |bytes| content_fingerprint(bytes) != fingerprint);
        let status = match current {
            None => FileStatus::Created,
            Some(_) if content_changed => FileStatus::Updated,
            Some(_) if ownership::drifted(path, identity, file.mode)? => FileStatus::Updated,
            Some(_) => FileStatus::Unchanged,
        };

        if !status.is_change() {
            debug!(path = %path.display(), "managed file up to date");
        } else if self.is_noop() {
            warn!(path = %path.display(), status = status.as_ref(), "noop: would write managed file");
        } else {
            if content_changed {
                write_content(path, &file.content, file.mode)
                    .map_err(|err| StoreError::io(path, err))?;
            }
            ownership::apply(path, identity, file.mode)?;
            info!(
                path = %path.display(),
                status = status.as_ref(),
                diff_hidden = !file.show_diff,
                "managed file written"
            );
        }

        let content = (status.is_change() && file.show_diff)
            .then(|| String::from_utf8_lossy(&file.content).into_owned());
        Ok(FileOutcome {
            path: path.to_path_buf(),
            status,
            fingerprint: Some(fingerprint),
            content,
        })
    }

    fn ensure_absent(&self, path: &Path) -> StoreResult<FileOutcome> {
        let status = match fs::symlink_metadata(path) {
            Ok(_) if self.is_noop() => {
                warn!(path = %path.display(), "noop: would remove managed file");
                FileStatus::Removed
            }
            Ok(_) => {
                fs::remove_file(path).map_err(|err| StoreError::io(path, err))?;
                info!(path = %path.display(), "managed file removed");
                FileStatus::Removed
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => FileStatus::Absent,
            Err(err) => return Err(StoreError::io(path, err)),
        };

        Ok(FileOutcome {
            path: path.to_path_buf(),
            status,
            fingerprint: None,
            content: None,
        })
    }
}

fn read_existing(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StoreError::io(path, err)),
    }
}

/// Writes in place. A newly created file gets `mode` from the start so a
/// private key is never readable by others, not even briefly.
fn write_content(path: &Path, content: &[u8], mode: Option<u32>) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut handle = options.open(path)?;
    handle.write_all(content)?;
    handle.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FsStore {
        FsStore::new()
    }

    #[test]
    fn creates_then_reports_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.conf");
        let file = ManagedFile::new(&path, "hello\n");

        let first = store().ensure_file(&file).unwrap();
        assert_eq!(first.status, FileStatus::Created);
        assert_eq!(first.content.as_deref(), Some("hello\n"));
        assert_eq!(fs::read(&path).unwrap(), b"hello\n");

        let second = store().ensure_file(&file).unwrap();
        assert_eq!(second.status, FileStatus::Unchanged);
        assert_eq!(second.content, None);
        assert_eq!(second.fingerprint, first.fingerprint);
    }

    #[test]
    fn changed_content_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.conf");
        fs::write(&path, "old contents that are longer\n").unwrap();

        let outcome = store()
            .ensure_file(&ManagedFile::new(&path, "new\n"))
            .unwrap();
        assert_eq!(outcome.status, FileStatus::Updated);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn hidden_diff_never_reports_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = ManagedFile::new(dir.path().join("key"), "PRIVATE").hide_diff();

        let outcome = store().ensure_file(&file).unwrap();
        assert!(outcome.is_change());
        assert_eq!(outcome.content, None);
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("a.conf");

        let err = store()
            .ensure_file(&ManagedFile::new(&path, "x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { path: failed, .. } if failed == path));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn noop_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.conf");
        let noop = FsStore::builder().noop(true).build();

        let outcome = noop.ensure_file(&ManagedFile::new(&path, "x")).unwrap();
        assert_eq!(outcome.status, FileStatus::Created);
        assert!(!path.exists());

        fs::write(&path, "x").unwrap();
        let removal = noop.ensure_absent(&path).unwrap();
        assert_eq!(removal.status, FileStatus::Removed);
        assert!(path.exists());
    }

    #[test]
    fn absent_files_are_removed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.conf");
        fs::write(&path, "x").unwrap();

        assert_eq!(store().ensure_absent(&path).unwrap().status, FileStatus::Removed);
        assert!(!path.exists());
        assert_eq!(store().ensure_absent(&path).unwrap().status, FileStatus::Absent);
    }

    #[cfg(unix)]
    #[test]
    fn mode_is_applied_and_enforced() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key");
        let file = ManagedFile::new(&path, "k").with_mode(Some(0o600));

        store().ensure_file(&file).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        let outcome = store().ensure_file(&file).unwrap();
        assert_eq!(outcome.status, FileStatus::Updated);
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o7777;
        assert_eq!(mode, 0o600);
    }
}
