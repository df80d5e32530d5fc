//! Ownership and permission bits of managed files.

use std::path::Path;

use influxdb2_feature_domain::{StoreError, StoreResult};

/// Numeric owner and group a file should carry; `None` leaves it alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Identity {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use std::{
            ffi::CString,
            fs,
            os::unix::fs::{MetadataExt, PermissionsExt},
        };

        /// Resolves user and group names (or numeric ids) to an [`Identity`].
        pub(crate) fn resolve(owner: Option<&str>, group: Option<&str>) -> StoreResult<Identity> {
            Ok(Identity {
                uid: owner.map(lookup_user).transpose()?,
                gid: group.map(lookup_group).transpose()?,
            })
        }

        /// Starting size of the buffer handed to the reentrant lookups.
        const LOOKUP_BUFFER_LEN: usize = 1024;
        const MAX_LOOKUP_BUFFER_LEN: usize = 1 << 20;

        fn lookup_user(name: &str) -> StoreResult<u32> {
            if let Ok(uid) = name.parse::<u32>() {
                return Ok(uid);
            }
            let unknown = || StoreError::UnknownUser(name.to_owned());
            let c_name = CString::new(name).map_err(|_| unknown())?;
            let mut buf: Vec<libc::c_char> = vec![0; LOOKUP_BUFFER_LEN];
            loop {
                // SAFETY: `passwd` is plain old data; zeroed is a valid value.
                let mut entry: libc::passwd = unsafe { std::mem::zeroed() };
                let mut result: *mut libc::passwd = std::ptr::null_mut();
                // SAFETY: every pointer refers to memory owned by this frame
                // and `buf.len()` is the real buffer size. The record's string
                // fields point into `buf`, which outlives the read below.
                let rc = unsafe {
                    libc::getpwnam_r(
                        c_name.as_ptr(),
                        &mut entry,
                        buf.as_mut_ptr(),
                        buf.len(),
                        &mut result,
                    )
                };
                match rc {
                    0 if result.is_null() => return Err(unknown()),
                    0 => return Ok(entry.pw_uid),
                    libc::ERANGE if buf.len() < MAX_LOOKUP_BUFFER_LEN => {
                        buf.resize(buf.len() * 2, 0)
                    }
                    _ => return Err(unknown()),
                }
            }
        }

        fn lookup_group(name: &str) -> StoreResult<u32> {
            if let Ok(gid) = name.parse::<u32>() {
                return Ok(gid);
            }
            let unknown = || StoreError::UnknownGroup(name.to_owned());
            let c_name = CString::new(name).map_err(|_| unknown())?;
            let mut buf: Vec<libc::c_char> = vec![0; LOOKUP_BUFFER_LEN];
            loop {
                // SAFETY: `group` is plain old data; zeroed is a valid value.
                let mut entry: libc::group = unsafe { std::mem::zeroed() };
                let mut result: *mut libc::group = std::ptr::null_mut();
                // SAFETY: as in `lookup_user`, for the group database.
                let rc = unsafe {
                    libc::getgrnam_r(
                        c_name.as_ptr(),
                        &mut entry,
                        buf.as_mut_ptr(),
                        buf.len(),
                        &mut result,
                    )
                };
                match rc {
                    0 if result.is_null() => return Err(unknown()),
                    0 => return Ok(entry.gr_gid),
                    libc::ERANGE if buf.len() < MAX_LOOKUP_BUFFER_LEN => {
                        buf.resize(buf.len() * 2, 0)
                    }
                    _ => return Err(unknown()),
                }
            }
        }

        /// Whether the file at `path` differs from the wanted owner, group or mode.
        pub(crate) fn drifted(path: &Path, identity: Identity, mode: Option<u32>) -> StoreResult<bool> {
            let metadata = fs::metadata(path).map_err(|err| StoreError::io(path, err))?;
            let uid_drift = identity.uid.is_some_and(|uid| uid != metadata.uid());
            let gid_drift = identity.gid.is_some_and(|gid| gid != metadata.gid());
            let mode_drift =
                mode.is_some_and(|mode| metadata.permissions().mode() & 0o7777 != mode);
            Ok(uid_drift || gid_drift || mode_drift)
        }

        pub(crate) fn apply(path: &Path, identity: Identity, mode: Option<u32>) -> StoreResult<()> {
            if let Some(mode) = mode {
                fs::set_permissions(path, fs::Permissions::from_mode(mode))
                    .map_err(|err| StoreError::io(path, err))?;
            }
            if identity.uid.is_some() || identity.gid.is_some() {
                std::os::unix::fs::chown(path, identity.uid, identity.gid)
                    .map_err(|err| StoreError::io(path, err))?;
            }
            Ok(())
        }
    } else {
        // Owners and POSIX modes are not managed on this host.
        pub(crate) fn resolve(_owner: Option<&str>, _group: Option<&str>) -> StoreResult<Identity> {
            Ok(Identity::default())
        }

        pub(crate) fn drifted(_path: &Path, _identity: Identity, _mode: Option<u32>) -> StoreResult<bool> {
            Ok(false)
        }

        pub(crate) fn apply(_path: &Path, _identity: Identity, _mode: Option<u32>) -> StoreResult<()> {
            Ok(())
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{
        fs,
        os::unix::fs::{MetadataExt, PermissionsExt},
        thread,
    };

    #[test]
    fn numeric_ids_resolve_without_lookup() {
        let identity = resolve(Some("1234"), Some("5678")).unwrap();
        assert_eq!(
            identity,
            Identity {
                uid: Some(1234),
                gid: Some(5678)
            }
        );
        assert_eq!(resolve(None, None).unwrap(), Identity::default());
    }

    #[test]
    fn unknown_names_are_errors() {
        let err = resolve(Some("no-such-user-influxdb2-feature"), None).unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(name) if name == "no-such-user-influxdb2-feature"));

        let err = resolve(None, Some("no-such-group-influxdb2-feature")).unwrap_err();
        assert!(matches!(err, StoreError::UnknownGroup(_)));
    }

    #[test]
    fn mode_drift_is_detected_and_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key");
        fs::write(&path, b"secret").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(drifted(&path, Identity::default(), Some(0o600)).unwrap());
        assert!(!drifted(&path, Identity::default(), None).unwrap());

        apply(&path, Identity::default(), Some(0o600)).unwrap();
        assert!(!drifted(&path, Identity::default(), Some(0o600)).unwrap());
    }

    #[test]
    fn owner_and_group_drift_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key");
        fs::write(&path, b"secret").unwrap();
        let metadata = fs::metadata(&path).unwrap();

        let current = Identity {
            uid: Some(metadata.uid()),
            gid: Some(metadata.gid()),
        };
        assert!(!drifted(&path, current, None).unwrap());

        let foreign_owner = Identity {
            uid: Some(metadata.uid().wrapping_add(1)),
            ..current
        };
        assert!(drifted(&path, foreign_owner, None).unwrap());

        let foreign_group = Identity {
            gid: Some(metadata.gid().wrapping_add(1)),
            ..current
        };
        assert!(drifted(&path, foreign_group, None).unwrap());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn concurrent_name_lookups_agree() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| (0..50).map(|_| resolve(Some("root"), Some("root"))).collect::<Vec<_>>()))
            .collect();
        for handle in handles {
            for identity in handle.join().unwrap() {
                assert_eq!(
                    identity.unwrap(),
                    Identity {
                        uid: Some(0),
                        gid: Some(0)
                    }
                );
            }
        }
    }
}
