//! Platform families and the per-family capability table.
//!
//! Platform-dependent behaviour (line-ending rewrite of TLS assets, the mode
//! of the private key, default service identity and directories) is looked up
//! here instead of being branched on at each call site. Supporting another
//! family means adding a variant and a table row.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Mode applied to the private key on families that support POSIX modes.
pub const PRIVATE_KEY_MODE: u32 = 0o600;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlatformFamily {
    Debian,
    RedHat,
    Suse,
    FreeBsd,
    Windows,
}

/// What a platform family needs from the configurator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// Rewrite bare `\n` to `\r\n` in written TLS assets.
    pub crlf_line_endings: bool,
    /// Mode for the private key file, if the family supports one.
    pub private_key_mode: Option<u32>,
    pub default_user: Option<&'static str>,
    pub default_group: Option<&'static str>,
    pub conf_dir: &'static str,
    pub cert_dir: &'static str,
}

const LINUX_CONF_DIR: &str = "/etc/icinga2";
const UNIX_CERT_DIR: &str = "/var/lib/icinga2/certs";

/// Indexed by `PlatformFamily as usize`; keep in declaration order.
static CAPABILITIES: [PlatformCapabilities; 5] = [
    // Debian
    PlatformCapabilities {
        crlf_line_endings: false,
        private_key_mode: Some(PRIVATE_KEY_MODE),
        default_user: Some("nagios"),
        default_group: Some("nagios"),
        conf_dir: LINUX_CONF_DIR,
        cert_dir: UNIX_CERT_DIR,
    },
    // RedHat
    PlatformCapabilities {
        crlf_line_endings: false,
        private_key_mode: Some(PRIVATE_KEY_MODE),
        default_user: Some("icinga"),
        default_group: Some("icinga"),
        conf_dir: LINUX_CONF_DIR,
        cert_dir: UNIX_CERT_DIR,
    },
    // Suse
    PlatformCapabilities {
        crlf_line_endings: false,
        private_key_mode: Some(PRIVATE_KEY_MODE),
        default_user: Some("icinga"),
        default_group: Some("icinga"),
        conf_dir: LINUX_CONF_DIR,
        cert_dir: UNIX_CERT_DIR,
    },
    // FreeBsd
    PlatformCapabilities {
        crlf_line_endings: false,
        private_key_mode: Some(PRIVATE_KEY_MODE),
        default_user: Some("icinga"),
        default_group: Some("icinga"),
        conf_dir: "/usr/local/etc/icinga2",
        cert_dir: UNIX_CERT_DIR,
    },
    // Windows
    PlatformCapabilities {
        crlf_line_endings: true,
        private_key_mode: None,
        default_user: None,
        default_group: None,
        conf_dir: "C:/ProgramData/icinga2/etc/icinga2",
        cert_dir: "C:/ProgramData/icinga2/var/lib/icinga2/certs",
    },
];

impl PlatformFamily {
    pub const ALL: [PlatformFamily; 5] = [
        Self::Debian,
        Self::RedHat,
        Self::Suse,
        Self::FreeBsd,
        Self::Windows,
    ];

    pub fn capabilities(self) -> &'static PlatformCapabilities {
        &CAPABILITIES[self as usize]
    }

    /// Best-effort guess of the family this process runs on.
    pub fn detect() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(windows)] {
                Self::Windows
            } else if #[cfg(target_os = "freebsd")] {
                Self::FreeBsd
            } else {
                if std::path::Path::new("/etc/debian_version").exists() {
                    Self::Debian
                } else if std::path::Path::new("/etc/SUSE-brand").exists() {
                    Self::Suse
                } else {
                    Self::RedHat
                }
            }
        }
    }
}

impl PlatformCapabilities {
    /// Applies the family's line-ending convention to asset content.
    pub fn normalize_line_endings(&self, content: &[u8]) -> Vec<u8> {
        if self.crlf_line_endings {
            crlf_line_endings(content)
        } else {
            content.to_vec()
        }
    }
}

/// Replaces every `\n` not already preceded by `\r` with `\r\n`.
pub fn crlf_line_endings(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + content.len() / 32);
    let mut previous = None;
    for &byte in content {
        if byte == b'\n' && previous != Some(b'\r') {
            out.push(b'\r');
        }
        out.push(byte);
        previous = Some(byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_line_up_with_variants() {
        assert_eq!(PlatformFamily::ALL.len(), CAPABILITIES.len());
        assert_eq!(
            PlatformFamily::Debian.capabilities().default_user,
            Some("nagios")
        );
        assert_eq!(
            PlatformFamily::FreeBsd.capabilities().conf_dir,
            "/usr/local/etc/icinga2"
        );
        assert!(PlatformFamily::Windows.capabilities().crlf_line_endings);
    }

    #[test]
    fn only_windows_skips_the_key_mode() {
        for family in PlatformFamily::ALL {
            let caps = family.capabilities();
            if family == PlatformFamily::Windows {
                assert_eq!(caps.private_key_mode, None);
            } else {
                assert_eq!(caps.private_key_mode, Some(PRIVATE_KEY_MODE));
                assert!(!caps.crlf_line_endings);
            }
        }
    }

    #[test]
    fn family_names_parse_case_insensitively() {
        assert_eq!("windows".parse::<PlatformFamily>(), Ok(PlatformFamily::Windows));
        assert_eq!("RedHat".parse::<PlatformFamily>(), Ok(PlatformFamily::RedHat));
        assert_eq!("freebsd".parse::<PlatformFamily>(), Ok(PlatformFamily::FreeBsd));
        assert!("plan9".parse::<PlatformFamily>().is_err());
        assert_eq!(PlatformFamily::Suse.to_string(), "suse");
    }

    #[test]
    fn crlf_rewrite_only_touches_bare_line_feeds() {
        assert_eq!(crlf_line_endings(b"a\nb\n"), b"a\r\nb\r\n");
        assert_eq!(crlf_line_endings(b"a\r\nb"), b"a\r\nb");
        assert_eq!(crlf_line_endings(b"\n\n"), b"\r\n\r\n");
        assert_eq!(crlf_line_endings(b""), b"");
    }

    #[test]
    fn non_windows_content_is_verbatim() {
        let content = b"-----BEGIN KEY-----\nabc\n-----END KEY-----\n";
        let linux = PlatformFamily::Debian.capabilities();
        assert_eq!(linux.normalize_line_endings(content), content.to_vec());
        let windows = PlatformFamily::Windows.capabilities();
        assert_eq!(
            windows.normalize_line_endings(content),
            b"-----BEGIN KEY-----\r\nabc\r\n-----END KEY-----\r\n".to_vec()
        );
    }
}
