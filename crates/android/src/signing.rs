//! Signing identities
//!
//! Resolution of an identity never touches the disk. Whether a keystore can
//! actually be read is checked separately by [`SigningIdentity::verify`],
//! which runs at signing time.

use crate::credentials::{CompleteCredentials, Secret};
use apkpolicy_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Key alias Android tooling generates in the debug keystore
pub const DEBUG_KEY_ALIAS: &str = "androiddebugkey";

/// Enabled APK signature scheme versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSchemes {
    /// JAR signing
    pub v1: bool,
    /// Whole-APK signature block
    pub v2: bool,
    /// Key rotation support
    pub v3: bool,
    /// Streaming (incremental install) signatures
    pub v4: bool,
}

impl SignatureSchemes {
    /// Schemes used for release artifacts: v1 and v2 only
    #[must_use]
    pub const fn release() -> Self {
        Self {
            v1: true,
            v2: true,
            v3: false,
            v4: false,
        }
    }

    /// Enabled versions as numbers, ascending
    #[must_use]
    pub fn enabled(&self) -> Vec<u8> {
        [(1, self.v1), (2, self.v2), (3, self.v3), (4, self.v4)]
            .into_iter()
            .filter_map(|(version, on)| on.then_some(version))
            .collect()
    }

    /// Disabled versions as numbers, ascending
    #[must_use]
    pub fn disabled(&self) -> Vec<u8> {
        [(1, self.v1), (2, self.v2), (3, self.v3), (4, self.v4)]
            .into_iter()
            .filter_map(|(version, on)| (!on).then_some(version))
            .collect()
    }
}

/// Where a release key lives and how to unlock it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreReference {
    path: PathBuf,
    store_password: Secret,
    key_alias: String,
    key_password: Secret,
}

impl KeystoreReference {
    /// Build a reference from complete credentials
    ///
    /// `~` is expanded and relative paths are resolved against `base_dir`,
    /// the directory of the app module.
    #[must_use]
    pub fn from_credentials(credentials: &CompleteCredentials<'_>, base_dir: &Path) -> Self {
        let expanded = PathBuf::from(shellexpand::tilde(credentials.keystore_path).into_owned());
        let path = if expanded.is_absolute() {
            expanded
        } else {
            base_dir.join(expanded)
        };

        Self {
            path,
            store_password: credentials.store_password.clone(),
            key_alias: credentials.key_alias.to_string(),
            key_password: credentials.key_password.clone(),
        }
    }

    /// Resolved keystore file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Alias of the signing key
    #[must_use]
    pub fn key_alias(&self) -> &str {
        &self.key_alias
    }

    /// Keystore password
    #[must_use]
    pub fn store_password(&self) -> &Secret {
        &self.store_password
    }

    /// Key password
    #[must_use]
    pub fn key_password(&self) -> &Secret {
        &self.key_password
    }
}

/// Identity backed by the project's release keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    /// Keystore and key
    pub keystore: KeystoreReference,
    /// Signature schemes to produce
    pub schemes: SignatureSchemes,
}

/// Identity backed by the host's debug keystore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugIdentity {
    /// Debug keystore file
    pub keystore: PathBuf,
    /// Debug key alias
    pub key_alias: String,
}

impl DebugIdentity {
    /// Debug identity stored at `keystore`
    pub fn new(keystore: impl Into<PathBuf>) -> Self {
        Self {
            keystore: keystore.into(),
            key_alias: DEBUG_KEY_ALIAS.to_string(),
        }
    }
}

/// The identity a build is signed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningIdentity {
    /// Release keystore from complete credentials
    Release(ReleaseIdentity),
    /// Debug keystore fallback
    Debug(DebugIdentity),
}

impl SigningIdentity {
    /// True for the release identity
    #[must_use]
    pub fn is_release(&self) -> bool {
        matches!(self, SigningIdentity::Release(_))
    }

    /// Keystore file backing the identity
    #[must_use]
    pub fn keystore_path(&self) -> &Path {
        match self {
            SigningIdentity::Release(release) => release.keystore.path(),
            SigningIdentity::Debug(debug) => &debug.keystore,
        }
    }

    /// Alias of the signing key
    #[must_use]
    pub fn key_alias(&self) -> &str {
        match self {
            SigningIdentity::Release(release) => release.keystore.key_alias(),
            SigningIdentity::Debug(debug) => &debug.key_alias,
        }
    }

    /// Check that the keystore can be opened for signing
    ///
    /// A release keystore that is missing, unreadable, or not a regular file
    /// is a malformed credential path. A missing debug keystore means the
    /// fallback identity is not available on this host.
    pub fn verify(&self) -> Result<()> {
        let path = self.keystore_path();
        let readable = path.is_file() && File::open(path).is_ok();
        if readable {
            tracing::debug!(path = %path.display(), "Keystore is readable");
            return Ok(());
        }

        tracing::error!(path = %path.display(), release = self.is_release(), "Keystore is not readable");
        Err(match self {
            SigningIdentity::Release(_) => Error::malformed_credential_path(path),
            SigningIdentity::Debug(_) => Error::debug_keystore_missing(path),
        })
    }

    /// Serializable description without secrets
    #[must_use]
    pub fn summary(&self, config_name: &str) -> SigningSummary {
        let (kind, schemes) = match self {
            SigningIdentity::Release(release) => (IdentityKind::Release, Some(release.schemes)),
            SigningIdentity::Debug(_) => (IdentityKind::Debug, None),
        };

        SigningSummary {
            config_name: config_name.to_string(),
            kind,
            keystore: self.keystore_path().to_path_buf(),
            key_alias: self.key_alias().to_string(),
            schemes,
        }
    }
}

/// Which kind of identity was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    #[allow(missing_docs)]
    Release,
    #[allow(missing_docs)]
    Debug,
}

/// Secret-free signing description for plans and reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSummary {
    /// Registry name of the signing config
    pub config_name: String,
    /// Release or debug
    pub kind: IdentityKind,
    /// Keystore file
    pub keystore: PathBuf,
    /// Key alias
    pub key_alias: String,
    /// Explicit scheme selection; `None` leaves the host defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemes: Option<SignatureSchemes>,
}
