//! Reproducible archive output
//!
//! Every archive produced by the build uses the same determinism policy:
//! entry timestamps are replaced with a fixed value and entries are written
//! in a stable order. [`ArchiveManifest`] applies the policy to a directory
//! of packaging inputs and condenses it into one digest, so two machines can
//! confirm they would produce byte-identical archives.

use apkpolicy_core::error::{Error, ErrorCode, Result, ResultExt};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Timestamp written for every entry when timestamps are not preserved
///
/// 1980-01-01T00:00:00Z is the earliest instant a ZIP entry can encode.
#[must_use]
pub fn zip_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Timestamp and ordering rules for archive tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDeterminismPolicy {
    /// Keep file modification times in archive entries
    pub preserve_timestamps: bool,
    /// Write entries in a deterministic order
    pub reproducible_file_order: bool,
}

impl ArchiveDeterminismPolicy {
    /// The policy applied to every archive, regardless of build type
    #[must_use]
    pub const fn reproducible() -> Self {
        Self {
            preserve_timestamps: false,
            reproducible_file_order: true,
        }
    }

    /// Apply the policy to archive entries in place
    pub fn apply(&self, entries: &mut [ArchiveEntry]) {
        if !self.preserve_timestamps {
            let epoch = zip_epoch();
            for entry in entries.iter_mut() {
                entry.modified = epoch;
            }
        }
        if self.reproducible_file_order {
            entries.sort_by(|a, b| a.path.cmp(&b.path));
        }
    }
}

impl Default for ArchiveDeterminismPolicy {
    fn default() -> Self {
        Self::reproducible()
    }
}

/// One file destined for an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Path inside the archive, `/`-separated
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Hex SHA-256 of the contents
    pub sha256: String,
    /// Entry modification time
    pub modified: DateTime<Utc>,
}

/// Archive entries for a directory with a combined digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Directory the entries were collected from
    pub root: PathBuf,
    /// Policy that was applied
    pub policy: ArchiveDeterminismPolicy,
    /// Entries in archive order
    pub entries: Vec<ArchiveEntry>,
    /// Hex SHA-256 over every entry's path, size, content hash, and time
    pub digest: String,
}

impl ArchiveManifest {
    /// Collect the regular files below `root` and apply `policy`
    ///
    /// Symbolic links are followed and recorded under the link's own path
    /// with the target's content, the way archive tasks copy them.
    pub fn collect(root: &Path, policy: ArchiveDeterminismPolicy) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::new(
                ErrorCode::DirectoryNotFound,
                format!("Not a directory: {}", root.display()),
            ));
        }

        let mut entries = Vec::new();
        for item in WalkDir::new(root).follow_links(true) {
            let item = item.map_err(|e| {
                Error::io(format!("Failed to walk {}: {e}", root.display()))
            })?;
            if !item.file_type().is_file() {
                continue;
            }
            entries.push(read_entry(root, item.path())?);
        }

        policy.apply(&mut entries);
        let digest = manifest_digest(&entries);

        tracing::info!(
            root = %root.display(),
            entries = entries.len(),
            digest = %digest,
            "Collected archive manifest"
        );

        Ok(Self {
            root: root.to_path_buf(),
            policy,
            entries,
            digest,
        })
    }

    /// Total size of all entries
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Paths whose entries differ between two manifests, including paths
    /// present in only one of them
    #[must_use]
    pub fn differences(&self, other: &ArchiveManifest) -> Vec<String> {
        use std::collections::BTreeMap;

        let ours: BTreeMap<&str, &ArchiveEntry> =
            self.entries.iter().map(|e| (e.path.as_str(), e)).collect();
        let theirs: BTreeMap<&str, &ArchiveEntry> =
            other.entries.iter().map(|e| (e.path.as_str(), e)).collect();

        let mut paths: Vec<&str> = ours.keys().chain(theirs.keys()).copied().collect();
        paths.sort_unstable();
        paths.dedup();

        paths
            .into_iter()
            .filter(|path| ours.get(path) != theirs.get(path))
            .map(String::from)
            .collect()
    }
}

fn read_entry(root: &Path, path: &Path) -> Result<ArchiveEntry> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let archive_path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let metadata = std::fs::metadata(path)
        .map_err(Error::from)
        .context(format!("Reading metadata of {}", path.display()))?;
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| zip_epoch());

    let mut file = std::fs::File::open(path)
        .map_err(Error::from)
        .context(format!("Opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(ArchiveEntry {
        path: archive_path,
        size: metadata.len(),
        sha256: hex::encode(hasher.finalize()),
        modified,
    })
}

fn manifest_digest(entries: &[ArchiveEntry]) -> String {
    let mut hasher = Sha256::new();
    for entry in entries {
        hasher.update(entry.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(entry.size.to_be_bytes());
        hasher.update(entry.sha256.as_bytes());
        hasher.update(entry.modified.timestamp().to_be_bytes());
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}
