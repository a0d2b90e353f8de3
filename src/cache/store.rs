//! Flat-file snapshot store
//!
//! Snapshots are JSON files under one directory. A file that exists and
//! parses is trusted until it is refreshed or removed; there is no TTL.

use crate::catalog::reference::CatalogReference;
use crate::io::PathUtils;
use crate::validation;
use crate::version;
use crate::{ImagesetError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Deterministic identity of one snapshot file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Operator records of one catalog family at one OCP minor version
    Operators { family: String, version: String },
    /// Catalog family listing for one OCP minor version
    Catalogs { version: String },
    /// Known OCP releases
    Releases,
    /// Release channels keyed by OCP version
    Channels,
    /// Releases keyed by channel
    ChannelReleases,
}

impl CacheKey {
    /// Key for a versioned catalog reference
    pub fn operators(reference: &CatalogReference) -> Result<Self> {
        let version = reference.version().ok_or_else(|| {
            ImagesetError::catalog(
                "Catalog reference has no version tag",
                Some(&reference.to_string()),
                None,
            )
        })?;
        Ok(CacheKey::Operators {
            family: validation::safe_path_component(reference.family())?,
            version,
        })
    }

    pub fn catalogs(ocp_version: &str) -> Result<Self> {
        Ok(CacheKey::Catalogs {
            version: version::major_minor(ocp_version)?,
        })
    }

    pub fn file_name(&self) -> String {
        match self {
            CacheKey::Operators { family, version } => format!("operators-{family}-{version}.json"),
            CacheKey::Catalogs { version } => format!("catalogs-{version}.json"),
            CacheKey::Releases => "ocp-versions.json".to_string(),
            CacheKey::Channels => "ocp-channels.json".to_string(),
            CacheKey::ChannelReleases => "channel-releases.json".to_string(),
        }
    }
}

/// Snapshot store rooted at the data directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.path(key).is_file()
    }

    /// Load a snapshot. Missing, unreadable or corrupt files are a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let path = self.path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss: {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Unreadable cache snapshot {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => {
                debug!("Cache hit: {}", path.display());
                Some(snapshot)
            }
            Err(e) => {
                warn!(
                    "Corrupt cache snapshot {}, treating as miss: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Write a snapshot via temp file and rename, so readers never see a
    /// partial file.
    pub fn put<T: Serialize>(&self, key: &CacheKey, snapshot: &T) -> Result<PathBuf> {
        let path = self.path(key);
        if !PathUtils::is_safe_path(Path::new(&key.file_name())) {
            return Err(ImagesetError::file_operation(
                "Refusing to write outside the cache directory",
                &path,
                "write",
                None,
            ));
        }

        fs::create_dir_all(&self.root).map_err(|e| {
            ImagesetError::file_operation(
                "Failed to create cache directory",
                &self.root,
                "create_dir",
                Some(e),
            )
        })?;

        let content = serde_json::to_string_pretty(snapshot)?;
        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| {
            ImagesetError::file_operation("Failed to create temp file", &self.root, "write", Some(e))
        })?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| {
                ImagesetError::file_operation("Failed to write snapshot", &path, "write", Some(e))
            })?;
        temp.persist(&path).map_err(|e| {
            ImagesetError::file_operation("Failed to move snapshot into place", &path, "rename", Some(e.error))
        })?;

        info!("Wrote cache snapshot {}", path.display());
        Ok(path)
    }

    /// Delete a snapshot; returns whether one existed
    pub fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImagesetError::file_operation(
                "Failed to remove snapshot",
                &path,
                "remove",
                Some(e),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::snapshot::{Provenance, ReleaseSnapshot};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_operator_key_uses_final_segment_and_minor_version() {
        let reference =
            CatalogReference::parse("registry.redhat.io/redhat/redhat-operator-index:v4.16").unwrap();
        let key = CacheKey::operators(&reference).unwrap();
        assert_eq!(key.file_name(), "operators-redhat-operator-index-4.16.json");

        let bare = CatalogReference::parse("registry.redhat.io/redhat/redhat-operator-index").unwrap();
        assert!(CacheKey::operators(&bare).is_err());
    }

    #[test]
    fn test_fixed_file_names() {
        assert_eq!(CacheKey::Releases.file_name(), "ocp-versions.json");
        assert_eq!(CacheKey::Channels.file_name(), "ocp-channels.json");
        assert_eq!(CacheKey::ChannelReleases.file_name(), "channel-releases.json");
        assert_eq!(CacheKey::catalogs("4.18.2").unwrap().file_name(), "catalogs-4.18.json");
    }

    #[test]
    fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("data"));
        let snapshot = ReleaseSnapshot::new(vec!["4.18".to_string()], Provenance::ExternalTool);

        assert!(store.get::<ReleaseSnapshot>(&CacheKey::Releases).is_none());
        let path = store.put(&CacheKey::Releases, &snapshot).unwrap();
        assert!(path.ends_with("ocp-versions.json"));

        let loaded: ReleaseSnapshot = store.get(&CacheKey::Releases).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_corrupt_snapshot_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        fs::write(store.path(&CacheKey::Releases), "{\"releases\": [\"4.1").unwrap();

        assert!(store.contains(&CacheKey::Releases));
        assert!(store.get::<ReleaseSnapshot>(&CacheKey::Releases).is_none());
    }

    #[test]
    fn test_wrong_shape_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        fs::write(store.path(&CacheKey::Releases), "{\"operators\": []}").unwrap();
        assert!(store.get::<ReleaseSnapshot>(&CacheKey::Releases).is_none());
    }

    #[test]
    fn test_put_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        let snapshot = ReleaseSnapshot::new(vec![], Provenance::Static);
        store.put(&CacheKey::Releases, &snapshot).unwrap();
        store.put(&CacheKey::Releases, &snapshot).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ocp-versions.json".to_string()]);
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path());
        let snapshot = ReleaseSnapshot::new(vec![], Provenance::Static);
        store.put(&CacheKey::Releases, &snapshot).unwrap();

        assert!(store.remove(&CacheKey::Releases).unwrap());
        assert!(!store.remove(&CacheKey::Releases).unwrap());
    }
}
