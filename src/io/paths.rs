use crate::{ImagesetError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Settings file name looked up in the config directory
pub const SETTINGS_FILE: &str = "imageset.yaml";

/// Path management for generator configuration and cache files
#[derive(Debug, Clone)]
pub struct ImagesetPaths {
    /// Configuration directory
    pub config_dir: PathBuf,
}

impl ImagesetPaths {
    /// Create new paths instance using standard directories
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "imageset-generator").ok_or_else(|| {
            ImagesetError::configuration(
                "Failed to determine project directories",
                None,
                None,
            )
        })?;

        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
        })
    }

    /// Default settings file location
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

/// Utilities for working with paths
pub struct PathUtils;

impl PathUtils {
    /// Check if path is safe (no traversal attacks)
    pub fn is_safe_path(path: &Path) -> bool {
        !path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
    }
}
