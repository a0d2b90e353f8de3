use super::types::Settings;
use crate::io::ImagesetPaths;
use crate::{ImagesetError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding `data_dir`
pub const ENV_DATA_DIR: &str = "IMAGESET_DATA_DIR";

/// Environment variable overriding `tls_verify`
pub const ENV_TLS_VERIFY: &str = "IMAGESET_TLS_VERIFY";

/// Loads generator settings from YAML with environment overrides
pub struct SettingsLoader {
    /// Explicit settings file; must exist when given
    explicit: Option<PathBuf>,
    /// Discovered settings file; optional
    discovered: Option<PathBuf>,
    /// Apply environment overrides
    use_env: bool,
}

impl SettingsLoader {
    /// Create a loader that discovers the settings file in the platform config dir
    pub fn new() -> Self {
        Self {
            explicit: None,
            discovered: ImagesetPaths::new().ok().map(|p| p.settings_file()),
            use_env: true,
        }
    }

    /// Load from a specific file instead of discovering one
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Skip environment overrides
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn load(&self) -> Result<Settings> {
        let mut settings = match (&self.explicit, &self.discovered) {
            (Some(path), _) => Self::load_file(path)?,
            (None, Some(path)) if path.exists() => Self::load_file(path)?,
            _ => {
                debug!("No settings file found, using defaults");
                Settings::default()
            }
        };

        if self.use_env {
            Self::apply_env(&mut settings, |key| std::env::var(key).ok())?;
        }

        Ok(settings)
    }

    fn load_file(path: &Path) -> Result<Settings> {
        info!("Loading settings from: {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ImagesetError::file_operation("Failed to read settings file", path, "read", Some(e))
        })?;

        serde_yaml_ng::from_str(&contents).map_err(|e| {
            ImagesetError::configuration(
                format!("Failed to parse settings file {}: {}", path.display(), e),
                None,
                None,
            )
        })
    }

    fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            debug!("{} overrides data_dir: {}", ENV_DATA_DIR, dir);
            settings.data_dir = PathBuf::from(dir);
        }

        if let Some(value) = lookup(ENV_TLS_VERIFY) {
            settings.tls_verify = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ImagesetError::configuration(
                        "Expected a boolean",
                        Some(ENV_TLS_VERIFY),
                        Some(&value),
                    ))
                }
            };
        }

        Ok(())
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("imageset.yaml");
        std::fs::write(&path, "data_dir: /var/cache/imageset\ntls_verify: false\n").unwrap();

        let settings = SettingsLoader::new()
            .with_file(&path)
            .without_env()
            .load()
            .unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/var/cache/imageset"));
        assert!(!settings.tls_verify);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = SettingsLoader::new()
            .with_file(dir.path().join("absent.yaml"))
            .without_env()
            .load();
        assert!(matches!(result, Err(ImagesetError::FileOperation { .. })));
    }

    #[test]
    fn test_malformed_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("imageset.yaml");
        std::fs::write(&path, "timeouts: [not, a, map]\n").unwrap();

        let result = SettingsLoader::new().with_file(&path).without_env().load();
        assert!(matches!(result, Err(ImagesetError::Configuration { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENV_DATA_DIR, "/tmp/snapshots"), (ENV_TLS_VERIFY, "false")]
            .into_iter()
            .collect();
        let mut settings = Settings::default();
        SettingsLoader::apply_env(&mut settings, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("/tmp/snapshots"));
        assert!(!settings.tls_verify);
    }

    #[test]
    fn test_env_rejects_non_boolean_tls_flag() {
        let mut settings = Settings::default();
        let result = SettingsLoader::apply_env(&mut settings, |k| {
            (k == ENV_TLS_VERIFY).then(|| "maybe".to_string())
        });
        assert!(result.is_err());
        assert!(settings.tls_verify);
    }
}
