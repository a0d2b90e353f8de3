//! Catalog family listings per OCP version

use super::reference::CatalogReference;
use super::runner::{CommandLine, CommandRunner, RunError};
use crate::cache::{CacheKey, CacheStore};
use crate::config::CatalogFamily;
use crate::version;
use crate::{ImagesetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A catalog family tagged for one OCP version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
    pub description: String,
    pub default: bool,
}

/// A catalog entry checked against the mirror tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbedCatalog {
    #[serde(flatten)]
    pub entry: CatalogEntry,
    pub validated: bool,
    pub operators_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `catalogs-<maj.min>.json` content
pub type CatalogListing = BTreeMap<String, Vec<CatalogEntry>>;

pub struct CatalogDirectory {
    runner: Arc<dyn CommandRunner>,
    store: CacheStore,
    tool: String,
    families: Vec<CatalogFamily>,
    catalog_timeout: Duration,
    discovery_timeout: Duration,
}

impl CatalogDirectory {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: CacheStore,
        tool: impl Into<String>,
        families: Vec<CatalogFamily>,
    ) -> Self {
        Self {
            runner,
            store,
            tool: tool.into(),
            families,
            catalog_timeout: Duration::from_secs(120),
            discovery_timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeouts(mut self, catalog: Duration, discovery: Duration) -> Self {
        self.catalog_timeout = catalog;
        self.discovery_timeout = discovery;
        self
    }

    /// Families tagged with `:v<maj.min>`, cached per version
    pub fn for_version(&self, ocp_version: &str) -> Result<Vec<CatalogEntry>> {
        let key = version::major_minor(ocp_version)?;
        let cache_key = CacheKey::catalogs(&key)?;

        if let Some(listing) = self.store.get::<CatalogListing>(&cache_key) {
            if let Some(entries) = listing.get(&key) {
                return Ok(entries.clone());
            }
        }

        let entries = self
            .families
            .iter()
            .map(|family| tag_family(family, &key))
            .collect::<Result<Vec<_>>>()?;

        let listing = CatalogListing::from([(key, entries.clone())]);
        self.store.put(&cache_key, &listing)?;
        Ok(entries)
    }

    /// Default family's catalog for a version
    pub fn catalog_for_version(&self, ocp_version: &str) -> Result<CatalogReference> {
        let family = self
            .families
            .iter()
            .find(|f| f.default)
            .or_else(|| self.families.first())
            .ok_or_else(|| {
                ImagesetError::configuration("No catalog families configured", Some("catalogs"), None)
            })?;
        CatalogReference::parse(&family.base_url)?.with_version(ocp_version)
    }

    /// Ask the mirror tool about every family. One family failing is
    /// recorded on its entry; only the overall sweep timeout fails the call.
    pub async fn probe(&self, ocp_version: &str) -> Result<Vec<ProbedCatalog>> {
        let entries = self.for_version(ocp_version)?;
        let key = version::major_minor(ocp_version)?;
        info!("Probing {} catalogs for OCP {}", entries.len(), key);

        let sweep = async {
            let mut probed = Vec::with_capacity(entries.len());
            for entry in entries {
                probed.push(self.probe_one(entry, &key).await);
            }
            probed
        };

        let mut probed = tokio::time::timeout(self.discovery_timeout, sweep)
            .await
            .map_err(|_| {
                ImagesetError::network_timeout(
                    &format!("{} list operators --catalogs", self.tool),
                    self.discovery_timeout.as_secs(),
                )
            })?;

        probed.sort_by(|a, b| {
            (!a.validated, std::cmp::Reverse(a.operators_count), &a.entry.name).cmp(&(
                !b.validated,
                std::cmp::Reverse(b.operators_count),
                &b.entry.name,
            ))
        });
        Ok(probed)
    }

    async fn probe_one(&self, entry: CatalogEntry, key: &str) -> ProbedCatalog {
        let command = CommandLine::new(&self.tool)
            .arg("list")
            .arg("operators")
            .arg("--catalogs")
            .arg(&entry.url)
            .arg("--version")
            .arg(key);

        let (validated, operators_count, error) =
            match self.runner.run(&command, self.catalog_timeout).await {
                Ok(output) if output.success() => {
                    let count = count_operator_lines(&output.stdout);
                    info!("Validated {} with {} operators", entry.url, count);
                    (true, count, None)
                }
                Ok(output) => {
                    warn!("{} failed for {}: {}", self.tool, entry.url, output.stderr.trim());
                    let stderr = output.stderr.trim();
                    let message = if stderr.is_empty() { "Unknown error" } else { stderr };
                    (false, 0, Some(message.to_string()))
                }
                Err(RunError::Timeout(_)) => {
                    warn!("Timeout while checking {}", entry.url);
                    (false, 0, Some("Timeout while validating".to_string()))
                }
                Err(e) => {
                    warn!("Error checking {}: {}", entry.url, e);
                    (false, 0, Some(e.to_string()))
                }
            };

        ProbedCatalog {
            entry,
            validated,
            operators_count,
            error,
        }
    }
}

fn tag_family(family: &CatalogFamily, key: &str) -> Result<CatalogEntry> {
    let reference = CatalogReference::parse(&family.base_url)?.with_version(key)?;
    Ok(CatalogEntry {
        name: family.name.clone(),
        url: reference.to_string(),
        description: format!("{} for OCP {}", family.description, key),
        default: family.default,
    })
}

/// Lines of list output that name an operator
fn count_operator_lines(stdout: &str) -> usize {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with('#') && !line.starts_with("WARN") && !line.starts_with("INFO"))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::runner::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn directory(runner: ScriptedRunner, dir: &TempDir) -> CatalogDirectory {
        CatalogDirectory::new(
            Arc::new(runner),
            CacheStore::new(dir.path()),
            "oc-mirror",
            CatalogFamily::builtin(),
        )
    }

    #[test]
    fn test_for_version_tags_every_family_and_caches() {
        let dir = TempDir::new().unwrap();
        let entries = directory(ScriptedRunner::new(), &dir).for_version("4.16.3").unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries[0].url,
            "registry.redhat.io/redhat/redhat-operator-index:v4.16"
        );
        assert_eq!(entries[0].description, "Official Red Hat certified operators for OCP 4.16");
        assert!(entries[0].default);

        let listing: CatalogListing = CacheStore::new(dir.path())
            .get(&CacheKey::catalogs("4.16").unwrap())
            .unwrap();
        assert_eq!(listing.get("4.16"), Some(&entries));
    }

    #[test]
    fn test_catalog_for_version_uses_default_family() {
        let dir = TempDir::new().unwrap();
        let reference = directory(ScriptedRunner::new(), &dir)
            .catalog_for_version("4.18")
            .unwrap();
        assert_eq!(
            reference.to_string(),
            "registry.redhat.io/redhat/redhat-operator-index:v4.18"
        );
    }

    #[tokio::test]
    async fn test_probe_sorts_validated_by_count() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .ok("community-operator-index", "INFO loading\na\nb\nc\n")
            .ok("certified-operator-index", "a\n")
            .respond("redhat-marketplace-index", 1, "", "unauthorized")
            .timeout("redhat-operator-index");

        let probed = directory(runner, &dir).probe("4.16").await.unwrap();
        let order: Vec<(&str, bool, usize)> = probed
            .iter()
            .map(|p| (p.entry.name.as_str(), p.validated, p.operators_count))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Community Operators", true, 3),
                ("Certified Operators", true, 1),
                ("Red Hat Marketplace", false, 0),
                ("Red Hat Operators", false, 0),
            ]
        );
        assert_eq!(probed[2].error.as_deref(), Some("unauthorized"));
        assert_eq!(probed[3].error.as_deref(), Some("Timeout while validating"));
    }

    #[test]
    fn test_count_operator_lines() {
        assert_eq!(count_operator_lines("# header\nWARN x\n\nfoo\nbar\n"), 2);
    }
}
