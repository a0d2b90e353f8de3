//! OCP release and channel listings from the mirror tool

use super::runner::{CommandLine, CommandRunner, RunError};
use crate::cache::{CacheKey, CacheStore, KeyedSnapshot, Provenance, ReleaseSnapshot};
use crate::version;
use crate::{ImagesetError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const RELEASE_PATTERN: &str = r"^\d+\.\d+$";
const CHANNEL_PATTERN: &str = r"^[a-z]+-\d+\.\d+$";
const PATCH_RELEASE_PATTERN: &str = r"^\d+\.\d+\.\d+$";

/// Served when the tool is unavailable and nothing is cached
pub const FALLBACK_RELEASES: &[&str] = &[
    "4.20", "4.19", "4.18", "4.17", "4.16", "4.15", "4.14", "4.13", "4.12", "4.11", "4.10",
];

pub struct ReleaseCatalog {
    runner: Arc<dyn CommandRunner>,
    store: CacheStore,
    tool: String,
    timeout: Duration,
}

impl ReleaseCatalog {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: CacheStore,
        tool: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            store,
            tool: tool.into(),
            timeout,
        }
    }

    /// Known OCP minor releases, newest first
    pub async fn releases(&self) -> Result<ReleaseSnapshot> {
        if let Some(snapshot) = self.store.get::<ReleaseSnapshot>(&CacheKey::Releases) {
            info!("Using cached release list ({} releases)", snapshot.releases.len());
            return Ok(snapshot);
        }
        self.refresh_releases().await
    }

    /// Query the tool for releases and rewrite the snapshot.
    ///
    /// Falls back to the built-in list only when no snapshot exists.
    pub async fn refresh_releases(&self) -> Result<ReleaseSnapshot> {
        let command = CommandLine::new(&self.tool).arg("list").arg("releases");
        match self.list(&command, RELEASE_PATTERN).await {
            Ok(mut releases) => {
                version::sort_newest_first(&mut releases);
                releases.dedup();
                let snapshot = ReleaseSnapshot::new(releases, Provenance::ExternalTool);
                self.store.put(&CacheKey::Releases, &snapshot)?;
                Ok(snapshot)
            }
            Err(e) => {
                if self.store.get::<ReleaseSnapshot>(&CacheKey::Releases).is_some() {
                    warn!("Release refresh failed, cached list left untouched");
                    return Err(e);
                }
                warn!("Release listing failed, using static fallback: {}", e);
                Ok(ReleaseSnapshot::new(
                    FALLBACK_RELEASES.iter().map(|r| r.to_string()).collect(),
                    Provenance::Static,
                ))
            }
        }
    }

    /// Channels for one OCP minor release, sorted lexically
    pub async fn channels(&self, ocp_version: &str) -> Result<Vec<String>> {
        let key = version::major_minor(ocp_version)?;
        if let Some(snapshot) = self.store.get::<KeyedSnapshot>(&CacheKey::Channels) {
            if let Some(channels) = snapshot.get(&key) {
                info!("Using cached channels for {}", key);
                return Ok(channels.clone());
            }
        }
        self.refresh_channels(&key).await
    }

    pub async fn refresh_channels(&self, ocp_version: &str) -> Result<Vec<String>> {
        let key = version::major_minor(ocp_version)?;
        let command = CommandLine::new(&self.tool)
            .arg("list")
            .arg("releases")
            .arg("--channels")
            .arg(format!("--version={key}"));

        let mut channels = self.list(&command, CHANNEL_PATTERN).await?;
        channels.sort();
        channels.dedup();

        self.update_keyed(CacheKey::Channels, &key, channels.clone())?;
        Ok(channels)
    }

    /// Patch releases in one channel, oldest first
    pub async fn channel_releases(&self, channel: &str) -> Result<Vec<String>> {
        if let Some(snapshot) = self.store.get::<KeyedSnapshot>(&CacheKey::ChannelReleases) {
            if let Some(releases) = snapshot.get(channel) {
                info!("Using cached releases for channel {}", channel);
                return Ok(releases.clone());
            }
        }
        self.refresh_channel_releases(channel).await
    }

    pub async fn refresh_channel_releases(&self, channel: &str) -> Result<Vec<String>> {
        let command = CommandLine::new(&self.tool)
            .arg("list")
            .arg("releases")
            .arg(format!("--channel={channel}"));

        let mut releases = self.list(&command, PATCH_RELEASE_PATTERN).await?;
        version::sort_oldest_first(&mut releases);
        releases.dedup();

        self.update_keyed(CacheKey::ChannelReleases, channel, releases.clone())?;
        Ok(releases)
    }

    fn update_keyed(&self, cache_key: CacheKey, key: &str, values: Vec<String>) -> Result<()> {
        let snapshot = self
            .store
            .get::<KeyedSnapshot>(&cache_key)
            .unwrap_or_else(|| KeyedSnapshot::new(BTreeMap::new()))
            .upsert(key, values);
        self.store.put(&cache_key, &snapshot)?;
        Ok(())
    }

    /// Run a list command and keep the lines matching `pattern`
    async fn list(&self, command: &CommandLine, pattern: &str) -> Result<Vec<String>> {
        let display = command.display();
        let output = self
            .runner
            .run(command, self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Timeout(_) => ImagesetError::network_timeout(&display, self.timeout.as_secs()),
                other => ImagesetError::network(other.to_string(), &display),
            })?;

        if !output.success() {
            return Err(ImagesetError::network(
                format!(
                    "{} exited with code {}: {}",
                    self.tool,
                    output.exit_code,
                    output.stderr.trim()
                ),
                &display,
            ));
        }

        filter_lines(&output.stdout, pattern)
    }
}

/// Keep trimmed lines matching `pattern`, in input order
pub fn filter_lines(output: &str, pattern: &str) -> Result<Vec<String>> {
    let regex = Regex::new(pattern)?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| regex.is_match(line))
        .map(str::to_string)
        .collect())
}
