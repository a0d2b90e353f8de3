//! Snapshot envelopes persisted by the cache store

use crate::catalog::enrich::OperatorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a snapshot's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Produced by running an external tool
    ExternalTool,
    /// Built-in fallback data
    Static,
}

/// Fields shared by every snapshot envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub count: usize,
    pub source: Provenance,
    pub timestamp: DateTime<Utc>,
}

impl SnapshotMeta {
    pub fn new(count: usize, source: Provenance) -> Self {
        Self {
            count,
            source,
            timestamp: Utc::now(),
        }
    }
}

/// `operators-<family>-<maj.min>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSnapshot {
    pub operators: Vec<OperatorRecord>,
    /// Catalog-declared default channel per package
    #[serde(default)]
    pub default_channels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub meta: SnapshotMeta,
}

impl OperatorSnapshot {
    pub fn new(operators: Vec<OperatorRecord>, default_channels: BTreeMap<String, String>) -> Self {
        let meta = SnapshotMeta::new(operators.len(), Provenance::ExternalTool);
        Self {
            operators,
            default_channels,
            meta,
        }
    }
}

/// `ocp-versions.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSnapshot {
    pub releases: Vec<String>,
    #[serde(flatten)]
    pub meta: SnapshotMeta,
}

impl ReleaseSnapshot {
    pub fn new(releases: Vec<String>, source: Provenance) -> Self {
        let meta = SnapshotMeta::new(releases.len(), source);
        Self { releases, meta }
    }
}

/// Listings keyed by version or channel (`ocp-channels.json`,
/// `channel-releases.json`). `count` is the number of keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedSnapshot {
    pub entries: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub meta: SnapshotMeta,
}

impl KeyedSnapshot {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        let meta = SnapshotMeta::new(entries.len(), Provenance::ExternalTool);
        Self { entries, meta }
    }

    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.entries.get(key)
    }

    /// Replace one key and restamp the envelope
    pub fn upsert(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.entries.insert(key.into(), values);
        Self::new(self.entries)
    }
}
