//! Record enricher - attaches the owning channel to each bundle row

use super::transform::{parse_bundle_table, parse_channel_table, BundleRow, ChannelRow};
use crate::config::JoinMode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One operator package discovered in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub package: String,
    pub bundle: String,
    pub version: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Empty when no channel row matched
    #[serde(default)]
    pub channel: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Enricher {
    mode: JoinMode,
}

impl Enricher {
    pub fn new(mode: JoinMode) -> Self {
        Self { mode }
    }

    /// Join bundle rows against channel rows.
    ///
    /// Linear scan per bundle; the first channel row whose entry contains the
    /// bundle name wins. Rows without a match keep an empty channel.
    pub fn enrich(&self, bundles: &[BundleRow], channels: &[ChannelRow]) -> Vec<OperatorRecord> {
        let records: Vec<OperatorRecord> = bundles
            .iter()
            .map(|bundle| OperatorRecord {
                package: bundle.package.clone(),
                bundle: bundle.bundle.clone(),
                version: bundle.version.clone(),
                keywords: bundle.keyword_list(),
                description: bundle.description.clone(),
                channel: self
                    .find_channel(&bundle.bundle, channels)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect();

        let unmatched = records.iter().filter(|r| r.channel.is_empty()).count();
        debug!(
            "Enriched {} records against {} channel rows ({} without channel)",
            records.len(),
            channels.len(),
            unmatched
        );
        records
    }

    /// Join the tab-separated intermediate tables
    pub fn enrich_tsv(&self, bundle_table: &str, channel_table: &str) -> Vec<OperatorRecord> {
        self.enrich(
            &parse_bundle_table(bundle_table),
            &parse_channel_table(channel_table),
        )
    }

    fn find_channel<'a>(&self, bundle: &str, channels: &'a [ChannelRow]) -> Option<&'a str> {
        // "" is a substring of everything
        if bundle.is_empty() {
            return None;
        }
        if self.mode == JoinMode::ExactFirst {
            if let Some(row) = channels.iter().find(|row| row.entry == bundle) {
                return Some(&row.channel);
            }
        }
        channels
            .iter()
            .find(|row| row.entry.contains(bundle))
            .map(|row| row.channel.as_str())
    }
}
