//! Ingestion pipeline: render -> transform -> enrich -> cache
//!
//! The cache is consulted first; a miss runs the full pipeline and writes
//! the snapshot back before anything is returned.

use super::enrich::{Enricher, OperatorRecord};
use super::reference::CatalogReference;
use super::render::CatalogRenderer;
use super::runner::CommandRunner;
use super::transform::{self, CatalogTables};
use crate::cache::{CacheKey, CacheStore, OperatorSnapshot};
use crate::config::Settings;
use crate::imageset::ChannelHints;
use crate::{ImagesetError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct CatalogPipeline {
    renderer: CatalogRenderer,
    store: CacheStore,
    enricher: Enricher,
}

impl CatalogPipeline {
    pub fn new(renderer: CatalogRenderer, store: CacheStore, enricher: Enricher) -> Self {
        Self {
            renderer,
            store,
            enricher,
        }
    }

    pub fn from_settings(settings: &Settings, runner: Arc<dyn CommandRunner>) -> Self {
        let renderer = CatalogRenderer::new(runner, &settings.tools.render, settings.timeouts.render())
            .skip_tls(settings.skip_tls());
        Self::new(
            renderer,
            CacheStore::new(&settings.data_dir),
            Enricher::new(settings.join),
        )
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Cached snapshot for a versioned catalog, running the pipeline on a miss
    pub async fn snapshot(&self, reference: &CatalogReference) -> Result<OperatorSnapshot> {
        let key = CacheKey::operators(reference)?;
        if let Some(snapshot) = self.store.get::<OperatorSnapshot>(&key) {
            info!(
                "Loaded {} operators for {} from cache",
                snapshot.operators.len(),
                reference
            );
            return Ok(snapshot);
        }
        self.refresh(reference).await
    }

    /// Operator records for a versioned catalog
    pub async fn operators(&self, reference: &CatalogReference) -> Result<Vec<OperatorRecord>> {
        Ok(self.snapshot(reference).await?.operators)
    }

    /// Run the pipeline unconditionally and rewrite the snapshot
    pub async fn refresh(&self, reference: &CatalogReference) -> Result<OperatorSnapshot> {
        let key = CacheKey::operators(reference)?;
        let started = Instant::now();

        let tables = self.tables(reference).await?;
        let records = self.enricher.enrich(&tables.bundles, &tables.channels);
        let snapshot = OperatorSnapshot::new(records, tables.default_channels);
        self.store.put(&key, &snapshot)?;

        info!(
            "Refreshed {}: {} operators in {:?}",
            reference,
            snapshot.operators.len(),
            started.elapsed()
        );
        Ok(snapshot)
    }

    /// Render and transform without enriching or caching
    pub async fn tables(&self, reference: &CatalogReference) -> Result<CatalogTables> {
        let stream = self.renderer.render(reference).await?;
        transform::transform(&stream, Some(&reference.to_string()))
    }

    /// Channel hints for the document builder
    pub async fn channel_hints(&self, reference: &CatalogReference) -> Result<ChannelHints> {
        Ok(ChannelHints::from_snapshot(&self.snapshot(reference).await?))
    }

    /// Distinct channels recorded for one package
    pub async fn operator_channels(
        &self,
        reference: &CatalogReference,
        package: &str,
    ) -> Result<Vec<String>> {
        let records = self.operators(reference).await?;
        let mut found = false;
        let mut channels = BTreeSet::new();
        for record in records.iter().filter(|r| r.package == package) {
            found = true;
            if !record.channel.is_empty() {
                channels.insert(record.channel.clone());
            }
        }

        if !found {
            return Err(ImagesetError::operator_not_found(
                package,
                Some(&reference.to_string()),
            ));
        }
        Ok(channels.into_iter().collect())
    }
}
