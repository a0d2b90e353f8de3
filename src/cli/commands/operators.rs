use super::{CommandContext, CommandHandler};
use crate::catalog::{CatalogReference, Enricher};
use crate::validation;
use crate::{ImagesetError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BUNDLE_TABLE_FILE: &str = "bundles.tsv";
pub const CHANNEL_TABLE_FILE: &str = "channels.tsv";

/// Handler for the `operators` command
pub struct OperatorsCommand {
    pub catalog: Option<String>,
    pub version: String,
    pub refresh: bool,
    pub package: Option<String>,
    pub dump_tables: Option<PathBuf>,
}

#[async_trait]
impl CommandHandler for OperatorsCommand {
    async fn run(&self, context: &CommandContext) -> Result<String> {
        let reference = self.reference(context)?;
        let pipeline = context.pipeline();

        if let Some(dir) = &self.dump_tables {
            return self.dump(context, &reference, dir).await;
        }

        if let Some(package) = &self.package {
            let channels = pipeline.operator_channels(&reference, package).await?;
            return context.format(&channels, |channels| channels.join("\n"));
        }

        let snapshot = if self.refresh {
            pipeline.refresh(&reference).await?
        } else {
            pipeline.snapshot(&reference).await?
        };

        context.format(&snapshot, |snapshot| {
            snapshot
                .operators
                .iter()
                .map(|op| format!("{}\t{}\t{}", op.package, op.version, op.channel))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn name(&self) -> &'static str {
        "operators"
    }
}

impl OperatorsCommand {
    pub fn new(
        catalog: Option<String>,
        version: String,
        refresh: bool,
        package: Option<String>,
        dump_tables: Option<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            version,
            refresh,
            package,
            dump_tables,
        }
    }

    /// Requested catalog (or the default) re-tagged with the requested version
    fn reference(&self, context: &CommandContext) -> Result<CatalogReference> {
        let version = validation::validate_version(&self.version)?;
        let catalog = match &self.catalog {
            Some(catalog) => validation::validate_catalog_url(catalog)?,
            None => context.settings.default_catalog.clone(),
        };
        CatalogReference::parse(&catalog)?.with_version(&version)
    }

    /// Write the intermediate tables and report what the join makes of them
    async fn dump(&self, context: &CommandContext, reference: &CatalogReference, dir: &Path) -> Result<String> {
        let tables = context.pipeline().tables(reference).await?;
        let bundle_table = tables.bundle_table();
        let channel_table = tables.channel_table();

        std::fs::create_dir_all(dir).map_err(|e| {
            ImagesetError::file_operation("Failed to create table directory", dir, "create", Some(e))
        })?;
        for (name, content) in [(BUNDLE_TABLE_FILE, &bundle_table), (CHANNEL_TABLE_FILE, &channel_table)] {
            let path = dir.join(name);
            std::fs::write(&path, content).map_err(|e| {
                ImagesetError::file_operation("Failed to write table", &path, "write", Some(e))
            })?;
        }
        info!("Wrote catalog tables for {} to {}", reference, dir.display());

        let records = Enricher::new(context.settings.join).enrich_tsv(&bundle_table, &channel_table);
        let summary = json!({
            "catalog": reference.to_string(),
            "bundles": tables.bundles.len(),
            "channels": tables.channels.len(),
            "operators": records.len(),
            "directory": dir.display().to_string(),
        });
        context.format(&summary, |_| {
            format!(
                "{}: {} bundle rows, {} channel rows, {} operators joined ({})",
                reference,
                tables.bundles.len(),
                tables.channels.len(),
                records.len(),
                dir.display()
            )
        })
    }
}
