pub mod catalogs;
pub mod generate;
pub mod mappings;
pub mod operators;
pub mod releases;
pub mod validate;

pub use catalogs::CatalogsCommand;
pub use generate::GenerateCommand;
pub use mappings::MappingsCommand;
pub use operators::OperatorsCommand;
pub use releases::ReleasesCommand;
pub use validate::ValidateCommand;

use crate::cache::CacheStore;
use crate::catalog::{CatalogDirectory, CatalogPipeline, CommandRunner, ReleaseCatalog};
use crate::config::Settings;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Common trait for all command handlers
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command and return what should be printed
    async fn run(&self, context: &CommandContext) -> Result<String>;

    /// Get command name for logging
    fn name(&self) -> &'static str;

    /// Run the command and print its output to stdout
    async fn execute(&self, context: &CommandContext) -> Result<()> {
        let output = self.run(context).await?;
        if !output.is_empty() {
            println!("{}", output.trim_end());
        }
        Ok(())
    }
}

/// Shared state handed to every command
pub struct CommandContext {
    pub settings: Settings,
    pub runner: Arc<dyn CommandRunner>,
    /// Print results as JSON instead of text
    pub json: bool,
}

impl CommandContext {
    pub fn new(settings: Settings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn store(&self) -> CacheStore {
        CacheStore::new(&self.settings.data_dir)
    }

    pub fn pipeline(&self) -> CatalogPipeline {
        CatalogPipeline::from_settings(&self.settings, Arc::clone(&self.runner))
    }

    pub fn releases(&self) -> ReleaseCatalog {
        ReleaseCatalog::new(
            Arc::clone(&self.runner),
            self.store(),
            self.settings.tools.mirror.clone(),
            self.settings.timeouts.list(),
        )
    }

    pub fn catalogs(&self) -> CatalogDirectory {
        CatalogDirectory::new(
            Arc::clone(&self.runner),
            self.store(),
            self.settings.tools.mirror.clone(),
            self.settings.catalog_families().to_vec(),
        )
        .with_timeouts(
            self.settings.timeouts.catalog(),
            self.settings.timeouts.discovery(),
        )
    }

    /// Render `value` as pretty JSON, or fall back to the text form
    pub fn format<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<String> {
        if self.json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(text(value))
        }
    }
}
