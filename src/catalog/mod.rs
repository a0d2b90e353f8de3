//! Operator catalog ingestion
//!
//! Renders catalogs with the external render tool, extracts bundle and
//! channel tables, joins them into operator records and caches the result.
//! Release and catalog-family listings come from the mirror tool.

pub mod enrich;
pub mod families;
pub mod pipeline;
pub mod reference;
pub mod releases;
pub mod render;
pub mod runner;
pub mod transform;

pub use enrich::{Enricher, OperatorRecord};
pub use families::{CatalogDirectory, CatalogEntry, ProbedCatalog};
pub use pipeline::CatalogPipeline;
pub use reference::CatalogReference;
pub use releases::ReleaseCatalog;
pub use render::CatalogRenderer;
pub use runner::{CommandLine, CommandRunner, ProcessRunner, RunError, RunOutput};
pub use transform::{BundleRow, CatalogTables, ChannelRow};
