pub mod loader;
pub mod types;

pub use loader::SettingsLoader;
pub use types::{
    CatalogFamily, JoinMode, OperatorAliases, Settings, Timeouts, Tools, CATALOG_REGISTRY,
    DEFAULT_CATALOG,
};
