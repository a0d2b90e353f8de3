//! Versioned snapshot cache
pub mod snapshot;
pub mod store;

pub use snapshot::{KeyedSnapshot, OperatorSnapshot, Provenance, ReleaseSnapshot, SnapshotMeta};
pub use store::{CacheKey, CacheStore};
