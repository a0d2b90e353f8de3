//! ImageSet configuration documents

pub mod builder;
pub mod document;
pub mod render;
pub mod request;

pub use builder::{
    CatalogHints, ChannelHints, HelmChartInput, ImageSetBuilder, OperatorInput, OperatorSpec,
    PlatformRequest,
};
pub use document::ImageSetDocument;
pub use request::GenerateRequest;
