pub mod paths;

pub use paths::{ImagesetPaths, PathUtils};
