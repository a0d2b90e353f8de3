pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod imageset;
pub mod io;
pub mod validation;
pub mod version;

pub use error::{ErrorReport, ImagesetError, Result, StatusClass};
