use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Key/value context attached to an error message, rendered as
/// `message (key=value, key=value)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Details(Vec<(&'static str, String)>);

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field when a value is present
    pub fn with(mut self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            let value = value.into();
            if !value.is_empty() {
                self.0.push((key, value));
            }
        }
        self
    }
}

impl fmt::Display for Details {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        let joined = self
            .0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, " ({joined})")
    }
}

#[derive(Error, Debug)]
pub enum ImagesetError {
    #[error("{message}{details}")]
    Catalog { message: String, details: Details },

    /// The catalog render tool failed or timed out
    #[error("{message}{details}")]
    CatalogRender {
        message: String,
        details: Details,
        stderr: Option<String>,
        timed_out: bool,
    },

    #[error("{message}{details}")]
    CatalogParse { message: String, details: Details },

    #[error("{message}{details}")]
    Operator { message: String, details: Details },

    #[error("{message}{details}")]
    Version { message: String, details: Details },

    #[error("{message}{details}")]
    Configuration { message: String, details: Details },

    #[error("{message}{details}")]
    FileOperation {
        message: String,
        details: Details,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Subprocess spawn failures and timeouts of the list tool
    #[error("{message}{details}")]
    Network {
        message: String,
        details: Details,
        timed_out: bool,
    },

    #[error("{message}{details}")]
    Generation { message: String, details: Details },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ImagesetError>;

impl ImagesetError {
    pub fn catalog(message: impl Into<String>, catalog: Option<&str>, version: Option<&str>) -> Self {
        ImagesetError::Catalog {
            message: message.into(),
            details: Details::new()
                .with("catalog", catalog)
                .with("version", version),
        }
    }

    pub fn catalog_render(
        message: impl Into<String>,
        catalog: &str,
        stderr: Option<String>,
    ) -> Self {
        ImagesetError::CatalogRender {
            message: message.into(),
            details: Details::new().with("catalog", Some(catalog)),
            stderr,
            timed_out: false,
        }
    }

    pub fn render_timeout(catalog: &str, seconds: u64) -> Self {
        ImagesetError::CatalogRender {
            message: format!("Catalog render timed out after {seconds}s"),
            details: Details::new()
                .with("catalog", Some(catalog))
                .with("reason", Some("timeout")),
            stderr: None,
            timed_out: true,
        }
    }

    pub fn catalog_parse(message: impl Into<String>, catalog: Option<&str>) -> Self {
        ImagesetError::CatalogParse {
            message: message.into(),
            details: Details::new().with("catalog", catalog),
        }
    }

    pub fn operator_not_found(operator: &str, catalog: Option<&str>) -> Self {
        ImagesetError::Operator {
            message: "Operator not found".to_string(),
            details: Details::new()
                .with("operator", Some(operator))
                .with("catalog", catalog),
        }
    }

    pub fn invalid_version(message: impl Into<String>, version: &str) -> Self {
        ImagesetError::Version {
            message: message.into(),
            details: Details::new().with("version", Some(version)),
        }
    }

    pub fn version_range(min_version: &str, max_version: &str) -> Self {
        ImagesetError::Version {
            message: "Minimum version is greater than maximum version".to_string(),
            details: Details::new()
                .with("min_version", Some(min_version))
                .with("max_version", Some(max_version)),
        }
    }

    pub fn configuration(
        message: impl Into<String>,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Self {
        ImagesetError::Configuration {
            message: message.into(),
            details: Details::new()
                .with("config_key", key)
                .with("config_value", value),
        }
    }

    pub fn file_operation(
        message: impl Into<String>,
        path: &std::path::Path,
        operation: &str,
        source: Option<std::io::Error>,
    ) -> Self {
        ImagesetError::FileOperation {
            message: message.into(),
            details: Details::new()
                .with("file_path", Some(path.display().to_string()))
                .with("operation", Some(operation)),
            source,
        }
    }

    pub fn network(message: impl Into<String>, command: &str) -> Self {
        ImagesetError::Network {
            message: message.into(),
            details: Details::new().with("command", Some(command)),
            timed_out: false,
        }
    }

    pub fn network_timeout(command: &str, seconds: u64) -> Self {
        ImagesetError::Network {
            message: format!("Command timed out after {seconds}s"),
            details: Details::new().with("command", Some(command)),
            timed_out: true,
        }
    }

    pub fn generation(message: impl Into<String>, stage: &str) -> Self {
        ImagesetError::Generation {
            message: message.into(),
            details: Details::new().with("stage", Some(stage)),
        }
    }

    /// Whether the failure was an expired stage timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ImagesetError::CatalogRender { timed_out: true, .. }
                | ImagesetError::Network { timed_out: true, .. }
        )
    }

    pub fn status(&self) -> StatusClass {
        match self {
            _ if self.is_timeout() => StatusClass::Timeout,
            ImagesetError::Configuration { .. } | ImagesetError::Version { .. } => {
                StatusClass::BadRequest
            }
            ImagesetError::Operator { .. } => StatusClass::NotFound,
            _ => StatusClass::Failed,
        }
    }

    /// Build the structured error object shown to users
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            status: self.status(),
            message: self.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Coarse classification a transport layer maps onto its own status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    BadRequest,
    NotFound,
    Timeout,
    Failed,
}

impl StatusClass {
    pub fn http_code(&self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::NotFound => 404,
            StatusClass::Timeout => 504,
            StatusClass::Failed => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub status: StatusClass,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ImagesetError> for ErrorReport {
    fn from(err: ImagesetError) -> Self {
        err.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_error_formats_context() {
        let err = ImagesetError::catalog(
            "Failed to load catalog",
            Some("redhat-operator-index"),
            Some("4.16"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to load catalog (catalog=redhat-operator-index, version=4.16)"
        );
    }

    #[test]
    fn test_missing_context_is_omitted() {
        let err = ImagesetError::catalog("Failed to load catalog", None, None);
        assert_eq!(err.to_string(), "Failed to load catalog");
    }

    #[test]
    fn test_render_timeout_is_tagged() {
        let err = ImagesetError::render_timeout("registry.redhat.io/redhat/redhat-operator-index:v4.16", 180);
        assert!(err.is_timeout());
        assert!(err.to_string().contains("reason=timeout"));
        assert_eq!(err.status(), StatusClass::Timeout);
        assert_eq!(err.status().http_code(), 504);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ImagesetError::configuration("bad", Some("operators"), None).status(),
            StatusClass::BadRequest
        );
        assert_eq!(
            ImagesetError::invalid_version("bad", "4").status(),
            StatusClass::BadRequest
        );
        assert_eq!(
            ImagesetError::operator_not_found("nope", None).status(),
            StatusClass::NotFound
        );
        assert_eq!(
            ImagesetError::network("spawn failed", "oc-mirror list releases").status(),
            StatusClass::Failed
        );
    }

    #[test]
    fn test_report_serializes_without_backtrace() {
        let report = ImagesetError::version_range("4.16.5", "4.16.1").report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "bad_request");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("min_version=4.16.5, max_version=4.16.1"));
        assert!(json["timestamp"].is_string());
    }
}
