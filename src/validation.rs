//! Input validation
//!
//! Field validators trim their input and accept only an allowlisted shape.
//! `validate_request` checks a whole generation request before it reaches
//! the builder.

use crate::imageset::GenerateRequest;
use crate::version;
use crate::{ImagesetError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

// Host (optional port), one or more path segments, optional :vX.Y tag
static CATALOG_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9.\-]*(?::\d+)?(?:/[\w\-]+)+(?::v\d+\.\d+)?$").expect("valid pattern")
});
static MINOR_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+$").expect("valid pattern"));
static CHANNEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9\-]*\d+\.\d+$").expect("valid pattern"));
static PATH_COMPONENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w\-.]+$").expect("valid pattern"));

/// `registry/org/catalog[:vX.Y]`
pub fn validate_catalog_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ImagesetError::configuration(
            "Catalog URL must be a non-empty string",
            Some("catalog"),
            None,
        ));
    }
    if !CATALOG_URL.is_match(url) {
        return Err(ImagesetError::configuration(
            "Invalid catalog URL format, expected <registry>/<org>/<catalog>[:v<major>.<minor>]",
            Some("catalog"),
            Some(url),
        ));
    }
    Ok(url.to_string())
}

/// `X.Y`
pub fn validate_version(value: &str) -> Result<String> {
    let value = value.trim();
    if !MINOR_VERSION.is_match(value) {
        return Err(ImagesetError::invalid_version(
            "Invalid version format, expected X.Y (e.g. 4.16)",
            value,
        ));
    }
    Ok(value.to_string())
}

/// `<name>-X.Y`
pub fn validate_channel(channel: &str) -> Result<String> {
    let channel = channel.trim();
    if !CHANNEL.is_match(channel) {
        return Err(ImagesetError::configuration(
            "Invalid channel format, expected <name>-X.Y (e.g. stable-4.16)",
            Some("channel"),
            Some(channel),
        ));
    }
    Ok(channel.to_string())
}

/// A single file name: no separators, no `..`
pub fn safe_path_component(component: &str) -> Result<String> {
    let component = component.trim();
    if component.is_empty()
        || component.contains("..")
        || component.contains('/')
        || component.contains('\\')
        || !PATH_COMPONENT.is_match(component)
    {
        return Err(ImagesetError::configuration(
            "Invalid path component",
            Some("path"),
            Some(component),
        ));
    }
    Ok(component.to_string())
}

/// Outcome of checking a request: errors block generation, warnings do not
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<String>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ImagesetError::configuration(
                self.errors.join("; "),
                Some("request"),
                None,
            ))
        }
    }
}

pub fn validate_request(request: &GenerateRequest) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !request.has_content() {
        report.errors.push(
            "At least one configuration section must be specified (OCP versions, operators, additional images, or Helm charts)"
                .to_string(),
        );
    }

    for release in &request.ocp_versions {
        let parts: Vec<&str> = release.split('.').collect();
        let well_formed = parts.len() >= 3
            && parts[..3]
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            report.warnings.push(format!(
                "OCP version \"{release}\" may not be in the expected format (e.g., 4.14.1)"
            ));
        }
    }

    if let (Some(min), Some(max)) = (&request.ocp_min_version, &request.ocp_max_version) {
        match version::compare(min, max) {
            Ok(Ordering::Greater) => report.warnings.push(format!(
                "Minimum version {min} is greater than maximum version {max}"
            )),
            Ok(_) => {}
            Err(e) => report.warnings.push(e.to_string()),
        }
    }

    let catalogs = request
        .operator_catalog
        .iter()
        .chain(request.operator_catalogs.iter());
    for catalog in catalogs {
        if !["http://", "https://", "registry."]
            .iter()
            .any(|prefix| catalog.starts_with(prefix))
        {
            report.warnings.push(format!(
                "Operator catalog \"{catalog}\" should be a valid registry URL"
            ));
        }
    }

    for image in &request.additional_images {
        if !image.contains(':') {
            report.warnings.push(format!(
                "Image \"{image}\" may be missing a tag (e.g., :latest)"
            ));
        }
    }

    for chart in &request.helm_charts {
        if chart.name.trim().is_empty() {
            report.errors.push("Helm chart name is required".to_string());
        }
        if chart.repository.trim().is_empty() {
            report.errors.push("Helm chart repository is required".to_string());
        }
    }

    report
}
