//! Catalog references (`registry/org/index[:tag]`)

use crate::version;
use crate::{ImagesetError, Result};
use std::fmt;
use std::str::FromStr;

/// Identity of an operator catalog image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogReference {
    /// Registry path without tag
    repository: String,
    /// Tag without the leading colon
    tag: Option<String>,
}

impl CatalogReference {
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImagesetError::catalog(
                "Catalog reference must be a non-empty string",
                None,
                None,
            ));
        }

        // A colon after the last slash is a tag; one before it is a registry port.
        let last_slash = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repository, tag) = match reference[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&reference[..split], Some(&reference[split + 1..]))
            }
            None => (reference, None),
        };

        if repository.is_empty() || repository.ends_with('/') || tag == Some("") {
            return Err(ImagesetError::catalog(
                "Malformed catalog reference",
                Some(reference),
                None,
            ));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.map(str::to_string),
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Final path segment, e.g. `redhat-operator-index`
    pub fn family(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// OCP `major.minor` carried by a `v<major>.<minor>` tag
    pub fn version(&self) -> Option<String> {
        let tag = self.tag.as_deref()?.strip_prefix('v')?;
        version::major_minor(tag).ok()
    }

    /// Re-tag with `:v<major>.<minor>`, dropping any existing tag
    pub fn with_version(&self, ocp_version: &str) -> Result<Self> {
        let key = version::major_minor(ocp_version)?;
        Ok(Self {
            repository: self.repository.clone(),
            tag: Some(format!("v{key}")),
        })
    }
}

impl fmt::Display for CatalogReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.repository, tag),
            None => write!(f, "{}", self.repository),
        }
    }
}

impl FromStr for CatalogReference {
    type Err = ImagesetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
