//! Generation request payload (JSON or YAML)

use super::builder::{CatalogHints, ChannelHints, HelmChartInput, ImageSetBuilder, OperatorInput, OperatorSpec, PlatformRequest};
use super::document::ImageSetDocument;
use crate::config::OperatorAliases;
use crate::{ImagesetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    /// Legacy explicit release list
    pub ocp_versions: Vec<String>,
    pub ocp_channel: Option<String>,
    pub ocp_min_version: Option<String>,
    pub ocp_max_version: Option<String>,
    pub operators: Vec<OperatorInput>,
    pub operator_catalog: Option<String>,
    pub operator_catalogs: Vec<String>,
    pub additional_images: Vec<String>,
    pub helm_charts: Vec<HelmChartInput>,
    pub kubevirt_container: bool,
    /// GiB
    pub archive_size: Option<u64>,
    /// OCP version the operator catalogs are tagged with
    pub ocp_version: Option<String>,
}

impl GenerateRequest {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str::<Self>(content)?.normalized())
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str::<Self>(content)?.normalized())
    }

    /// Load a request file; `.json` is parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ImagesetError::file_operation("Failed to read request file", path, "read", Some(e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Trim every string and drop blank entries
    pub fn normalized(mut self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        fn clean_list(values: Vec<String>) -> Vec<String> {
            values
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        }

        self.ocp_versions = clean_list(self.ocp_versions);
        self.ocp_channel = clean(self.ocp_channel);
        self.ocp_min_version = clean(self.ocp_min_version);
        self.ocp_max_version = clean(self.ocp_max_version);
        self.operator_catalog = clean(self.operator_catalog);
        self.operator_catalogs = clean_list(self.operator_catalogs);
        self.additional_images = clean_list(self.additional_images);
        self.ocp_version = clean(self.ocp_version);
        self.operators = self
            .operators
            .into_iter()
            .filter_map(|op| match op {
                OperatorInput::Name(name) => {
                    let name = name.trim();
                    (!name.is_empty()).then(|| OperatorInput::Name(name.to_string()))
                }
                OperatorInput::Spec(spec) => {
                    let name = spec.name.trim().to_string();
                    (!name.is_empty()).then(|| {
                        OperatorInput::Spec(OperatorSpec {
                            name,
                            min_version: clean(spec.min_version),
                            max_version: clean(spec.max_version),
                            channel: clean(spec.channel),
                            catalog: clean(spec.catalog),
                        })
                    })
                }
            })
            .collect();
        self
    }

    pub fn has_platform(&self) -> bool {
        !self.ocp_versions.is_empty() || self.ocp_min_version.is_some() || self.ocp_max_version.is_some()
    }

    /// Whether any mirrorable section is present
    pub fn has_content(&self) -> bool {
        self.has_platform()
            || !self.operators.is_empty()
            || !self.additional_images.is_empty()
            || !self.helm_charts.is_empty()
    }

    pub fn platform(&self) -> PlatformRequest {
        PlatformRequest {
            versions: self.ocp_versions.clone(),
            channel: self.ocp_channel.clone(),
            min_version: self.ocp_min_version.clone(),
            max_version: self.ocp_max_version.clone(),
        }
    }

    /// Requested catalogs: the list, else the single catalog, else the default
    pub fn catalogs(&self, default_catalog: &str) -> Vec<String> {
        if !self.operator_catalogs.is_empty() {
            self.operator_catalogs.clone()
        } else if let Some(catalog) = &self.operator_catalog {
            vec![catalog.clone()]
        } else {
            vec![default_catalog.to_string()]
        }
    }

    /// Every catalog that will hold operators: the requested ones for
    /// operators without a catalog, then each catalog a structured operator
    /// names, first occurrence kept
    pub fn catalogs_in_use(&self, default_catalog: &str) -> Vec<String> {
        let mut catalogs = Vec::new();
        if self.operators.iter().any(|op| op.catalog().is_none()) {
            catalogs.extend(self.catalogs(default_catalog));
        }
        catalogs.extend(
            self.operators
                .iter()
                .filter_map(|op| op.catalog().map(str::to_string)),
        );

        let mut seen = BTreeSet::new();
        catalogs.retain(|catalog| seen.insert(catalog.clone()));
        catalogs
    }

    /// Drive a builder with this request, one hint set for every catalog.
    ///
    /// Operators without their own catalog are added to every requested
    /// catalog; a structured operator naming a catalog goes only there.
    pub fn apply(&self, builder: &mut ImageSetBuilder, hints: Option<&ChannelHints>) -> Result<()> {
        self.apply_with(builder, |_| hints)
    }

    /// Drive a builder with hints looked up per catalog group
    pub fn apply_per_catalog(&self, builder: &mut ImageSetBuilder, hints: &CatalogHints) -> Result<()> {
        self.apply_with(builder, |catalog| hints.get(catalog))
    }

    fn apply_with<'h, F>(&self, builder: &mut ImageSetBuilder, hints_for: F) -> Result<()>
    where
        F: Fn(&str) -> Option<&'h ChannelHints>,
    {
        if let Some(size) = self.archive_size {
            builder.set_archive_size(size);
        }

        if self.has_platform() {
            builder.add_platform_versions(&self.platform())?;
        }

        let ocp_version = self.ocp_version.as_deref();
        let (pinned, shared): (Vec<&OperatorInput>, Vec<&OperatorInput>) =
            self.operators.iter().partition(|op| op.catalog().is_some());

        if !shared.is_empty() {
            let shared: Vec<OperatorInput> = shared.into_iter().cloned().collect();
            for catalog in self.catalogs(builder.default_catalog()) {
                builder.add_operators(&shared, &catalog, hints_for(catalog.as_str()), ocp_version)?;
            }
        }
        for op in pinned {
            if let Some(catalog) = op.catalog() {
                builder.add_operators(std::slice::from_ref(op), catalog, hints_for(catalog), ocp_version)?;
            }
        }

        builder.add_additional_images(&self.additional_images);
        builder.add_helm_charts(&self.helm_charts)?;
        if self.kubevirt_container {
            builder.set_kubevirt_container(true);
        }
        Ok(())
    }

    /// Build a fresh document from this request
    pub fn build(
        &self,
        aliases: OperatorAliases,
        default_catalog: &str,
        hints: Option<&ChannelHints>,
    ) -> Result<ImageSetDocument> {
        let mut builder = ImageSetBuilder::new(aliases).with_default_catalog(default_catalog);
        self.apply(&mut builder, hints)?;
        Ok(builder.build())
    }

    /// Build a fresh document, each catalog group taking its own hints
    pub fn build_per_catalog(
        &self,
        aliases: OperatorAliases,
        default_catalog: &str,
        hints: &CatalogHints,
    ) -> Result<ImageSetDocument> {
        let mut builder = ImageSetBuilder::new(aliases).with_default_catalog(default_catalog);
        self.apply_per_catalog(&mut builder, hints)?;
        Ok(builder.build())
    }
}
