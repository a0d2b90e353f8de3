//! Document builder
//!
//! Every call is additive and independent. The document is valid to render
//! after any sequence of calls, including none.

use super::document::{
    ChannelSpec, ChartSpec, ImageSetDocument, ImageSpec, OperatorCatalogSpec, OperatorPackageSpec,
    PlatformChannelSpec, DEFAULT_NAME,
};
use super::render;
use crate::cache::OperatorSnapshot;
use crate::catalog::enrich::OperatorRecord;
use crate::catalog::reference::CatalogReference;
use crate::config::{OperatorAliases, DEFAULT_CATALOG};
use crate::version;
use crate::{ImagesetError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Channel a legacy version list is assumed to target when none was chosen
pub const DEFAULT_PLATFORM_CHANNEL: &str = "stable-4.14";

/// Operator selection: a bare name or a structured spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorInput {
    Name(String),
    Spec(OperatorSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSpec {
    pub name: String,
    #[serde(default, alias = "min_version", skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, alias = "max_version", skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Catalog override for this operator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

impl OperatorInput {
    pub fn name(&self) -> &str {
        match self {
            OperatorInput::Name(name) => name,
            OperatorInput::Spec(spec) => &spec.name,
        }
    }

    pub fn catalog(&self) -> Option<&str> {
        match self {
            OperatorInput::Name(_) => None,
            OperatorInput::Spec(spec) => spec.catalog.as_deref(),
        }
    }
}

impl From<&str> for OperatorInput {
    fn from(name: &str) -> Self {
        OperatorInput::Name(name.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmChartInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl HelmChartInput {
    /// `https://charts.example.com/stable` -> `https---charts.example.com-stable`
    pub fn repository_key(&self) -> String {
        self.repository.replace(['/', ':'], "-")
    }
}

/// Platform selection: explicit bounds, or a legacy version list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformRequest {
    pub versions: Vec<String>,
    pub channel: Option<String>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
}

/// Discovered channel metadata per package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelHints {
    channels: BTreeMap<String, BTreeSet<String>>,
    newest: BTreeMap<String, String>,
}

impl ChannelHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a known channel for a package
    pub fn insert(&mut self, package: impl Into<String>, channel: impl Into<String>) {
        self.channels
            .entry(package.into())
            .or_default()
            .insert(channel.into());
    }

    /// Mark the newest channel of a package; it is also recorded as known
    pub fn set_newest(&mut self, package: impl Into<String>, channel: impl Into<String>) {
        let package = package.into();
        let channel = channel.into();
        self.insert(package.clone(), channel.clone());
        self.newest.insert(package, channel);
    }

    /// One channel per package, which is also its newest
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut hints = Self::new();
        for (package, channel) in pairs {
            hints.set_newest(package, channel);
        }
        hints
    }

    /// Hints from enriched records. The newest channel is the one with the
    /// highest numeric suffix; the catalog's declared default is used when
    /// no channel carries one.
    pub fn from_records(records: &[OperatorRecord], default_channels: &BTreeMap<String, String>) -> Self {
        let mut hints = Self::new();
        for record in records.iter().filter(|r| !r.channel.is_empty()) {
            hints.insert(record.package.clone(), record.channel.clone());
        }

        let newest: Vec<(String, String)> = hints
            .channels
            .iter()
            .filter_map(|(package, channels)| {
                newest_channel(channels)
                    .or_else(|| default_channels.get(package).cloned())
                    .map(|channel| (package.clone(), channel))
            })
            .collect();
        for (package, channel) in newest {
            hints.set_newest(package, channel);
        }
        hints
    }

    pub fn from_snapshot(snapshot: &OperatorSnapshot) -> Self {
        Self::from_records(&snapshot.operators, &snapshot.default_channels)
    }

    pub fn channels(&self, package: &str) -> Option<&BTreeSet<String>> {
        self.channels.get(package)
    }

    pub fn newest(&self, package: &str) -> Option<&str> {
        self.newest.get(package).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Fold another catalog's hints in; its newest channels win on conflict
    pub fn merge(&mut self, other: ChannelHints) {
        for (package, channels) in other.channels {
            self.channels.entry(package).or_default().extend(channels);
        }
        self.newest.extend(other.newest);
    }

    /// Newest channel by the name as given first, then by resolved package
    fn newest_for(&self, given: &str, package: &str) -> Option<&str> {
        self.newest(given).or_else(|| self.newest(package))
    }
}

fn newest_channel(channels: &BTreeSet<String>) -> Option<String> {
    channels
        .iter()
        .filter_map(|c| version::channel_version(c).map(|v| (v, c)))
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, c)| c.clone())
}

/// Channel hints per catalog repository; tags are ignored on lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogHints {
    catalogs: BTreeMap<String, ChannelHints>,
}

impl CatalogHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold hints discovered for `reference` into its repository's entry
    pub fn insert(&mut self, reference: &CatalogReference, hints: ChannelHints) {
        self.catalogs
            .entry(reference.repository().to_string())
            .or_default()
            .merge(hints);
    }

    /// Hints for a catalog as written in a request
    pub fn get(&self, catalog: &str) -> Option<&ChannelHints> {
        let reference = CatalogReference::parse(catalog).ok()?;
        self.catalogs.get(reference.repository())
    }

    /// Packages with hints, summed over catalogs
    pub fn len(&self) -> usize {
        self.catalogs.values().map(ChannelHints::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.values().all(ChannelHints::is_empty)
    }
}

#[derive(Debug)]
pub struct ImageSetBuilder {
    document: ImageSetDocument,
    aliases: OperatorAliases,
    default_catalog: String,
}

impl Default for ImageSetBuilder {
    fn default() -> Self {
        Self::new(OperatorAliases::default())
    }
}

impl ImageSetBuilder {
    pub fn new(aliases: OperatorAliases) -> Self {
        let mut document = ImageSetDocument::new(DEFAULT_NAME);
        document
            .metadata
            .labels
            .insert("generated-by", env!("CARGO_PKG_NAME").to_string());
        document.metadata.labels.insert(
            "generated-at",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        );
        Self {
            document,
            aliases,
            default_catalog: DEFAULT_CATALOG.to_string(),
        }
    }

    /// Catalog used by requests that name none
    pub fn with_default_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.default_catalog = catalog.into();
        self
    }

    pub fn default_catalog(&self) -> &str {
        &self.default_catalog
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.document.metadata.name = name.into();
        self
    }

    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.document.metadata.labels.insert(key, value.into());
        self
    }

    /// Root-level `archiveSize` in GiB
    pub fn set_archive_size(&mut self, gib: u64) -> &mut Self {
        self.document.archive_size = Some(gib);
        self
    }

    /// Add one platform channel entry.
    ///
    /// Explicit bounds win over a legacy version list; with neither this is
    /// a no-op. A legacy list keeps its numeric min and max, and an unset or
    /// default channel is derived from the first entry's minor version.
    ///
    /// Explicit bounds without a channel are named `stable-<major.minor>` of
    /// the lower bound (else the upper one) rather than falling back to
    /// `stable-4.14`, so the name always matches the mirrored range.
    pub fn add_platform_versions(&mut self, request: &PlatformRequest) -> Result<&mut Self> {
        let min = non_blank(request.min_version.as_deref());
        let max = non_blank(request.max_version.as_deref());
        let channel = non_blank(request.channel.as_deref());

        let spec = if min.is_some() || max.is_some() {
            if let (Some(min), Some(max)) = (min, max) {
                if version::compare(min, max)? == Ordering::Greater {
                    return Err(ImagesetError::version_range(min, max));
                }
            }
            for bound in [min, max].into_iter().flatten() {
                version::parse_tuple(bound)?;
            }
            let name = match channel {
                Some(channel) => channel.to_string(),
                None => format!("stable-{}", version::major_minor(min.or(max).unwrap_or_default())?),
            };
            PlatformChannelSpec {
                name,
                channel_type: "ocp".to_string(),
                min_version: min.map(str::to_string),
                max_version: max.map(str::to_string),
            }
        } else {
            let versions: Vec<&str> = request
                .versions
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();
            let Some((min, max)) = version::min_max(&versions)? else {
                return Ok(self);
            };
            let name = match channel {
                Some(channel) if channel != DEFAULT_PLATFORM_CHANNEL => channel.to_string(),
                _ => format!("stable-{}", version::major_minor(versions[0])?),
            };
            PlatformChannelSpec {
                name,
                channel_type: "ocp".to_string(),
                min_version: Some(min),
                max_version: Some(max),
            }
        };

        debug!("Adding platform channel {}", spec.name);
        self.document.mirror.platform.channels.push(spec);
        Ok(self)
    }

    /// Add packages under one catalog.
    ///
    /// The catalog is re-tagged with `ocp_version` when given. Packages for a
    /// catalog already in the document join its group; a package added twice
    /// replaces the earlier entry.
    pub fn add_operators(
        &mut self,
        operators: &[OperatorInput],
        catalog: &str,
        hints: Option<&ChannelHints>,
        ocp_version: Option<&str>,
    ) -> Result<&mut Self> {
        if operators.is_empty() {
            return Ok(self);
        }

        let mut reference = CatalogReference::parse(catalog)?;
        if let Some(ocp_version) = non_blank(ocp_version) {
            reference = reference.with_version(ocp_version)?;
        }
        let catalog = reference.to_string();

        let packages = operators
            .iter()
            .map(|input| self.package_spec(input, hints))
            .collect::<Result<Vec<_>>>()?;

        let groups = &mut self.document.mirror.operators;
        let index = match groups.iter().position(|g| g.catalog == catalog) {
            Some(index) => index,
            None => {
                groups.push(OperatorCatalogSpec {
                    catalog: catalog.clone(),
                    packages: Vec::new(),
                });
                groups.len() - 1
            }
        };
        for package in packages {
            groups[index].upsert(package);
        }

        debug!("Catalog {} now has {} packages", catalog, groups[index].packages.len());
        Ok(self)
    }

    fn package_spec(&self, input: &OperatorInput, hints: Option<&ChannelHints>) -> Result<OperatorPackageSpec> {
        let given = input.name().trim();
        if given.is_empty() {
            return Err(ImagesetError::configuration(
                "Operator name must not be empty",
                Some("operators"),
                None,
            ));
        }

        let package = self.aliases.resolve(given);
        let mut spec = OperatorPackageSpec::named(package.clone());

        let explicit_channel = match input {
            OperatorInput::Name(_) => None,
            OperatorInput::Spec(s) => {
                spec.min_version = non_blank(s.min_version.as_deref()).map(str::to_string);
                spec.max_version = non_blank(s.max_version.as_deref()).map(str::to_string);
                non_blank(s.channel.as_deref())
            }
        };

        let newest = hints.and_then(|h| h.newest_for(given, &package));
        let channel = explicit_channel.or(newest);
        if let Some(channel) = channel {
            spec.channels = Some(vec![ChannelSpec {
                name: channel.to_string(),
            }]);
        }

        // Only unbounded packages get a default channel
        if spec.min_version.is_none() && spec.max_version.is_none() && newest.is_some() {
            spec.default_channel = channel.map(str::to_string);
        }
        Ok(spec)
    }

    pub fn add_additional_images<S: AsRef<str>>(&mut self, images: &[S]) -> &mut Self {
        self.document.mirror.additional_images.extend(
            images
                .iter()
                .map(|image| image.as_ref().trim())
                .filter(|image| !image.is_empty())
                .map(|image| ImageSpec {
                    name: image.to_string(),
                }),
        );
        self
    }

    /// Append charts grouped by repository key
    pub fn add_helm_charts(&mut self, charts: &[HelmChartInput]) -> Result<&mut Self> {
        for chart in charts {
            if chart.name.trim().is_empty() {
                return Err(ImagesetError::configuration(
                    "Helm chart name is required",
                    Some("helm_charts"),
                    Some(&chart.repository),
                ));
            }
            self.document
                .mirror
                .helm
                .get_or_insert_with(&chart.repository_key(), Vec::new)
                .push(ChartSpec {
                    name: chart.name.trim().to_string(),
                    version: chart.version.clone().unwrap_or_default(),
                });
        }
        Ok(self)
    }

    /// Disabling removes the field instead of writing `false`
    pub fn set_kubevirt_container(&mut self, enable: bool) -> &mut Self {
        self.document.mirror.platform.kube_virt_container = enable.then_some(true);
        self
    }

    pub fn document(&self) -> &ImageSetDocument {
        &self.document
    }

    pub fn build(self) -> ImageSetDocument {
        self.document
    }

    pub fn to_yaml(&self) -> Result<String> {
        render::render(&self.document)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
