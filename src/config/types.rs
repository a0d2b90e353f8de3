use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Registry and organisation every built-in catalog family lives under
pub const CATALOG_REGISTRY: &str = "registry.redhat.io/redhat";

/// Catalog used when a request names none
pub const DEFAULT_CATALOG: &str = "registry.redhat.io/redhat/redhat-operator-index";

/// Global settings for the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding cache snapshots
    pub data_dir: PathBuf,

    /// Verify registry TLS when rendering catalogs.
    /// Turning this off passes `--skip-tls` to the render tool.
    pub tls_verify: bool,

    /// External tool binaries
    pub tools: Tools,

    /// Per-stage subprocess timeouts
    pub timeouts: Timeouts,

    /// Catalog used when none is requested
    pub default_catalog: String,

    /// Known catalog families
    pub catalogs: Vec<CatalogFamily>,

    /// Short operator names mapped to package names
    pub aliases: OperatorAliases,

    /// How bundle rows are matched to channel rows
    pub join: JoinMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tls_verify: true,
            tools: Tools::default(),
            timeouts: Timeouts::default(),
            default_catalog: DEFAULT_CATALOG.to_string(),
            catalogs: CatalogFamily::builtin(),
            aliases: OperatorAliases::default(),
            join: JoinMode::default(),
        }
    }
}

impl Settings {
    pub fn aliases(&self) -> &OperatorAliases {
        &self.aliases
    }

    pub fn catalog_families(&self) -> &[CatalogFamily] {
        &self.catalogs
    }

    /// Whether the render tool should be told to skip TLS verification
    pub fn skip_tls(&self) -> bool {
        !self.tls_verify
    }
}

/// External tool binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    /// Catalog render tool (`opm`)
    pub render: String,
    /// Release and operator list tool (`oc-mirror`)
    pub mirror: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            render: "opm".to_string(),
            mirror: "oc-mirror".to_string(),
        }
    }
}

/// Timeouts in seconds, one per stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timeouts {
    /// Short list calls (releases, channels)
    pub list: u64,
    /// Catalog operator listings
    pub catalog: u64,
    /// Full catalog render
    pub render: u64,
    /// Catalog discovery sweeps
    pub discovery: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            list: 30,
            catalog: 120,
            render: 180,
            discovery: 300,
        }
    }
}

impl Timeouts {
    pub fn list(&self) -> Duration {
        Duration::from_secs(self.list)
    }

    pub fn catalog(&self) -> Duration {
        Duration::from_secs(self.catalog)
    }

    pub fn render(&self) -> Duration {
        Duration::from_secs(self.render)
    }

    pub fn discovery(&self) -> Duration {
        Duration::from_secs(self.discovery)
    }
}

/// One operator catalog family (Red Hat, community, certified, marketplace)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogFamily {
    /// Display name
    pub name: String,
    /// Unversioned catalog reference
    pub base_url: String,
    pub description: String,
    /// Whether this family is selected when none is requested
    #[serde(default)]
    pub default: bool,
}

impl CatalogFamily {
    fn new(name: &str, index: &str, description: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            base_url: format!("{CATALOG_REGISTRY}/{index}"),
            description: description.to_string(),
            default,
        }
    }

    /// The four families shipped with OpenShift
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(
                "Red Hat Operators",
                "redhat-operator-index",
                "Official Red Hat certified operators",
                true,
            ),
            Self::new(
                "Community Operators",
                "community-operator-index",
                "Community-maintained operators",
                false,
            ),
            Self::new(
                "Certified Operators",
                "certified-operator-index",
                "Third-party certified operators",
                false,
            ),
            Self::new(
                "Red Hat Marketplace",
                "redhat-marketplace-index",
                "Commercial operators from Red Hat Marketplace",
                false,
            ),
        ]
    }
}

/// Alias table resolving user-facing operator names to package names.
///
/// Lookups are case-insensitive; unknown names pass through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct OperatorAliases(BTreeMap<String, String>);

impl Default for OperatorAliases {
    fn default() -> Self {
        let pairs = [
            ("logging", "cluster-logging"),
            ("logging-operator", "cluster-logging"),
            ("monitoring", "cluster-monitoring-operator"),
            ("cluster-monitoring", "cluster-monitoring-operator"),
            ("service-mesh", "servicemeshoperator"),
            ("istio", "servicemeshoperator"),
            ("serverless", "serverless-operator"),
            ("knative", "serverless-operator"),
            ("pipelines", "openshift-pipelines-operator-rh"),
            ("tekton", "openshift-pipelines-operator-rh"),
            ("gitops", "openshift-gitops-operator"),
            ("argocd", "openshift-gitops-operator"),
            ("storage", "odf-operator"),
            ("ocs", "odf-operator"),
            ("ceph", "odf-operator"),
            ("elasticsearch", "elasticsearch-operator"),
            ("jaeger", "jaeger-product"),
            ("kiali", "kiali-ossm"),
        ];
        Self(
            pairs
                .iter()
                .map(|(alias, package)| (alias.to_string(), package.to_string()))
                .collect(),
        )
    }
}

impl OperatorAliases {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, alias: impl Into<String>, package: impl Into<String>) {
        self.0.insert(alias.into().to_lowercase(), package.into());
    }

    /// Resolve a name through the table
    pub fn resolve(&self, name: &str) -> String {
        self.0
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Bundle-to-channel join strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JoinMode {
    /// First channel row whose entry contains the bundle name
    #[default]
    Substring,
    /// Exact entry match first, then fall back to substring containment
    ExactFirst,
}
