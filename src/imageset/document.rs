//! In-memory ImageSet configuration document

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const API_VERSION: &str = "mirror.openshift.io/v1alpha2";
pub const KIND: &str = "ImageSetConfiguration";
pub const DEFAULT_NAME: &str = "openshift-imageset";

/// String-keyed map that serializes in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place; a replaced key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> V) -> &mut V {
        let index = match self.0.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.0.push((key.to_string(), default()));
                self.0.len() - 1
            }
        };
        &mut self.0[index].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Descriptive fields, rendered as comments rather than document keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub labels: OrderedMap<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSetDocument {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    /// Archive size in GiB; omitted unless set
    pub archive_size: Option<u64>,
    pub mirror: Mirror,
}

impl ImageSetDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata {
                name: name.into(),
                labels: OrderedMap::new(),
            },
            archive_size: None,
            mirror: Mirror::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mirror {
    pub platform: Platform,
    pub operators: Vec<OperatorCatalogSpec>,
    pub additional_images: Vec<ImageSpec>,
    pub helm: OrderedMap<Vec<ChartSpec>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub channels: Vec<PlatformChannelSpec>,
    pub graph: bool,
    /// Only ever `Some(true)`; disabling removes the key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kube_virt_container: Option<bool>,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            graph: true,
            kube_virt_container: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformChannelSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
}

/// Packages mirrored from one catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorCatalogSpec {
    pub catalog: String,
    pub packages: Vec<OperatorPackageSpec>,
}

impl OperatorCatalogSpec {
    pub fn package(&self, name: &str) -> Option<&OperatorPackageSpec> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Add or replace by name; a replaced package keeps its position
    pub fn upsert(&mut self, package: OperatorPackageSpec) {
        match self.packages.iter_mut().find(|p| p.name == package.name) {
            Some(existing) => *existing = package,
            None => self.packages.push(package),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorPackageSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<ChannelSpec>>,
}

impl OperatorPackageSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_channel: None,
            min_version: None,
            max_version: None,
            channels: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSpec {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSpec {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ordered_map_keeps_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        map.insert("zeta", 3);

        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(map.get("zeta"), Some(&3));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":3,"alpha":2}"#);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut group = OperatorCatalogSpec {
            catalog: "c".to_string(),
            packages: vec![OperatorPackageSpec::named("a"), OperatorPackageSpec::named("b")],
        };
        let mut replacement = OperatorPackageSpec::named("a");
        replacement.min_version = Some("1.0.0".to_string());
        group.upsert(replacement);

        assert_eq!(group.packages.len(), 2);
        assert_eq!(group.packages[0].min_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_platform_omits_unset_kubevirt() {
        let json = serde_json::to_value(Platform::default()).unwrap();
        assert_eq!(json, serde_json::json!({"channels": [], "graph": true}));
    }
}
