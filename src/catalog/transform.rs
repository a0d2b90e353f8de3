//! Catalog transformer - extracts bundle and channel tables from a rendered
//! catalog stream.
//!
//! The render tool emits a stream of concatenated JSON documents, one per
//! catalog entry. Two independent passes run over it:
//!
//! * the bundle pass keeps `olm.bundle` entries without an
//!   `olm.maxOpenShiftVersion` property
//! * the channel pass flattens every `olm.channel` entry into one row per
//!   member bundle
//!
//! Rows keep source document order; the enricher relies on first-match.

use crate::{ImagesetError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SCHEMA_BUNDLE: &str = "olm.bundle";
pub const SCHEMA_CHANNEL: &str = "olm.channel";
pub const SCHEMA_PACKAGE: &str = "olm.package";

const PROPERTY_PACKAGE: &str = "olm.package";
const PROPERTY_CSV_METADATA: &str = "olm.csv.metadata";
const PROPERTY_MAX_OCP: &str = "olm.maxOpenShiftVersion";

/// Declarative entry selector: schema match plus an optional forbidden property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFilter {
    pub schema: &'static str,
    pub without_property: Option<&'static str>,
}

impl EntryFilter {
    /// Operator bundles that install on any OpenShift version
    pub const BUNDLES: EntryFilter = EntryFilter {
        schema: SCHEMA_BUNDLE,
        without_property: Some(PROPERTY_MAX_OCP),
    };

    pub const CHANNELS: EntryFilter = EntryFilter {
        schema: SCHEMA_CHANNEL,
        without_property: None,
    };

    pub const PACKAGES: EntryFilter = EntryFilter {
        schema: SCHEMA_PACKAGE,
        without_property: None,
    };

    pub fn matches(&self, entry: &Value) -> bool {
        if entry.get("schema").and_then(Value::as_str) != Some(self.schema) {
            return false;
        }
        match self.without_property {
            Some(property) => find_property(entry, property).is_none(),
            None => true,
        }
    }
}

/// One row of the bundle table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRow {
    pub package: String,
    pub bundle: String,
    pub version: String,
    /// Comma-joined keyword list
    pub keywords: String,
    pub description: String,
    /// First channel declared for the package in the stream
    pub channel: String,
}

/// One row of the channel table (one per channel member)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRow {
    pub package: String,
    pub channel: String,
    pub entry: String,
}

/// Both extraction passes plus each package's declared default channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogTables {
    pub bundles: Vec<BundleRow>,
    pub channels: Vec<ChannelRow>,
    pub default_channels: BTreeMap<String, String>,
}

impl BundleRow {
    pub fn to_tsv(&self) -> String {
        [
            self.package.as_str(),
            &self.bundle,
            &self.version,
            &self.keywords,
            &self.description,
            &self.channel,
        ]
        .map(tsv_field)
        .join("\t")
    }

    pub fn from_tsv(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return None;
        }
        let field = |i: usize| fields.get(i).map(|s| s.to_string()).unwrap_or_default();
        Some(Self {
            package: field(0),
            bundle: field(1),
            version: field(2),
            keywords: field(3),
            description: field(4),
            channel: field(5),
        })
    }

    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ChannelRow {
    /// `package, channel, entry, channel` - the channel name is repeated last
    pub fn to_tsv(&self) -> String {
        [
            self.package.as_str(),
            &self.channel,
            &self.entry,
            &self.channel,
        ]
        .map(tsv_field)
        .join("\t")
    }

    pub fn from_tsv(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return None;
        }
        Some(Self {
            package: fields[0].to_string(),
            channel: fields[1].to_string(),
            entry: fields[2].to_string(),
        })
    }
}

impl CatalogTables {
    pub fn bundle_table(&self) -> String {
        table(self.bundles.iter().map(BundleRow::to_tsv))
    }

    pub fn channel_table(&self) -> String {
        table(self.channels.iter().map(ChannelRow::to_tsv))
    }
}

/// Parse a bundle table, skipping blank or short lines
pub fn parse_bundle_table(text: &str) -> Vec<BundleRow> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(BundleRow::from_tsv)
        .collect()
}

/// Parse a channel table, skipping blank or short lines
pub fn parse_channel_table(text: &str) -> Vec<ChannelRow> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(ChannelRow::from_tsv)
        .collect()
}

/// Split a rendered stream into its JSON entries.
///
/// Accepts concatenated documents as well as a single top-level array.
pub fn parse_stream(stream: &str, catalog: Option<&str>) -> Result<Vec<Value>> {
    let mut entries = Vec::new();
    for document in serde_json::Deserializer::from_str(stream).into_iter::<Value>() {
        let document = document.map_err(|e| {
            ImagesetError::catalog_parse(format!("Invalid catalog document stream: {e}"), catalog)
        })?;
        match document {
            Value::Array(items) => entries.extend(items),
            other => entries.push(other),
        }
    }
    Ok(entries)
}

/// Run both extraction passes over parsed entries
pub fn extract(entries: &[Value]) -> CatalogTables {
    let first_channels = first_channel_per_package(entries);

    let bundles = entries
        .iter()
        .filter(|e| EntryFilter::BUNDLES.matches(e))
        .filter_map(|e| project_bundle(e, &first_channels))
        .collect();

    let channels = entries
        .iter()
        .filter(|e| EntryFilter::CHANNELS.matches(e))
        .flat_map(project_channel)
        .collect();

    let default_channels = entries
        .iter()
        .filter(|e| EntryFilter::PACKAGES.matches(e))
        .filter_map(|e| {
            let name = str_field(e, "name")?;
            let default = str_field(e, "defaultChannel")?;
            Some((name.to_string(), default.to_string()))
        })
        .collect();

    CatalogTables {
        bundles,
        channels,
        default_channels,
    }
}

/// Parse and extract in one step
pub fn transform(stream: &str, catalog: Option<&str>) -> Result<CatalogTables> {
    let entries = parse_stream(stream, catalog)?;
    Ok(extract(&entries))
}

fn project_bundle(entry: &Value, first_channels: &BTreeMap<&str, &str>) -> Option<BundleRow> {
    let bundle = str_field(entry, "name")?;
    let package_property = find_property(entry, PROPERTY_PACKAGE);
    let package = str_field(entry, "package")
        .or_else(|| package_property.and_then(|v| str_field(v, "packageName")))?;
    let version = package_property
        .and_then(|v| str_field(v, "version"))
        .unwrap_or_default();

    let metadata = find_property(entry, PROPERTY_CSV_METADATA);
    let keywords = metadata
        .and_then(|m| m.get("keywords"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    let description = metadata
        .and_then(|m| str_field(m, "description"))
        .unwrap_or_default();

    Some(BundleRow {
        package: package.to_string(),
        bundle: bundle.to_string(),
        version: version.to_string(),
        keywords,
        description: description.to_string(),
        channel: first_channels.get(package).unwrap_or(&"").to_string(),
    })
}

fn project_channel(entry: &Value) -> Vec<ChannelRow> {
    let (Some(package), Some(channel)) = (str_field(entry, "package"), str_field(entry, "name"))
    else {
        return Vec::new();
    };

    entry
        .get("entries")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|m| str_field(m, "name"))
                .map(|member| ChannelRow {
                    package: package.to_string(),
                    channel: channel.to_string(),
                    entry: member.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn first_channel_per_package(entries: &[Value]) -> BTreeMap<&str, &str> {
    let mut first = BTreeMap::new();
    for entry in entries.iter().filter(|e| EntryFilter::CHANNELS.matches(e)) {
        if let (Some(package), Some(name)) = (str_field(entry, "package"), str_field(entry, "name")) {
            first.entry(package).or_insert(name);
        }
    }
    first
}

/// Value of the first property with the given type
fn find_property<'a>(entry: &'a Value, property_type: &str) -> Option<&'a Value> {
    entry
        .get("properties")?
        .as_array()?
        .iter()
        .find(|p| p.get("type").and_then(Value::as_str) == Some(property_type))
        .and_then(|p| p.get("value"))
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Tabs and line breaks would break the row layout
fn tsv_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

fn table(rows: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STREAM: &str = r#"
{"schema":"olm.package","name":"cluster-logging","defaultChannel":"stable-5.8"}
{"schema":"olm.channel","package":"cluster-logging","name":"stable-5.8","entries":[{"name":"cluster-logging.v5.8.0"},{"name":"cluster-logging.v5.8.1","replaces":"cluster-logging.v5.8.0"}]}
{"schema":"olm.channel","package":"cluster-logging","name":"stable-5.9","entries":[{"name":"cluster-logging.v5.9.0"}]}
{"schema":"olm.bundle","name":"cluster-logging.v5.8.1","package":"cluster-logging","properties":[
  {"type":"olm.package","value":{"packageName":"cluster-logging","version":"5.8.1"}},
  {"type":"olm.csv.metadata","value":{"keywords":["logging","elasticsearch"],"description":"Cluster\tLogging\nfor OpenShift"}}]}
{"schema":"olm.bundle","name":"cluster-logging.v4.6.0","package":"cluster-logging","properties":[
  {"type":"olm.package","value":{"packageName":"cluster-logging","version":"4.6.0"}},
  {"type":"olm.maxOpenShiftVersion","value":"4.8"}]}
{"schema":"olm.bundle","name":"cluster-logging.v5.9.0","package":"cluster-logging","properties":[
  {"type":"olm.package","value":{"packageName":"cluster-logging","version":"5.9.0"}}]}
"#;

    #[test]
    fn test_bundle_pass_skips_max_ocp_bundles() {
        let tables = transform(STREAM, None).unwrap();
        let names: Vec<&str> = tables.bundles.iter().map(|b| b.bundle.as_str()).collect();
        assert_eq!(names, vec!["cluster-logging.v5.8.1", "cluster-logging.v5.9.0"]);
    }

    #[test]
    fn test_bundle_projection() {
        let tables = transform(STREAM, None).unwrap();
        assert_eq!(
            tables.bundles[0],
            BundleRow {
                package: "cluster-logging".to_string(),
                bundle: "cluster-logging.v5.8.1".to_string(),
                version: "5.8.1".to_string(),
                keywords: "logging,elasticsearch".to_string(),
                description: "Cluster\tLogging\nfor OpenShift".to_string(),
                channel: "stable-5.8".to_string(),
            }
        );
        assert_eq!(tables.bundles[1].keywords, "");
        assert_eq!(tables.bundles[1].description, "");
    }

    #[test]
    fn test_channel_pass_one_row_per_member() {
        let tables = transform(STREAM, None).unwrap();
        let rows: Vec<(&str, &str)> = tables
            .channels
            .iter()
            .map(|r| (r.channel.as_str(), r.entry.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("stable-5.8", "cluster-logging.v5.8.0"),
                ("stable-5.8", "cluster-logging.v5.8.1"),
                ("stable-5.9", "cluster-logging.v5.9.0"),
            ]
        );
    }

    #[test]
    fn test_default_channels_from_package_entries() {
        let tables = transform(STREAM, None).unwrap();
        assert_eq!(
            tables.default_channels.get("cluster-logging").map(String::as_str),
            Some("stable-5.8")
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let first = transform(STREAM, None).unwrap();
        let second = transform(STREAM, None).unwrap();
        assert_eq!(first.bundle_table(), second.bundle_table());
        assert_eq!(first.channel_table(), second.channel_table());
    }

    #[test]
    fn test_tsv_tables_round_trip_rows() {
        let tables = transform(STREAM, None).unwrap();
        let bundle_table = tables.bundle_table();
        assert!(bundle_table.starts_with(
            "cluster-logging\tcluster-logging.v5.8.1\t5.8.1\tlogging,elasticsearch\tCluster Logging for OpenShift\tstable-5.8\n"
        ));
        assert_eq!(parse_bundle_table(&bundle_table).len(), 2);

        let channel_table = tables.channel_table();
        assert!(channel_table.starts_with(
            "cluster-logging\tstable-5.8\tcluster-logging.v5.8.0\tstable-5.8\n"
        ));
        assert_eq!(parse_channel_table(&channel_table), tables.channels);
    }

    #[test]
    fn test_array_stream_is_accepted() {
        let stream = r#"[{"schema":"olm.channel","package":"a","name":"stable","entries":[{"name":"a.v1"}]}]"#;
        let tables = transform(stream, None).unwrap();
        assert_eq!(tables.channels.len(), 1);
    }

    #[test]
    fn test_malformed_stream_is_a_parse_error() {
        let err = transform("{\"schema\": \"olm.bundle\"", Some("idx:v4.16")).unwrap_err();
        assert!(matches!(err, ImagesetError::CatalogParse { .. }));
        assert!(err.to_string().contains("catalog=idx:v4.16"));
    }
}
