//! Serializer: metadata as leading comments, spec fields at the root

use super::document::{ImageSetDocument, Mirror};
use crate::Result;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Body<'a> {
    api_version: &'a str,
    kind: &'a str,
    mirror: &'a Mirror,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive_size: Option<u64>,
}

/// Render a document as YAML.
///
/// Field order follows insertion order throughout, so equal inputs give
/// byte-identical output apart from the generation timestamp label.
pub fn render(document: &ImageSetDocument) -> Result<String> {
    let mut out = header(document);
    let body = Body {
        api_version: &document.api_version,
        kind: &document.kind,
        mirror: &document.mirror,
        archive_size: document.archive_size,
    };
    out.push_str(&serde_yaml_ng::to_string(&body)?);
    Ok(out)
}

/// Comment block: `# name: ...` then one `# labels.<key>: ...` per label
pub fn header(document: &ImageSetDocument) -> String {
    let mut lines = vec![format!("# name: {}", comment_safe(&document.metadata.name))];
    lines.extend(
        document
            .metadata
            .labels
            .iter()
            .map(|(key, value)| format!("# labels.{}: {}", comment_safe(key), comment_safe(value))),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// A line break would end the comment early
fn comment_safe(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}
