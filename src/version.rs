//! Release version helpers
//!
//! OCP versions are compared as numeric tuples (`4.9 < 4.10`), never as
//! plain strings.

use crate::{ImagesetError, Result};
use std::cmp::Ordering;

/// Parse a dotted version into its numeric components.
///
/// A leading `v` is accepted (`v4.16` is the same as `4.16`).
pub fn parse_tuple(version: &str) -> Result<Vec<u64>> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if bare.is_empty() {
        return Err(ImagesetError::invalid_version(
            "Version must be a non-empty string",
            version,
        ));
    }
    bare.split('.')
        .map(|part| {
            part.parse::<u64>().map_err(|_| {
                ImagesetError::invalid_version(
                    "Version components must be numeric",
                    version,
                )
            })
        })
        .collect()
}

/// Compare two versions under numeric-tuple ordering
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_tuple(a)?.cmp(&parse_tuple(b)?))
}

/// Smallest and largest entries of a version list, in numeric-tuple order.
///
/// Returns `None` for an empty list. Entries are returned verbatim.
pub fn min_max<S: AsRef<str>>(versions: &[S]) -> Result<Option<(String, String)>> {
    let mut parsed = Vec::with_capacity(versions.len());
    for version in versions {
        let version = version.as_ref();
        parsed.push((parse_tuple(version)?, version));
    }

    let min = parsed.iter().min_by(|a, b| a.0.cmp(&b.0));
    let max = parsed.iter().max_by(|a, b| a.0.cmp(&b.0));
    Ok(match (min, max) {
        (Some(min), Some(max)) => Some((min.1.to_string(), max.1.to_string())),
        _ => None,
    })
}

/// Normalize any release string to its `major.minor` key.
///
/// `4.16.3`, `v4.16` and `4.16` all become `4.16`.
pub fn major_minor(version: &str) -> Result<String> {
    let parts = parse_tuple(version)?;
    match parts.as_slice() {
        [major, minor, ..] => Ok(format!("{major}.{minor}")),
        _ => Err(ImagesetError::invalid_version(
            "Version must have at least major and minor components",
            version,
        )),
    }
}

/// Sort versions in place, newest first. Unparseable entries sink to the end.
pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| match (parse_tuple(a), parse_tuple(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}

/// Sort versions in place, oldest first. Unparseable entries sink to the end.
pub fn sort_oldest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| match (parse_tuple(a), parse_tuple(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}

/// Numeric suffix of a channel name (`stable-5.8` -> `[5, 8]`), if any
pub fn channel_version(channel: &str) -> Option<Vec<u64>> {
    let (_, suffix) = channel.rsplit_once('-')?;
    parse_tuple(suffix).ok()
}
