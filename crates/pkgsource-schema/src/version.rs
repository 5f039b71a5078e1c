//! Manifest schema versions understood by the server.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::SchemaError;

/// A supported `ManifestVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SchemaVersion {
    /// Schema 1.1.0.
    V1_1_0,
    /// Schema 1.2.0.
    V1_2_0,
    /// Schema 1.4.0.
    #[default]
    V1_4_0,
}

impl SchemaVersion {
    /// Every supported version, oldest first.
    pub const ALL: [Self; 3] = [Self::V1_1_0, Self::V1_2_0, Self::V1_4_0];

    /// Dotted version string as written in manifests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1_1_0 => "1.1.0",
            Self::V1_2_0 => "1.2.0",
            Self::V1_4_0 => "1.4.0",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.1.0" => Ok(Self::V1_1_0),
            "1.2.0" => Ok(Self::V1_2_0),
            "1.4.0" => Ok(Self::V1_4_0),
            other => Err(SchemaError::UnsupportedSchemaVersion(other.to_string())),
        }
    }
}

/// Order two package version strings.
///
/// Dot-separated segments compare as numbers when both are numeric and as
/// text otherwise, with numeric segments sorting first. Missing segments
/// count as `0`. Versions that tie fall back to plain text order.
pub fn compare_package_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.cmp(b)
}
