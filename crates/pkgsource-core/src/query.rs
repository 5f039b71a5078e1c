//! Search predicates and their evaluation against records.

use std::fmt;
use std::str::FromStr;

use pkgsource_schema::{PackageVersionRecord, VersionView};
use serde::{Deserialize, Serialize};

/// Fields a predicate can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageMatchField {
    /// The package identifier (store key).
    PackageIdentifier,
    /// Default-locale package name.
    PackageName,
    /// Default-locale moniker.
    Moniker,
    /// Any installer command.
    Command,
    /// Any default-locale tag.
    Tag,
    /// Any installer package family name.
    PackageFamilyName,
    /// Any installer product code.
    ProductCode,
    /// Package name lowercased with separators stripped.
    NormalizedPackageNameAndPublisher,
    /// Any allowed market.
    Market,
}

impl PackageMatchField {
    /// Every field, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::PackageIdentifier,
        Self::PackageName,
        Self::Moniker,
        Self::Command,
        Self::Tag,
        Self::PackageFamilyName,
        Self::ProductCode,
        Self::NormalizedPackageNameAndPublisher,
        Self::Market,
    ];

    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PackageIdentifier => "PackageIdentifier",
            Self::PackageName => "PackageName",
            Self::Moniker => "Moniker",
            Self::Command => "Command",
            Self::Tag => "Tag",
            Self::PackageFamilyName => "PackageFamilyName",
            Self::ProductCode => "ProductCode",
            Self::NormalizedPackageNameAndPublisher => "NormalizedPackageNameAndPublisher",
            Self::Market => "Market",
        }
    }
}

impl fmt::Display for PackageMatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for a match field name this server does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported package match field: {0}")]
pub struct UnknownMatchField(pub String);

impl FromStr for PackageMatchField {
    type Err = UnknownMatchField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownMatchField(s.to_string()))
    }
}

/// How a keyword is compared with a field value.
///
/// Only the first four are implemented. `Wildcard`, `Fuzzy` and
/// `FuzzySubstring` never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchType {
    /// Byte-for-byte equality.
    Exact,
    /// Equality ignoring case.
    CaseInsensitive,
    /// Case-sensitive prefix.
    StartsWith,
    /// Case-insensitive containment.
    Substring,
    /// Never matches.
    Wildcard,
    /// Never matches.
    Fuzzy,
    /// Never matches.
    FuzzySubstring,
}

impl MatchType {
    /// Compare `value` against `keyword`.
    pub fn matches(self, value: &str, keyword: &str) -> bool {
        match self {
            Self::Exact => value == keyword,
            Self::CaseInsensitive => value.to_lowercase() == keyword.to_lowercase(),
            Self::StartsWith => value.starts_with(keyword),
            Self::Substring => value.to_lowercase().contains(&keyword.to_lowercase()),
            Self::Wildcard | Self::Fuzzy | Self::FuzzySubstring => false,
        }
    }
}

/// One inclusion or filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPredicate {
    /// Field to resolve on each record.
    pub field: PackageMatchField,
    /// Comparison to apply.
    pub match_type: MatchType,
    /// Value to compare with.
    pub keyword: String,
}

impl SearchPredicate {
    /// Build a predicate.
    pub fn new(field: PackageMatchField, match_type: MatchType, keyword: impl Into<String>) -> Self {
        Self {
            field,
            match_type,
            keyword: keyword.into(),
        }
    }

    /// True when any resolved value of the field matches.
    pub fn matches(&self, package_id: &str, record: &PackageVersionRecord) -> bool {
        resolve_field(self.field, package_id, record)
            .iter()
            .any(|value| self.match_type.matches(value, &self.keyword))
    }
}

/// Lowercase a package name and strip spaces, hyphens and plus signs.
pub fn normalize_package_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '+'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Values of `field` for one record.
///
/// Multi-valued fields yield every distinct value; absent fields yield
/// nothing, so no predicate on them can match.
pub fn resolve_field(
    field: PackageMatchField,
    package_id: &str,
    record: &PackageVersionRecord,
) -> Vec<String> {
    match field {
        PackageMatchField::PackageIdentifier => vec![package_id.to_string()],
        PackageMatchField::PackageName => non_empty(record.package_name()),
        PackageMatchField::Moniker => record.moniker().map(non_empty).unwrap_or_default(),
        PackageMatchField::Command => owned(record.commands()),
        PackageMatchField::Tag => record.tags().to_vec(),
        PackageMatchField::PackageFamilyName => owned(record.package_family_names()),
        PackageMatchField::ProductCode => owned(record.product_codes()),
        PackageMatchField::NormalizedPackageNameAndPublisher => {
            non_empty(&normalize_package_name(record.package_name()))
        }
        PackageMatchField::Market => owned(record.allowed_markets()),
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

fn non_empty(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Apply filters (all must match) then inclusions (one must match, unless
/// there are none).
pub fn evaluate(
    package_id: &str,
    record: &PackageVersionRecord,
    inclusions: &[SearchPredicate],
    filters: &[SearchPredicate],
) -> bool {
    if !filters.iter().all(|p| p.matches(package_id, record)) {
        return false;
    }
    inclusions.is_empty() || inclusions.iter().any(|p| p.matches(package_id, record))
}

/// Case-insensitive keyword match on package name or short description.
pub fn keyword_matches(record: &PackageVersionRecord, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    record.package_name().to_lowercase().contains(&keyword)
        || record.short_description().to_lowercase().contains(&keyword)
}
