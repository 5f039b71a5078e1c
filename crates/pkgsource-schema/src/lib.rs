//! Manifest schema model for pkgsource.
//!
//! Pure data: the per-version YAML parse targets, the normalized records the
//! REST API serves, and the conversions between them. No I/O happens here.

pub mod common;
pub mod inherit;
pub mod manifest;
pub mod record;
pub mod schema;
mod scalar;
pub mod version;

// Re-exports
pub use common::*;
pub use inherit::{Inherit, Unset};
pub use manifest::{ManifestHeader, ManifestType};
pub use record::{Locale, PackageVersionRecord, ShapeA, ShapeB, VersionData, VersionView};
pub use schema::{ManifestSchema, Schema1_1, Schema1_2, Schema1_4};
pub use version::{SchemaVersion, compare_package_versions};

/// Errors raised while interpreting manifest markers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// `ManifestVersion` is not one of the supported versions.
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// `ManifestType` is not a known marker.
    #[error("Unknown manifest type: {0}")]
    UnknownManifestType(String),
}
