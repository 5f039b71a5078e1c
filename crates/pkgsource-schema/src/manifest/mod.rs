//! YAML manifest documents.
//!
//! A package version is described either by one singleton file or by a group
//! of files (version, installer, default locale, extra locales) that share a
//! package identifier, version and schema version. The document types here
//! are generic over the locale and installer field sets, and each schema
//! version module names its own concrete aliases, so every schema version
//! gets a distinct parse target.

pub mod v1_1;
pub mod v1_2;
pub mod v1_4;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SchemaError;
use crate::common::Architecture;
use crate::inherit::Inherit;

/// The `ManifestType` marker inside each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManifestType {
    /// All facets of one version in one file.
    Singleton,
    /// The version facet of a multi-file manifest.
    Version,
    /// The installer facet of a multi-file manifest.
    Installer,
    /// An additional locale of a multi-file manifest.
    Locale,
    /// The default locale of a multi-file manifest.
    DefaultLocale,
}

impl ManifestType {
    /// Marker string as written in manifests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Version => "version",
            Self::Installer => "installer",
            Self::Locale => "locale",
            Self::DefaultLocale => "defaultLocale",
        }
    }
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "singleton" => Ok(Self::Singleton),
            "version" => Ok(Self::Version),
            "installer" => Ok(Self::Installer),
            "locale" => Ok(Self::Locale),
            "defaultLocale" => Ok(Self::DefaultLocale),
            other => Err(SchemaError::UnknownManifestType(other.to_string())),
        }
    }
}

/// The four fields every manifest file must carry.
///
/// Read before full parsing so unrelated YAML files can be skipped cheaply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ManifestHeader {
    /// Package identifier, e.g. `Git.Git`.
    pub package_identifier: String,
    /// Package version.
    pub package_version: String,
    /// Raw `ManifestType` marker.
    pub manifest_type: String,
    /// Raw `ManifestVersion`.
    pub manifest_version: String,
}

impl ManifestHeader {
    /// A file is only treated as a manifest when all four fields are present.
    pub fn is_manifest(&self) -> bool {
        !self.package_identifier.trim().is_empty()
            && !self.package_version.trim().is_empty()
            && !self.manifest_type.trim().is_empty()
            && !self.manifest_version.trim().is_empty()
    }
}

/// Read-only view of a locale field set.
pub trait LocaleFieldSet {
    /// Display name of the package.
    fn package_name(&self) -> &str;
    /// Publisher name.
    fn publisher(&self) -> &str;
    /// One-line description.
    fn short_description(&self) -> &str;
    /// Package license.
    fn license(&self) -> &str;
    /// Common short name, if any.
    fn moniker(&self) -> Option<&str>;
    /// Search tags.
    fn tags(&self) -> &[String];
}

/// Read-only view of an installer field set.
pub trait InstallerFieldSet: Inherit {
    /// Product code registered by the installer.
    fn product_code(&self) -> Option<&str>;
    /// MSIX package family name.
    fn package_family_name(&self) -> Option<&str>;
    /// Commands the installed package provides.
    fn commands(&self) -> &[String];
    /// Markets the installer may be offered in.
    fn allowed_markets(&self) -> &[String];
}

/// The version facet of a multi-file manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VersionManifest {
    /// Package identifier.
    pub package_identifier: String,
    /// Package version.
    pub package_version: String,
    /// Locale code of the default locale file.
    pub default_locale: String,
    /// Always `version`.
    pub manifest_type: String,
    /// Schema version.
    pub manifest_version: String,
}

/// One installer entry.
///
/// `fields` holds the values that may be inherited from the manifest-level
/// defaults; the four fields before it only exist per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Installer<F> {
    /// Target architecture.
    pub architecture: Architecture,
    /// Download location.
    #[serde(default)]
    pub installer_url: String,
    /// SHA-256 of the download.
    #[serde(default)]
    pub installer_sha256: String,
    /// SHA-256 of the MSIX signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_sha256: Option<String>,
    /// Inheritable installer fields.
    #[serde(flatten)]
    pub fields: F,
}

/// The installer facet of a multi-file manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallerManifest<F> {
    /// Package identifier.
    pub package_identifier: String,
    /// Package version.
    pub package_version: String,
    /// Release channel, e.g. `beta`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Manifest-level defaults for every installer entry.
    #[serde(flatten)]
    pub defaults: F,
    /// The installer entries.
    pub installers: Vec<Installer<F>>,
    /// Always `installer`.
    pub manifest_type: String,
    /// Schema version.
    pub manifest_version: String,
}

impl<F: Inherit> InstallerManifest<F> {
    /// Consume the manifest, pushing the manifest-level defaults down into
    /// every installer entry.
    pub fn into_installers(self) -> Vec<Installer<F>> {
        let Self {
            defaults,
            installers,
            ..
        } = self;
        apply_defaults(installers, &defaults)
    }
}

/// A locale facet, used for both `locale` and `defaultLocale` files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocaleManifest<L> {
    /// Package identifier.
    pub package_identifier: String,
    /// Package version.
    pub package_version: String,
    /// Locale code, e.g. `en-US`.
    pub package_locale: String,
    /// Localized fields.
    #[serde(flatten)]
    pub fields: L,
    /// `locale` or `defaultLocale`.
    pub manifest_type: String,
    /// Schema version.
    pub manifest_version: String,
}

/// The default locale facet; same shape as any other locale.
pub type DefaultLocaleManifest<L> = LocaleManifest<L>;

/// All facets of one version in a single file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SingletonManifest<L, F> {
    /// Package identifier.
    pub package_identifier: String,
    /// Package version.
    pub package_version: String,
    /// Locale code of the embedded default locale.
    pub package_locale: String,
    /// Release channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Default-locale fields.
    #[serde(flatten)]
    pub locale: L,
    /// Manifest-level installer defaults.
    #[serde(flatten)]
    pub defaults: F,
    /// The installer entries.
    pub installers: Vec<Installer<F>>,
    /// Always `singleton`.
    pub manifest_type: String,
    /// Schema version.
    pub manifest_version: String,
}

/// Apply the override rule to every installer entry.
pub fn apply_defaults<F: Inherit>(mut installers: Vec<Installer<F>>, defaults: &F) -> Vec<Installer<F>> {
    for installer in &mut installers {
        installer.fields.inherit(defaults);
    }
    installers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_type_round_trip() {
        for marker in ["singleton", "version", "installer", "locale", "defaultLocale"] {
            let parsed: ManifestType = marker.parse().unwrap();
            assert_eq!(parsed.as_str(), marker);
        }
        assert!("merged".parse::<ManifestType>().is_err());
    }

    #[test]
    fn test_header_requires_all_fields() {
        let header: ManifestHeader = serde_yaml_ng::from_str(
            "PackageIdentifier: Foo.Bar\nPackageVersion: 1.0.0\nManifestType: singleton\n",
        )
        .unwrap();
        assert!(!header.is_manifest());

        let header: ManifestHeader = serde_yaml_ng::from_str(
            "PackageIdentifier: Foo.Bar\nPackageVersion: 1.0.0\nManifestType: singleton\nManifestVersion: 1.1.0\n",
        )
        .unwrap();
        assert!(header.is_manifest());
    }

    #[test]
    fn test_unrelated_yaml_is_not_a_manifest() {
        let header: ManifestHeader =
            serde_yaml_ng::from_str("name: ci\non: [push]\njobs: {}\n").unwrap();
        assert!(!header.is_manifest());
    }
}
