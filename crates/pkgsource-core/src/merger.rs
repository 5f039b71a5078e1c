//! Merging multi-file manifests into normalized records.
//!
//! A multi-file manifest is every file sharing a [`ManifestGroupKey`]. The
//! files are parsed with the typed targets of the key's schema version and
//! combined into one [`PackageVersionRecord`]. File order is irrelevant
//! except that only the first installer manifest contributes installers.

use std::fmt;
use std::path::{Path, PathBuf};

use pkgsource_schema::manifest::{
    InstallerManifest, LocaleManifest, SingletonManifest, VersionManifest, apply_defaults,
};
use pkgsource_schema::{
    Locale, ManifestHeader, ManifestSchema, ManifestType, PackageVersionRecord, Schema1_1,
    Schema1_2, Schema1_4, SchemaVersion, VersionData,
};
use thiserror::Error;

use crate::parser::{ParseError, parse_file};

/// Identifies one logical multi-file manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManifestGroupKey {
    /// Package identifier.
    pub package_identifier: String,
    /// Package version.
    pub package_version: String,
    /// Schema version shared by every file of the group.
    pub schema_version: SchemaVersion,
}

impl ManifestGroupKey {
    /// Build a key from already-resolved parts.
    pub fn new(
        package_identifier: impl Into<String>,
        package_version: impl Into<String>,
        schema_version: SchemaVersion,
    ) -> Self {
        Self {
            package_identifier: package_identifier.into(),
            package_version: package_version.into(),
            schema_version,
        }
    }
}

impl TryFrom<&ManifestHeader> for ManifestGroupKey {
    type Error = MergeError;

    fn try_from(header: &ManifestHeader) -> Result<Self, Self::Error> {
        let schema_version = header
            .manifest_version
            .parse::<SchemaVersion>()
            .map_err(|_| MergeError::UnsupportedSchemaVersion(header.manifest_version.clone()))?;
        Ok(Self::new(
            header.package_identifier.trim(),
            header.package_version.trim(),
            schema_version,
        ))
    }
}

impl fmt::Display for ManifestGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (schema {})",
            self.package_identifier, self.package_version, self.schema_version
        )
    }
}

/// Errors that prevent a package version from being built.
#[derive(Error, Debug)]
pub enum MergeError {
    /// No installer manifest in the group parsed successfully.
    #[error("No valid installer manifest for {0}")]
    MissingInstallers(ManifestGroupKey),

    /// No version manifest in the group parsed successfully.
    #[error("No valid version manifest for {0}")]
    MissingVersions(ManifestGroupKey),

    /// The schema version has no record shape.
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// A singleton file could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Merge the files of one group into a record.
///
/// Files that fail to parse are logged and ignored; the group only fails
/// when no installer or no version manifest survives.
///
/// # Errors
///
/// Returns [`MergeError::MissingInstallers`] or
/// [`MergeError::MissingVersions`] when the respective facet is absent.
pub fn merge_group(
    key: &ManifestGroupKey,
    files: &[(ManifestType, PathBuf)],
) -> Result<PackageVersionRecord, MergeError> {
    match key.schema_version {
        SchemaVersion::V1_1_0 => merge_typed::<Schema1_1>(key, files),
        SchemaVersion::V1_2_0 => merge_typed::<Schema1_2>(key, files),
        SchemaVersion::V1_4_0 => merge_typed::<Schema1_4>(key, files),
    }
}

/// Build a record from a singleton manifest.
///
/// # Errors
///
/// Returns [`MergeError::Parse`] if the file cannot be read or parsed.
pub fn load_singleton(
    path: &Path,
    schema_version: SchemaVersion,
) -> Result<PackageVersionRecord, MergeError> {
    match schema_version {
        SchemaVersion::V1_1_0 => singleton_typed::<Schema1_1>(path),
        SchemaVersion::V1_2_0 => singleton_typed::<Schema1_2>(path),
        SchemaVersion::V1_4_0 => singleton_typed::<Schema1_4>(path),
    }
}

fn singleton_typed<S: ManifestSchema>(path: &Path) -> Result<PackageVersionRecord, MergeError> {
    let manifest: SingletonManifest<S::Locale, S::Installer> = parse_file(path)?;
    let SingletonManifest {
        package_identifier,
        package_version,
        package_locale,
        channel,
        locale,
        defaults,
        installers,
        ..
    } = manifest;

    Ok(S::into_record(VersionData {
        package_identifier,
        schema_version: S::VERSION,
        package_version,
        channel,
        default_locale: Locale {
            package_locale,
            fields: locale,
        },
        locales: Vec::new(),
        installers: apply_defaults(installers, &defaults),
    }))
}

fn merge_typed<S: ManifestSchema>(
    key: &ManifestGroupKey,
    files: &[(ManifestType, PathBuf)],
) -> Result<PackageVersionRecord, MergeError> {
    let mut versions: Vec<VersionManifest> = Vec::new();
    let mut installer_sets = Vec::new();
    let mut locales: Vec<Locale<S::Locale>> = Vec::new();
    let mut default_locale: Option<Locale<S::Locale>> = None;

    for (manifest_type, path) in files {
        match manifest_type {
            ManifestType::Version => match parse_file::<VersionManifest>(path) {
                Ok(manifest) => versions.push(manifest),
                Err(e) => tracing::warn!(error = %e, "Skipping version manifest"),
            },
            ManifestType::Installer => {
                match parse_file::<InstallerManifest<S::Installer>>(path) {
                    Ok(manifest) => {
                        let channel = manifest.channel.clone();
                        installer_sets.push((channel, manifest.into_installers()));
                    }
                    Err(e) => tracing::warn!(error = %e, "Skipping installer manifest"),
                }
            }
            ManifestType::Locale => match parse_file::<LocaleManifest<S::Locale>>(path) {
                Ok(manifest) => locales.push(Locale {
                    package_locale: manifest.package_locale,
                    fields: manifest.fields,
                }),
                Err(e) => tracing::warn!(error = %e, "Skipping locale manifest"),
            },
            ManifestType::DefaultLocale => {
                if default_locale.is_some() {
                    tracing::warn!(
                        path = %path.display(),
                        group = %key,
                        "Ignoring additional default locale manifest"
                    );
                    continue;
                }
                match parse_file::<LocaleManifest<S::Locale>>(path) {
                    Ok(manifest) => {
                        default_locale = Some(Locale {
                            package_locale: manifest.package_locale,
                            fields: manifest.fields,
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Skipping default locale manifest"),
                }
            }
            ManifestType::Singleton => {
                tracing::warn!(
                    path = %path.display(),
                    group = %key,
                    "Singleton manifest cannot be part of a multi-file group"
                );
            }
        }
    }

    if installer_sets.len() > 1 {
        tracing::debug!(
            group = %key,
            count = installer_sets.len(),
            "Multiple installer manifests; only the first contributes installers"
        );
    }

    let Some((channel, installers)) = installer_sets.into_iter().next() else {
        return Err(MergeError::MissingInstallers(key.clone()));
    };
    let Some(version) = versions.into_iter().next() else {
        return Err(MergeError::MissingVersions(key.clone()));
    };

    let default_locale = default_locale.unwrap_or_else(|| Locale {
        package_locale: version.default_locale,
        fields: S::Locale::default(),
    });

    Ok(S::into_record(VersionData {
        package_identifier: key.package_identifier.clone(),
        schema_version: S::VERSION,
        package_version: key.package_version.clone(),
        channel,
        default_locale,
        locales,
        installers,
    }))
}
