//! Schema-version dispatch table.
//!
//! Each supported `ManifestVersion` has a marker type naming its parse
//! targets and how its parsed data becomes a [`PackageVersionRecord`]:
//! 1.1.0 maps to shape A, 1.2.0 and 1.4.0 map to shape B.

use serde::de::DeserializeOwned;

use crate::manifest::{InstallerFieldSet, LocaleFieldSet, v1_1, v1_2, v1_4};
use crate::record::{PackageVersionRecord, VersionData};
use crate::version::SchemaVersion;

/// Parse targets and record constructor for one schema version.
pub trait ManifestSchema {
    /// The version this marker stands for.
    const VERSION: SchemaVersion;

    /// Locale field set parsed from locale, default locale and singleton files.
    type Locale: LocaleFieldSet + DeserializeOwned + Default + Clone + Send + 'static;

    /// Installer field set parsed from installer and singleton files.
    type Installer: InstallerFieldSet + DeserializeOwned + Default + Clone + Send + 'static;

    /// Wrap parsed data in the record shape for this version.
    fn into_record(data: VersionData<Self::Locale, Self::Installer>) -> PackageVersionRecord;
}

/// Schema 1.1.0.
#[derive(Debug, Clone, Copy)]
pub struct Schema1_1;

/// Schema 1.2.0.
#[derive(Debug, Clone, Copy)]
pub struct Schema1_2;

/// Schema 1.4.0.
#[derive(Debug, Clone, Copy)]
pub struct Schema1_4;

impl ManifestSchema for Schema1_1 {
    const VERSION: SchemaVersion = SchemaVersion::V1_1_0;
    type Locale = v1_1::LocaleFields;
    type Installer = v1_1::InstallerFields;

    fn into_record(data: VersionData<Self::Locale, Self::Installer>) -> PackageVersionRecord {
        PackageVersionRecord::V1_1(data)
    }
}

impl ManifestSchema for Schema1_2 {
    const VERSION: SchemaVersion = SchemaVersion::V1_2_0;
    type Locale = v1_2::LocaleFields;
    type Installer = v1_2::InstallerFields;

    fn into_record(data: VersionData<Self::Locale, Self::Installer>) -> PackageVersionRecord {
        PackageVersionRecord::V1_2(data.map_locales(v1_4::LocaleFields::from))
    }
}

impl ManifestSchema for Schema1_4 {
    const VERSION: SchemaVersion = SchemaVersion::V1_4_0;
    type Locale = v1_4::LocaleFields;
    type Installer = v1_4::InstallerFields;

    fn into_record(data: VersionData<Self::Locale, Self::Installer>) -> PackageVersionRecord {
        PackageVersionRecord::V1_2(data)
    }
}
