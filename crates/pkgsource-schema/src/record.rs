//! Normalized, API-facing package version records.
//!
//! Manifests of every schema version collapse into one of two shapes:
//! shape A for 1.1.0 and shape B for 1.2.0 and later. The shape is fixed at
//! parse time; everything downstream goes through [`VersionView`].

use serde::Serialize;

use crate::manifest::{Installer, InstallerFieldSet, LocaleFieldSet, v1_1, v1_2, v1_4};
use crate::version::SchemaVersion;

/// A locale block: locale code plus the localized fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Locale<L> {
    /// Locale code, e.g. `en-US`.
    pub package_locale: String,
    /// Localized fields.
    #[serde(flatten)]
    pub fields: L,
}

impl<L> Locale<L> {
    /// Convert the field set, keeping the locale code.
    pub fn map<M>(self, f: impl FnOnce(L) -> M) -> Locale<M> {
        Locale {
            package_locale: self.package_locale,
            fields: f(self.fields),
        }
    }
}

/// One package version in a specific shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionData<L, F> {
    /// Identifier of the owning package.
    #[serde(skip)]
    pub package_identifier: String,
    /// Schema version of the source manifests.
    #[serde(skip)]
    pub schema_version: SchemaVersion,
    /// Package version.
    pub package_version: String,
    /// Release channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// The authoritative locale.
    pub default_locale: Locale<L>,
    /// Additional locales.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locales: Vec<Locale<L>>,
    /// Installers with manifest-level defaults already applied.
    pub installers: Vec<Installer<F>>,
}

impl<L, F> VersionData<L, F> {
    /// Convert every locale block to another field set.
    pub fn map_locales<M>(self, f: impl Fn(L) -> M) -> VersionData<M, F> {
        VersionData {
            package_identifier: self.package_identifier,
            schema_version: self.schema_version,
            package_version: self.package_version,
            channel: self.channel,
            default_locale: self.default_locale.map(&f),
            locales: self
                .locales
                .into_iter()
                .map(|locale| locale.map(&f))
                .collect(),
            installers: self.installers,
        }
    }
}

/// Shape A, produced from 1.1.0 manifests.
pub type ShapeA = VersionData<v1_1::LocaleFields, v1_1::InstallerFields>;

/// Shape B, produced from 1.2.0 and 1.4.0 manifests.
pub type ShapeB = VersionData<v1_4::LocaleFields, v1_2::InstallerFields>;

/// A normalized package version, tagged by shape.
///
/// Immutable once built; the store replaces records wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PackageVersionRecord {
    /// Built from 1.1.0 manifests.
    V1_1(ShapeA),
    /// Built from 1.2.0 or 1.4.0 manifests.
    V1_2(ShapeB),
}

impl PackageVersionRecord {
    /// Shape-independent read access.
    pub fn view(&self) -> &dyn VersionView {
        match self {
            Self::V1_1(data) => data,
            Self::V1_2(data) => data,
        }
    }
}

/// Read-only accessors shared by every record shape.
pub trait VersionView {
    /// Identifier of the owning package.
    fn package_identifier(&self) -> &str;
    /// Schema version of the source manifests.
    fn schema_version(&self) -> SchemaVersion;
    /// Package version.
    fn package_version(&self) -> &str;
    /// Release channel.
    fn channel(&self) -> Option<&str>;
    /// Default locale code.
    fn package_locale(&self) -> &str;
    /// Default-locale package name.
    fn package_name(&self) -> &str;
    /// Default-locale publisher.
    fn publisher(&self) -> &str;
    /// Default-locale short description.
    fn short_description(&self) -> &str;
    /// Default-locale moniker.
    fn moniker(&self) -> Option<&str>;
    /// Default-locale tags.
    fn tags(&self) -> &[String];
    /// Distinct installer product codes.
    fn product_codes(&self) -> Vec<&str>;
    /// Distinct installer package family names.
    fn package_family_names(&self) -> Vec<&str>;
    /// Distinct commands across installers.
    fn commands(&self) -> Vec<&str>;
    /// Distinct allowed markets across installers.
    fn allowed_markets(&self) -> Vec<&str>;
}

impl<L: LocaleFieldSet, F: InstallerFieldSet> VersionView for VersionData<L, F> {
    fn package_identifier(&self) -> &str {
        &self.package_identifier
    }

    fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    fn package_version(&self) -> &str {
        &self.package_version
    }

    fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    fn package_locale(&self) -> &str {
        &self.default_locale.package_locale
    }

    fn package_name(&self) -> &str {
        self.default_locale.fields.package_name()
    }

    fn publisher(&self) -> &str {
        self.default_locale.fields.publisher()
    }

    fn short_description(&self) -> &str {
        self.default_locale.fields.short_description()
    }

    fn moniker(&self) -> Option<&str> {
        self.default_locale.fields.moniker()
    }

    fn tags(&self) -> &[String] {
        self.default_locale.fields.tags()
    }

    fn product_codes(&self) -> Vec<&str> {
        distinct(self.installers.iter().filter_map(|i| i.fields.product_code()))
    }

    fn package_family_names(&self) -> Vec<&str> {
        distinct(
            self.installers
                .iter()
                .filter_map(|i| i.fields.package_family_name()),
        )
    }

    fn commands(&self) -> Vec<&str> {
        distinct(
            self.installers
                .iter()
                .flat_map(|i| i.fields.commands())
                .map(String::as_str),
        )
    }

    fn allowed_markets(&self) -> Vec<&str> {
        distinct(
            self.installers
                .iter()
                .flat_map(|i| i.fields.allowed_markets())
                .map(String::as_str),
        )
    }
}

impl VersionView for PackageVersionRecord {
    fn package_identifier(&self) -> &str {
        self.view().package_identifier()
    }

    fn schema_version(&self) -> SchemaVersion {
        self.view().schema_version()
    }

    fn package_version(&self) -> &str {
        self.view().package_version()
    }

    fn channel(&self) -> Option<&str> {
        self.view().channel()
    }

    fn package_locale(&self) -> &str {
        self.view().package_locale()
    }

    fn package_name(&self) -> &str {
        self.view().package_name()
    }

    fn publisher(&self) -> &str {
        self.view().publisher()
    }

    fn short_description(&self) -> &str {
        self.view().short_description()
    }

    fn moniker(&self) -> Option<&str> {
        self.view().moniker()
    }

    fn tags(&self) -> &[String] {
        self.view().tags()
    }

    fn product_codes(&self) -> Vec<&str> {
        self.view().product_codes()
    }

    fn package_family_names(&self) -> Vec<&str> {
        self.view().package_family_names()
    }

    fn commands(&self) -> Vec<&str> {
        self.view().commands()
    }

    fn allowed_markets(&self) -> Vec<&str> {
        self.view().allowed_markets()
    }
}

/// Non-empty values in first-seen order, without duplicates.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for value in values {
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
