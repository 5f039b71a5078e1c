//! Schema 1.4.0 field sets and documents.
//!
//! Only the locale facet changed since 1.2.0; installers reuse the 1.2.0 set.

use serde::{Deserialize, Serialize};

use crate::common::Documentation;
use crate::manifest::{LocaleFieldSet, v1_2};

pub use v1_2::InstallerFields;

/// Localized package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocaleFields {
    /// Fields shared with 1.2.0.
    #[serde(flatten)]
    pub base: v1_2::LocaleFields,
    /// Documentation links.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentations: Vec<Documentation>,
}

impl From<v1_2::LocaleFields> for LocaleFields {
    fn from(base: v1_2::LocaleFields) -> Self {
        Self {
            base,
            documentations: Vec::new(),
        }
    }
}

impl LocaleFieldSet for LocaleFields {
    fn package_name(&self) -> &str {
        self.base.package_name()
    }

    fn publisher(&self) -> &str {
        self.base.publisher()
    }

    fn short_description(&self) -> &str {
        self.base.short_description()
    }

    fn license(&self) -> &str {
        self.base.license()
    }

    fn moniker(&self) -> Option<&str> {
        self.base.moniker()
    }

    fn tags(&self) -> &[String] {
        self.base.tags()
    }
}

/// 1.4.0 installer entry.
pub type Installer = super::Installer<InstallerFields>;
/// 1.4.0 installer manifest.
pub type InstallerManifest = super::InstallerManifest<InstallerFields>;
/// 1.4.0 locale manifest.
pub type LocaleManifest = super::LocaleManifest<LocaleFields>;
/// 1.4.0 default locale manifest.
pub type DefaultLocaleManifest = super::DefaultLocaleManifest<LocaleFields>;
/// 1.4.0 singleton manifest.
pub type SingletonManifest = super::SingletonManifest<LocaleFields, InstallerFields>;
