//! Schema 1.2.0 field sets and documents.
//!
//! 1.2.0 is 1.1.0 plus a handful of fields; the 1.1.0 sets are embedded and
//! flattened so the wire shape stays flat.

use serde::{Deserialize, Serialize};

use crate::common::{InstallationMetadata, InstallerType, NestedInstallerFile};
use crate::inherit::{Inherit, inherit_fields};
use crate::manifest::{InstallerFieldSet, LocaleFieldSet, v1_1};

/// Localized package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocaleFields {
    /// Fields shared with 1.1.0.
    #[serde(flatten)]
    pub base: v1_1::LocaleFields,
    /// Purchase page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub purchase_url: Option<String>,
    /// Notes shown after install.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub installation_notes: Option<String>,
}

/// Installer fields that may be declared at manifest level or per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallerFields {
    /// Fields shared with 1.1.0.
    #[serde(flatten)]
    pub base: v1_1::InstallerFields,
    /// Installer type inside an archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_installer_type: Option<InstallerType>,
    /// Files inside an archive.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_installer_files: Vec<NestedInstallerFile>,
    /// Installed footprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_metadata: Option<InstallationMetadata>,
    /// Arguments the installer does not accept.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub unsupported_arguments: Vec<String>,
    /// Show install warnings to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_install_warnings: Option<bool>,
}

impl Inherit for InstallerFields {
    fn inherit(&mut self, defaults: &Self) {
        self.base.inherit(&defaults.base);
        inherit_fields!(self, defaults;
            nested_installer_type,
            nested_installer_files,
            installation_metadata,
            unsupported_arguments,
            display_install_warnings,
        );
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

impl InstallerFieldSet for InstallerFields {
    fn product_code(&self) -> Option<&str> {
        self.base.product_code()
    }

    fn package_family_name(&self) -> Option<&str> {
        self.base.package_family_name()
    }

    fn commands(&self) -> &[String] {
        self.base.commands()
    }

    fn allowed_markets(&self) -> &[String] {
        self.base.allowed_markets()
    }
}

/// 1.2.0 installer entry.
pub type Installer = super::Installer<InstallerFields>;
/// 1.2.0 installer manifest.
pub type InstallerManifest = super::InstallerManifest<InstallerFields>;
/// 1.2.0 locale manifest.
pub type LocaleManifest = super::LocaleManifest<LocaleFields>;
/// 1.2.0 default locale manifest.
pub type DefaultLocaleManifest = super::DefaultLocaleManifest<LocaleFields>;
/// 1.2.0 singleton manifest.
pub type SingletonManifest = super::SingletonManifest<LocaleFields, InstallerFields>;
