//! Schema 1.1.0 field sets and documents.

use serde::{Deserialize, Serialize};

use crate::common::{
    Agreement, AppsAndFeaturesEntry, Architecture, Dependencies, ElevationRequirement,
    ExpectedReturnCode, InstallMode, InstallerSwitches, InstallerType, Markets, Scope,
    UpgradeBehavior,
};
use crate::inherit::{Inherit, inherit_fields};
use crate::manifest::{InstallerFieldSet, LocaleFieldSet};

/// Localized package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocaleFields {
    /// Publisher name.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub publisher: String,
    /// Publisher home page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher_url: Option<String>,
    /// Publisher support page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher_support_url: Option<String>,
    /// Privacy policy.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub privacy_url: Option<String>,
    /// Package author.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,
    /// Display name of the package.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub package_name: String,
    /// Package home page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub package_url: Option<String>,
    /// License name or SPDX identifier.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub license: String,
    /// License page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub license_url: Option<String>,
    /// Copyright notice.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub copyright: Option<String>,
    /// Copyright page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub copyright_url: Option<String>,
    /// One-line description.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub short_description: String,
    /// Full description.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Common short name, e.g. `vscode`.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub moniker: Option<String>,
    /// Search tags.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Agreements shown before install.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agreements: Vec<Agreement>,
    /// Release notes text.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_notes: Option<String>,
    /// Release notes page.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_notes_url: Option<String>,
}

/// Installer fields that may be declared at manifest level or per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallerFields {
    /// Installer UI locale.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub installer_locale: Option<String>,
    /// Supported platforms, e.g. `Windows.Desktop`.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub platform: Vec<String>,
    /// Lowest supported OS version.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        rename = "MinimumOSVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_os_version: Option<String>,
    /// Installer technology.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_type: Option<InstallerType>,
    /// Install scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Supported interaction modes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub install_modes: Vec<InstallMode>,
    /// Installer switches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_switches: Option<InstallerSwitches>,
    /// Exit codes meaning success besides 0.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub installer_success_codes: Vec<i64>,
    /// Known non-success exit codes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected_return_codes: Vec<ExpectedReturnCode>,
    /// Upgrade behavior.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_behavior: Option<UpgradeBehavior>,
    /// Commands provided by the package.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    /// URL protocols handled by the package.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    /// File extensions handled by the package.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub file_extensions: Vec<String>,
    /// Install-time dependencies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Dependencies>,
    /// MSIX package family name.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub package_family_name: Option<String>,
    /// Product code registered by the installer.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_code: Option<String>,
    /// MSIX capabilities.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    /// MSIX restricted capabilities.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub restricted_capabilities: Vec<String>,
    /// Market restrictions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markets: Option<Markets>,
    /// Installer aborts the terminal it runs in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_aborts_terminal: Option<bool>,
    /// Release date of the installer.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_date: Option<String>,
    /// An install location must be supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_location_required: Option<bool>,
    /// Only upgrade when explicitly requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_explicit_upgrade: Option<bool>,
    /// Elevation requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_requirement: Option<ElevationRequirement>,
    /// Architectures the installer refuses to run on.
    #[serde(
        rename = "UnsupportedOSArchitectures",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub unsupported_os_architectures: Vec<Architecture>,
    /// Add/Remove Programs entries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub apps_and_features_entries: Vec<AppsAndFeaturesEntry>,
}

impl Inherit for InstallerFields {
    fn inherit(&mut self, defaults: &Self) {
        inherit_fields!(self, defaults;
            installer_locale,
            platform,
            minimum_os_version,
            installer_type,
            scope,
            install_modes,
            installer_switches,
            installer_success_codes,
            expected_return_codes,
            upgrade_behavior,
            commands,
            protocols,
            file_extensions,
            dependencies,
            package_family_name,
            product_code,
            capabilities,
            restricted_capabilities,
            markets,
            installer_aborts_terminal,
            release_date,
            install_location_required,
            require_explicit_upgrade,
            elevation_requirement,
            unsupported_os_architectures,
            apps_and_features_entries,
        );
    }
}

impl LocaleFieldSet for LocaleFields {
    fn package_name(&self) -> &str {
        &self.package_name
    }

    fn publisher(&self) -> &str {
        &self.publisher
    }

    fn short_description(&self) -> &str {
        &self.short_description
    }

    fn license(&self) -> &str {
        &self.license
    }

    fn moniker(&self) -> Option<&str> {
        self.moniker.as_deref()
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl InstallerFieldSet for InstallerFields {
    fn product_code(&self) -> Option<&str> {
        self.product_code.as_deref()
    }

    fn package_family_name(&self) -> Option<&str> {
        self.package_family_name.as_deref()
    }

    fn commands(&self) -> &[String] {
        &self.commands
    }

    fn allowed_markets(&self) -> &[String] {
        self.markets
            .as_ref()
            .map_or(&[], |markets| markets.allowed_markets.as_slice())
    }
}

/// 1.1.0 installer entry.
pub type Installer = super::Installer<InstallerFields>;
/// 1.1.0 installer manifest.
pub type InstallerManifest = super::InstallerManifest<InstallerFields>;
/// 1.1.0 locale manifest.
pub type LocaleManifest = super::LocaleManifest<LocaleFields>;
/// 1.1.0 default locale manifest.
pub type DefaultLocaleManifest = super::DefaultLocaleManifest<LocaleFields>;
/// 1.1.0 singleton manifest.
pub type SingletonManifest = super::SingletonManifest<LocaleFields, InstallerFields>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::common::PackageDependency;

    /// Every field set, with values derived from `tag`.
    pub(crate) fn populated(tag: &str, alt: bool) -> InstallerFields {
        let s = |name: &str| format!("{tag}-{name}");
        InstallerFields {
            installer_locale: Some(s("locale")),
            platform: vec![s("platform")],
            minimum_os_version: Some(s("os")),
            installer_type: Some(if alt { InstallerType::Exe } else { InstallerType::Msi }),
            scope: Some(if alt { Scope::User } else { Scope::Machine }),
            install_modes: vec![if alt { InstallMode::Silent } else { InstallMode::Interactive }],
            installer_switches: Some(InstallerSwitches {
                silent: Some(s("silent")),
                ..InstallerSwitches::default()
            }),
            installer_success_codes: vec![if alt { 3010 } else { 1641 }],
            expected_return_codes: vec![ExpectedReturnCode {
                installer_return_code: 1618,
                return_response: s("response"),
                return_response_url: None,
            }],
            upgrade_behavior: Some(if alt {
                UpgradeBehavior::UninstallPrevious
            } else {
                UpgradeBehavior::Install
            }),
            commands: vec![s("command")],
            protocols: vec![s("protocol")],
            file_extensions: vec![s("ext")],
            dependencies: Some(Dependencies {
                package_dependencies: vec![PackageDependency {
                    package_identifier: s("dep"),
                    minimum_version: None,
                }],
                ..Dependencies::default()
            }),
            package_family_name: Some(s("pfn")),
            product_code: Some(s("product")),
            capabilities: vec![s("cap")],
            restricted_capabilities: vec![s("restricted")],
            markets: Some(Markets {
                allowed_markets: vec![s("market")],
                excluded_markets: Vec::new(),
            }),
            installer_aborts_terminal: Some(true),
            release_date: Some(s("date")),
            install_location_required: Some(true),
            require_explicit_upgrade: Some(true),
            elevation_requirement: Some(if alt {
                ElevationRequirement::ElevatesSelf
            } else {
                ElevationRequirement::ElevationRequired
            }),
            unsupported_os_architectures: vec![if alt { Architecture::Arm } else { Architecture::X86 }],
            apps_and_features_entries: vec![AppsAndFeaturesEntry {
                display_name: Some(s("arp")),
                ..AppsAndFeaturesEntry::default()
            }],
        }
    }

    const INSTALLER: &str = r"
PackageIdentifier: Baz.Qux
PackageVersion: 2.0.0
Scope: machine
InstallerType: msi
Commands:
  - qux
InstallerSwitches:
  Silent: /quiet
ProductCode: '{11111111-2222-3333-4444-555555555555}'
Installers:
  - Architecture: x64
    InstallerUrl: https://example.com/qux-x64.msi
    InstallerSha256: AAAA
  - Architecture: arm64
    InstallerUrl: https://example.com/qux-arm64.exe
    InstallerSha256: BBBB
    InstallerType: exe
    Scope: user
    ProductCode: '{99999999-2222-3333-4444-555555555555}'
ManifestType: installer
ManifestVersion: 1.1.0
";

    #[test]
    fn test_parse_installer_manifest() {
        let manifest: InstallerManifest = serde_yaml_ng::from_str(INSTALLER).unwrap();
        assert_eq!(manifest.package_identifier, "Baz.Qux");
        assert_eq!(manifest.defaults.scope, Some(Scope::Machine));
        assert_eq!(manifest.installers.len(), 2);
        assert_eq!(manifest.installers[1].architecture, Architecture::Arm64);
    }

    #[test]
    fn test_manifest_defaults_fill_installer_fields() {
        let manifest: InstallerManifest = serde_yaml_ng::from_str(INSTALLER).unwrap();
        let installers = manifest.into_installers();

        let x64 = &installers[0].fields;
        assert_eq!(x64.installer_type, Some(InstallerType::Msi));
        assert_eq!(x64.scope, Some(Scope::Machine));
        assert_eq!(x64.commands, vec!["qux".to_string()]);
        assert_eq!(
            x64.installer_switches.as_ref().and_then(|s| s.silent.as_deref()),
            Some("/quiet")
        );

        let arm = &installers[1].fields;
        assert_eq!(arm.installer_type, Some(InstallerType::Exe));
        assert_eq!(arm.scope, Some(Scope::User));
        assert_eq!(
            arm.product_code.as_deref(),
            Some("{99999999-2222-3333-4444-555555555555}")
        );
        assert_eq!(arm.commands, vec!["qux".to_string()]);
    }

    #[test]
    fn test_inherit_leaves_fields_empty_when_both_unset() {
        let mut fields = InstallerFields::default();
        fields.inherit(&InstallerFields::default());
        assert_eq!(fields, InstallerFields::default());
    }

    #[test]
    fn test_parse_locale_manifest() {
        let yaml = r"
PackageIdentifier: Baz.Qux
PackageVersion: 2.0.0
PackageLocale: en-US
Publisher: Baz Corp
PackageName: Qux
License: MIT
ShortDescription: The qux tool
Moniker: qux
Tags: [cli, editor]
ManifestType: defaultLocale
ManifestVersion: 1.1.0
";
        let manifest: DefaultLocaleManifest = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(manifest.package_locale, "en-US");
        assert_eq!(manifest.fields.package_name(), "Qux");
        assert_eq!(manifest.fields.moniker(), Some("qux"));
        assert_eq!(manifest.fields.tags().len(), 2);
    }

    #[test]
    fn test_empty_entry_takes_every_default() {
        let defaults = populated("manifest", false);
        let mut entry = InstallerFields::default();
        entry.inherit(&defaults);
        assert_eq!(entry, defaults);
    }

    #[test]
    fn test_populated_entry_keeps_every_value() {
        let original = populated("entry", true);
        let mut entry = original.clone();
        entry.inherit(&populated("manifest", false));
        assert_eq!(entry, original);
    }

    #[test]
    fn test_defaults_inherited_into_themselves_are_unchanged() {
        let defaults = populated("manifest", false);
        let mut copy = defaults.clone();
        copy.inherit(&defaults);
        assert_eq!(copy, defaults);
    }
}
