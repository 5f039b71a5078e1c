//! Leaf types shared by every manifest schema version and by the
//! normalized record shapes.
//!
//! All structs use `PascalCase` keys, which is what both the YAML manifests
//! and the REST wire format use.

use serde::{Deserialize, Serialize};

use crate::inherit::Unset;

/// CPU architecture an installer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 32-bit Intel/AMD.
    X86,
    /// 64-bit Intel/AMD.
    X64,
    /// 32-bit ARM.
    Arm,
    /// 64-bit ARM.
    Arm64,
    /// Runs on any architecture.
    #[default]
    Neutral,
}

impl Architecture {
    /// Wire name of the architecture.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installer technology.
///
/// `portable` only exists from schema 1.2.0 onwards; older manifests simply
/// never use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerType {
    /// MSIX package.
    Msix,
    /// Windows Installer package.
    Msi,
    /// APPX package.
    Appx,
    /// Generic executable installer.
    Exe,
    /// Zip archive (optionally wrapping a nested installer).
    Zip,
    /// Inno Setup installer.
    Inno,
    /// Nullsoft (NSIS) installer.
    Nullsoft,
    /// WiX-authored MSI.
    Wix,
    /// WiX Burn bundle.
    Burn,
    /// Progressive web app.
    Pwa,
    /// Microsoft Store listing.
    Msstore,
    /// Standalone executable, no install step.
    Portable,
}

/// Install scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Per-user install.
    User,
    /// Machine-wide install.
    Machine,
}

/// Interaction mode supported by an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallMode {
    /// Installer shows its UI.
    Interactive,
    /// No UI at all.
    Silent,
    /// Progress UI only.
    SilentWithProgress,
}

/// What an installer does when a previous version is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeBehavior {
    /// Install over the top.
    Install,
    /// Remove the previous version first.
    UninstallPrevious,
}

/// Elevation requirement of an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElevationRequirement {
    /// Must be launched elevated.
    ElevationRequired,
    /// Must not be launched elevated.
    ElevationProhibited,
    /// Requests elevation on its own.
    ElevatesSelf,
}

/// Command-line switches passed to an installer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallerSwitches {
    /// Switches for a fully silent install.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub silent: Option<String>,
    /// Switches for a silent install that shows progress.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub silent_with_progress: Option<String>,
    /// Switches for an interactive install.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub interactive: Option<String>,
    /// Switch template for the install location.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub install_location: Option<String>,
    /// Switch template for the log file.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub log: Option<String>,
    /// Extra switches used on upgrade.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub upgrade: Option<String>,
    /// Switches always appended.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom: Option<String>,
}

/// A non-zero installer exit code with a known meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExpectedReturnCode {
    /// The raw exit code.
    pub installer_return_code: i64,
    /// Symbolic meaning, e.g. `packageInUse`.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub return_response: String,
    /// More information about the code (schema 1.2.0+).
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub return_response_url: Option<String>,
}

/// Dependency on another package from the same source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageDependency {
    /// Identifier of the required package.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub package_identifier: String,
    /// Lowest acceptable version.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_version: Option<String>,
}

/// Everything an installer needs present before it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Dependencies {
    /// Windows optional features.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub windows_features: Vec<String>,
    /// Windows libraries.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub windows_libraries: Vec<String>,
    /// Packages from this source.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub package_dependencies: Vec<PackageDependency>,
    /// Dependencies outside any package manager.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub external_dependencies: Vec<String>,
}

/// Market restrictions for an installer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Markets {
    /// Markets the installer may be offered in.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub allowed_markets: Vec<String>,
    /// Markets the installer must not be offered in.
    #[serde(deserialize_with = "crate::scalar::string_vec", skip_serializing_if = "Vec::is_empty")]
    pub excluded_markets: Vec<String>,
}

/// How the installed product shows up in Add/Remove Programs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppsAndFeaturesEntry {
    /// Display name.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    /// Publisher shown in ARP.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub publisher: Option<String>,
    /// Version shown in ARP.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_version: Option<String>,
    /// Product code registered by the installer.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub product_code: Option<String>,
    /// MSI upgrade code.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub upgrade_code: Option<String>,
    /// Installer type that produced the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer_type: Option<InstallerType>,
}

/// A license or terms agreement shown before install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Agreement {
    /// Label for the agreement.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub agreement_label: Option<String>,
    /// Agreement text.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub agreement: Option<String>,
    /// Link to the agreement.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub agreement_url: Option<String>,
}

/// A file inside an archive installer (schema 1.2.0+).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NestedInstallerFile {
    /// Path of the file relative to the archive root.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub relative_file_path: String,
    /// Command alias for portable nested installers.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub portable_command_alias: Option<String>,
}

/// One file recorded in [`InstallationMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallationMetadataFile {
    /// Path relative to the install location.
    #[serde(deserialize_with = "crate::scalar::string")]
    pub relative_file_path: String,
    /// Expected hash of the file.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_sha256: Option<String>,
    /// `launch`, `uninstall` or `other`.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_type: Option<String>,
    /// Parameters used when invoking the file.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub invocation_parameter: Option<String>,
    /// Display name of the file.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
}

/// Details about an installed product's footprint (schema 1.2.0+).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstallationMetadata {
    /// Default install location.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_install_location: Option<String>,
    /// Files written by the installer.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<InstallationMetadataFile>,
}

/// Link to package documentation (schema 1.4.0+).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Documentation {
    /// Label for the document.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_label: Option<String>,
    /// Document link.
    #[serde(
        deserialize_with = "crate::scalar::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_url: Option<String>,
}

impl Unset for InstallerSwitches {
    fn is_unset(&self) -> bool {
        self.silent.is_unset()
            && self.silent_with_progress.is_unset()
            && self.interactive.is_unset()
            && self.install_location.is_unset()
            && self.log.is_unset()
            && self.upgrade.is_unset()
            && self.custom.is_unset()
    }
}

impl Unset for Dependencies {
    fn is_unset(&self) -> bool {
        self.windows_features.is_empty()
            && self.windows_libraries.is_empty()
            && self.package_dependencies.is_empty()
            && self.external_dependencies.is_empty()
    }
}

impl Unset for Markets {
    fn is_unset(&self) -> bool {
        self.allowed_markets.is_empty() && self.excluded_markets.is_empty()
    }
}

impl Unset for InstallationMetadata {
    fn is_unset(&self) -> bool {
        self.default_install_location.is_unset() && self.files.is_empty()
    }
}

crate::inherit::always_set!(
    Architecture,
    InstallerType,
    Scope,
    InstallMode,
    UpgradeBehavior,
    ElevationRequirement,
);
