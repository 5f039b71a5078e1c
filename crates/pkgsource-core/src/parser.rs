//! Manifest file parsing.
//!
//! Every candidate file is pre-parsed for its four identifying fields before
//! anything else happens. Files without them are not manifests and are
//! skipped quietly; the source tree may hold unrelated YAML.

use std::fs;
use std::path::{Path, PathBuf};

use pkgsource_schema::{ManifestHeader, ManifestType, SchemaError, SchemaVersion};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur while reading or parsing a manifest file.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file could not be read.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid document of the requested shape.
    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The manifest type or schema version is not supported.
    #[error("Unsupported manifest {}: {source}", path.display())]
    Unsupported {
        /// File being classified.
        path: PathBuf,
        /// Which marker was rejected.
        #[source]
        source: SchemaError,
    },
}

/// A file recognized as a manifest, with its markers resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    /// Location on disk.
    pub path: PathBuf,
    /// The identifying fields.
    pub header: ManifestHeader,
    /// Resolved `ManifestType`.
    pub manifest_type: ManifestType,
    /// Resolved `ManifestVersion`.
    pub schema_version: SchemaVersion,
}

/// Returns `true` for `.yaml` and `.yml` files.
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Extract the identifying fields from YAML text.
///
/// Returns `None` when the text is not a mapping or any of the four fields
/// is empty.
pub fn header_from_str(content: &str) -> Option<ManifestHeader> {
    serde_yaml_ng::from_str::<ManifestHeader>(content)
        .ok()
        .filter(ManifestHeader::is_manifest)
}

/// Read a file and extract its identifying fields.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read. A readable file
/// that is not a manifest yields `Ok(None)`.
pub fn read_header(path: &Path) -> Result<Option<ManifestHeader>, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(header_from_str(&content))
}

/// Resolve the manifest type and schema version markers of a header.
///
/// # Errors
///
/// Returns the [`SchemaError`] for an unknown manifest type or an
/// unsupported schema version.
pub fn classify(header: &ManifestHeader) -> Result<(ManifestType, SchemaVersion), SchemaError> {
    let manifest_type = header.manifest_type.parse::<ManifestType>()?;
    let schema_version = header.manifest_version.parse::<SchemaVersion>()?;
    Ok((manifest_type, schema_version))
}

/// Pre-parse and classify one file.
///
/// # Errors
///
/// Returns [`ParseError::Io`] for unreadable files and
/// [`ParseError::Unsupported`] for manifests with markers this server does
/// not understand. Files that are not manifests yield `Ok(None)`.
pub fn inspect(path: &Path) -> Result<Option<ManifestFile>, ParseError> {
    let Some(header) = read_header(path)? else {
        return Ok(None);
    };

    let (manifest_type, schema_version) =
        classify(&header).map_err(|source| ParseError::Unsupported {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Some(ManifestFile {
        path: path.to_path_buf(),
        header,
        manifest_type,
        schema_version,
    }))
}

/// Fully parse a file into a typed document.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read or
/// [`ParseError::Yaml`] if it does not match `T`.
pub fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml_ng::from_str(&content).map_err(|source| ParseError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
