//! Server configuration.
//!
//! Values come from a TOML file, then `PKGSOURCE_*` environment variables,
//! then command-line flags; later sources win. Clap reads the environment
//! variables, so [`Cli`] carries both layers of overrides.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pkgsource_core::{MAX_WORKERS, Ruleset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

/// File read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "pkgsource.toml";

/// Startup configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Config`].
    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// `log_level` is not a tracing level.
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// `auth.mode` is not a known mode.
    #[error("Unsupported authentication mode: {0}")]
    UnknownAuthMode(String),

    /// JWT mode needs a secret or a JWKS URL.
    #[error("auth.mode = \"jwt\" requires auth.hs256_secret or auth.jwks_url")]
    MissingSigningKey,

    /// `workers` is zero or above [`MAX_WORKERS`].
    #[error("workers must be between 1 and {max}, got {0}", max = MAX_WORKERS)]
    InvalidWorkers(usize),

    /// `listen` is not a socket address.
    #[error("Invalid listen address {value}: {source}")]
    InvalidListen {
        /// The rejected value.
        value: String,
        /// Underlying error.
        #[source]
        source: std::net::AddrParseError,
    },
}

/// How callers are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Anonymous access; every caller has no groups.
    #[default]
    None,
    /// Bearer JWT carrying a groups claim.
    Jwt,
}

impl AuthMode {
    /// Name used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Jwt => "jwt",
        }
    }
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "jwt" => Ok(Self::Jwt),
            _ => Err(ConfigError::UnknownAuthMode(s.to_string())),
        }
    }
}

/// `[auth]` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Authentication mode.
    pub mode: AuthMode,
    /// Shared secret for HS256 tokens.
    pub hs256_secret: Option<String>,
    /// JWKS endpoint for RS256 tokens.
    pub jwks_url: Option<String>,
    /// Required `aud`, if set.
    pub audience: Option<String>,
    /// Required `iss`, if set.
    pub issuer: Option<String>,
    /// Claim holding the caller's groups.
    pub groups_claim: String,
    /// Resource advertised to clients by `/information`.
    pub entra_resource: Option<String>,
    /// How long fetched JWKS keys are reused.
    pub jwks_cache_ttl_seconds: u64,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::None,
            hs256_secret: None,
            jwks_url: None,
            audience: None,
            issuer: None,
            groups_claim: "groups".to_string(),
            entra_resource: None,
            jwks_cache_ttl_seconds: 300,
            leeway_seconds: 60,
        }
    }
}

impl AuthConfig {
    /// The HS256 secret, unless absent or empty.
    pub fn signing_secret(&self) -> Option<&str> {
        self.hs256_secret.as_deref().filter(|secret| !secret.is_empty())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("hs256_secret", &self.hs256_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwks_url", &self.jwks_url)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("groups_claim", &self.groups_claim)
            .field("entra_resource", &self.entra_resource)
            .field("jwks_cache_ttl_seconds", &self.jwks_cache_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Socket address to listen on.
    pub listen: String,
    /// Root of the manifest tree.
    pub manifest_dir: PathBuf,
    /// Ingestion concurrency; defaults to the number of CPUs.
    pub workers: Option<usize>,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Identifier reported by `/information`.
    pub source_identifier: String,
    /// Authentication settings.
    pub auth: AuthConfig,
    /// Visibility rules. Absent means everything is visible.
    pub authorization: Option<Ruleset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:7070".to_string(),
            manifest_dir: PathBuf::from("./manifests"),
            workers: None,
            log_level: "info".to_string(),
            source_identifier: "pkgsource".to_string(),
            auth: AuthConfig::default(),
            authorization: None,
        }
    }
}

impl Config {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] naming `origin` if the document is
    /// invalid.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load the file named by `path`, or [`DEFAULT_CONFIG_FILE`] if it
    /// exists, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&content, &path)
    }

    /// Load the file selected by the CLI and apply every override.
    ///
    /// # Errors
    ///
    /// Returns any loading, override or validation error.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::load(cli.config.as_deref())?;
        config.apply_overrides(cli)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment and flag overrides carried by `cli`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAuthMode`] for an invalid `--auth-mode`.
    pub fn apply_overrides(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(listen) = &cli.listen {
            self.listen.clone_from(listen);
        }
        if let Some(dir) = &cli.manifest_dir {
            self.manifest_dir.clone_from(dir);
        }
        if cli.workers.is_some() {
            self.workers = cli.workers;
        }
        if let Some(level) = &cli.log_level {
            self.log_level.clone_from(level);
        }
        if let Some(id) = &cli.source_identifier {
            self.source_identifier.clone_from(id);
        }
        if let Some(mode) = &cli.auth_mode {
            self.auth.mode = mode.parse()?;
        }
        if cli.hs256_secret.is_some() {
            self.auth.hs256_secret.clone_from(&cli.hs256_secret);
        }
        if cli.jwks_url.is_some() {
            self.auth.jwks_url.clone_from(&cli.jwks_url);
        }
        Ok(())
    }

    /// Check everything that would otherwise fail later at runtime.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        if let Some(workers) = self.workers.filter(|w| !(1..=MAX_WORKERS).contains(w)) {
            return Err(ConfigError::InvalidWorkers(workers));
        }
        if self.auth.mode == AuthMode::Jwt
            && self.auth.signing_secret().is_none()
            && self.auth.jwks_url.as_deref().is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingSigningKey);
        }
        Ok(())
    }

    /// The parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidListen`] if `listen` does not parse.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|source| ConfigError::InvalidListen {
                value: self.listen.clone(),
                source,
            })
    }

    /// The authorization ruleset in effect.
    pub fn ruleset(&self) -> Ruleset {
        self.authorization.clone().unwrap_or_else(Ruleset::allow_all)
    }
}
