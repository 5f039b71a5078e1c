//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Serve a directory of package manifests over the REST source protocol.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "pkgsource")]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "PKGSOURCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:7070
    #[arg(long, env = "PKGSOURCE_LISTEN")]
    pub listen: Option<String>,

    /// Root of the manifest tree
    #[arg(short, long, env = "PKGSOURCE_MANIFEST_DIR")]
    pub manifest_dir: Option<PathBuf>,

    /// Directories ingested concurrently
    #[arg(short, long, env = "PKGSOURCE_WORKERS")]
    pub workers: Option<usize>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "PKGSOURCE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Identifier reported by /information
    #[arg(long, env = "PKGSOURCE_SOURCE_IDENTIFIER")]
    pub source_identifier: Option<String>,

    /// Authentication mode (none, jwt)
    #[arg(long, env = "PKGSOURCE_AUTH_MODE")]
    pub auth_mode: Option<String>,

    /// Shared secret for HS256 bearer tokens
    #[arg(long, env = "PKGSOURCE_AUTH_HS256_SECRET", hide_env_values = true)]
    pub hs256_secret: Option<String>,

    /// JWKS endpoint for RS256 bearer tokens
    #[arg(long, env = "PKGSOURCE_AUTH_JWKS_URL")]
    pub jwks_url: Option<String>,
}
