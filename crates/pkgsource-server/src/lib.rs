//! REST package source server.
//!
//! Serves a directory of package manifests over the package-manager REST
//! source protocol. The manifest tree is ingested into memory at startup;
//! requests are answered from the in-memory store and filtered through
//! group-based authorization rules.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;

// Re-exports
pub use cli::Cli;
pub use config::{AuthConfig, AuthMode, Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use server::{AppState, router, serve};
