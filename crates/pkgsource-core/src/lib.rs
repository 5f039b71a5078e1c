//! Core engine for pkgsource.
//!
//! Ingests a tree of package manifests into a concurrent in-memory store
//! and answers keyword and predicate searches over it, filtered by
//! group-based authorization rules.

pub mod auth;
pub mod ingest;
pub mod merger;
pub mod parser;
pub mod query;
pub mod store;

// Re-exports
pub use auth::{Decision, PackageRule, Rule, Ruleset};
pub use ingest::{IngestReport, Ingestor, MAX_WORKERS};
pub use merger::{ManifestGroupKey, MergeError, load_singleton, merge_group};
pub use parser::{ManifestFile, ParseError};
pub use query::{
    MatchType, PackageMatchField, SearchPredicate, UnknownMatchField, normalize_package_name,
};
pub use store::{ManifestStore, PackageMap};
