//! REST source protocol routes.
//!
//! Every successful body is wrapped as `{"Data": ...}`. Packages hidden
//! from the caller are indistinguishable from absent ones.

pub mod information;
pub mod manifests;
pub mod packages;
pub mod search;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use pkgsource_core::Decision;
use pkgsource_schema::{PackageVersionRecord, VersionView, compare_package_versions};
use serde::{Deserialize, Serialize};

use crate::auth::CallerGroups;
use crate::server::AppState;

/// The `{"Data": ...}` wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    /// The payload.
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap a payload.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Routes that need an authenticated caller.
pub fn protected() -> Router<Arc<AppState>> {
    Router::new()
        .route("/packages", get(packages::list_packages))
        .route("/packages/{id}", get(packages::get_package))
        .route("/packages/{id}/versions", get(packages::list_versions))
        .route(
            "/packages/{id}/versions/{version}",
            get(packages::get_version),
        )
        .route("/packageManifests/{id}", get(manifests::get_manifest))
        .route("/manifestSearch", post(search::manifest_search))
}

/// Routes open to everyone.
pub fn public() -> Router<Arc<AppState>> {
    Router::new().route("/information", get(information::information))
}

/// Visibility check bound to one caller.
pub(crate) struct Visibility<'a> {
    state: &'a AppState,
    groups: &'a [String],
    global: Decision,
}

impl<'a> Visibility<'a> {
    pub(crate) fn new(state: &'a AppState, groups: &'a CallerGroups) -> Self {
        let global = state.ruleset.evaluate_global_rule(&groups.0);
        Self {
            state,
            groups: &groups.0,
            global,
        }
    }

    pub(crate) fn allows(&self, package_id: &str) -> bool {
        self.state
            .ruleset
            .filter_authorized_package(self.global, package_id, self.groups)
    }
}

/// Newest first.
pub(crate) fn sorted_versions(
    mut records: Vec<Arc<PackageVersionRecord>>,
) -> Vec<Arc<PackageVersionRecord>> {
    records.sort_by(|a, b| {
        compare_package_versions(b.package_version(), a.package_version())
    });
    records
}
