//! `GET /packages` and its version sub-resources.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use pkgsource_schema::{PackageVersionRecord, VersionView};
use serde::{Deserialize, Serialize};

use super::{Envelope, Visibility};
use crate::auth::CallerGroups;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// One package in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageSummary {
    /// Package identifier.
    pub package_identifier: String,
}

/// One version in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionSummary {
    /// Package version.
    pub package_version: String,
    /// Release channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl From<&PackageVersionRecord> for VersionSummary {
    fn from(record: &PackageVersionRecord) -> Self {
        Self {
            package_version: record.package_version().to_string(),
            channel: record.channel().map(str::to_string),
        }
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError::not_found(format!("Package {id} not found"))
}

/// Every package visible to the caller, sorted by identifier.
pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    Extension(groups): Extension<CallerGroups>,
) -> Json<Envelope<Vec<PackageSummary>>> {
    let visibility = Visibility::new(&state, &groups);
    let mut ids: Vec<String> = state
        .store
        .get_all_package_identifiers()
        .into_iter()
        .filter(|id| visibility.allows(id))
        .collect();
    ids.sort();

    Json(Envelope::new(
        ids.into_iter()
            .map(|package_identifier| PackageSummary { package_identifier })
            .collect(),
    ))
}

/// One package, if stored and visible.
///
/// # Errors
///
/// 404 when the package is unknown or hidden.
pub async fn get_package(
    State(state): State<Arc<AppState>>,
    Extension(groups): Extension<CallerGroups>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<PackageSummary>>> {
    if !state.store.contains_package(&id) || !Visibility::new(&state, &groups).allows(&id) {
        return Err(not_found(&id));
    }
    Ok(Json(Envelope::new(PackageSummary {
        package_identifier: id,
    })))
}

/// Every version of a package, newest first by version string.
///
/// # Errors
///
/// 404 when the package is unknown or hidden.
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    Extension(groups): Extension<CallerGroups>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<Vec<VersionSummary>>>> {
    if !Visibility::new(&state, &groups).allows(&id) {
        return Err(not_found(&id));
    }
    let records = super::sorted_versions(state.store.get_all_versions(&id));
    if records.is_empty() {
        return Err(not_found(&id));
    }
    Ok(Json(Envelope::new(
        records.iter().map(|r| VersionSummary::from(r.as_ref())).collect(),
    )))
}

/// One version of a package.
///
/// # Errors
///
/// 404 when the package or version is unknown, or the package is hidden.
pub async fn get_version(
    State(state): State<Arc<AppState>>,
    Extension(groups): Extension<CallerGroups>,
    Path((id, version)): Path<(String, String)>,
) -> ApiResult<Json<Envelope<VersionSummary>>> {
    if !Visibility::new(&state, &groups).allows(&id) {
        return Err(not_found(&id));
    }
    let record = state.store.get(&id, &version).ok_or_else(|| {
        ApiError::not_found(format!("Version {version} of package {id} not found"))
    })?;
    Ok(Json(Envelope::new(VersionSummary::from(record.as_ref()))))
}
