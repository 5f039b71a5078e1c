//! `GET /packageManifests/{id}`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use pkgsource_schema::{PackageVersionRecord, VersionView};
use serde::{Deserialize, Serialize};

use super::{Envelope, Visibility, sorted_versions};
use crate::auth::CallerGroups;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Optional narrowing of the returned versions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestQuery {
    /// Only this version.
    pub version: Option<String>,
    /// Only versions on this channel.
    pub channel: Option<String>,
}

/// Full manifest data for a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageManifest {
    /// Package identifier.
    pub package_identifier: String,
    /// Matching versions, newest first.
    pub versions: Vec<Arc<PackageVersionRecord>>,
}

/// Every matching version of a package with all locales and installers.
///
/// # Errors
///
/// 404 when the package is unknown or hidden, or nothing matches the query.
pub async fn get_manifest(
    State(state): State<Arc<AppState>>,
    Extension(groups): Extension<CallerGroups>,
    Path(id): Path<String>,
    Query(query): Query<ManifestQuery>,
) -> ApiResult<Json<Envelope<PackageManifest>>> {
    if !Visibility::new(&state, &groups).allows(&id) {
        return Err(ApiError::not_found(format!("Package {id} not found")));
    }

    let versions: Vec<_> = sorted_versions(state.store.get_all_versions(&id))
        .into_iter()
        .filter(|record| {
            query
                .version
                .as_deref()
                .is_none_or(|v| record.package_version() == v)
        })
        .filter(|record| {
            query
                .channel
                .as_deref()
                .is_none_or(|c| record.channel() == Some(c))
        })
        .collect();

    if versions.is_empty() {
        return Err(ApiError::not_found(format!(
            "No manifest found for package {id}"
        )));
    }

    Ok(Json(Envelope::new(PackageManifest {
        package_identifier: id,
        versions,
    })))
}
