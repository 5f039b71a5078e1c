//! `POST /manifestSearch`.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use pkgsource_core::query::keyword_matches;
use pkgsource_core::{MatchType, PackageMap, PackageMatchField, SearchPredicate};
use pkgsource_schema::{PackageVersionRecord, VersionView};
use serde::{Deserialize, Serialize};

use super::{Visibility, sorted_versions};
use crate::auth::CallerGroups;
use crate::error::ApiResult;
use crate::server::AppState;

/// A keyword and how to compare it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestMatch {
    /// The keyword.
    pub key_word: String,
    /// Comparison to apply.
    pub match_type: MatchType,
}

/// One inclusion or filter as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageMatchFilter {
    /// Field name; unknown names are reported back, not rejected.
    pub package_match_field: String,
    /// Keyword and comparison.
    pub request_match: RequestMatch,
}

/// Search request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ManifestSearchRequest {
    /// Truncate to this many packages; 0 means no limit.
    pub maximum_results: usize,
    /// Accepted for compatibility; every version is always returned.
    pub fetch_all_manifests: bool,
    /// Keyword search on package name and short description.
    pub query: Option<RequestMatch>,
    /// At least one must match, if any are given.
    pub inclusions: Vec<PackageMatchFilter>,
    /// All must match.
    pub filters: Vec<PackageMatchFilter>,
}

/// One version in a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchVersion {
    /// Package version.
    pub package_version: String,
    /// Release channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Distinct package family names across installers.
    pub package_family_names: Vec<String>,
    /// Distinct product codes across installers.
    pub product_codes: Vec<String>,
}

impl From<&PackageVersionRecord> for SearchVersion {
    fn from(record: &PackageVersionRecord) -> Self {
        Self {
            package_version: record.package_version().to_string(),
            channel: record.channel().map(str::to_string),
            package_family_names: record
                .package_family_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            product_codes: record
                .product_codes()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One package in a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    /// Package identifier.
    pub package_identifier: String,
    /// Package name of the newest version.
    pub package_name: String,
    /// Publisher of the newest version.
    pub publisher: String,
    /// Matching versions, newest first.
    pub versions: Vec<SearchVersion>,
}

/// Search response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestSearchResponse {
    /// Matching packages, sorted by identifier.
    pub data: Vec<SearchResult>,
    /// Requested match fields this server ignored.
    pub unsupported_package_match_fields: Vec<String>,
    /// Match fields a request must carry; always empty.
    pub required_package_match_fields: Vec<String>,
}

/// Convert wire predicates, collecting unknown field names.
fn predicates(filters: &[PackageMatchFilter], unsupported: &mut Vec<String>) -> Vec<SearchPredicate> {
    let mut out = Vec::with_capacity(filters.len());
    for filter in filters {
        match filter.package_match_field.parse::<PackageMatchField>() {
            Ok(field) => out.push(SearchPredicate::new(
                field,
                filter.request_match.match_type,
                filter.request_match.key_word.clone(),
            )),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring match field");
                if !unsupported.contains(&filter.package_match_field) {
                    unsupported.push(filter.package_match_field.clone());
                }
            }
        }
    }
    out
}

fn into_result(package_identifier: String, records: Vec<Arc<PackageVersionRecord>>) -> SearchResult {
    let records = sorted_versions(records);
    let (package_name, publisher) = records
        .first()
        .map(|r| (r.package_name().to_string(), r.publisher().to_string()))
        .unwrap_or_default();
    SearchResult {
        package_identifier,
        package_name,
        publisher,
        versions: records.iter().map(|r| SearchVersion::from(r.as_ref())).collect(),
    }
}

/// Keyword and predicate search over every visible package.
///
/// A query alone is a keyword search, predicates alone a match-filter
/// search, both their intersection, and neither returns everything.
///
/// # Errors
///
/// 400 when the body is not a valid search request. An empty result is
/// 204 No Content.
pub async fn manifest_search(
    State(state): State<Arc<AppState>>,
    Extension(groups): Extension<CallerGroups>,
    body: Result<Json<ManifestSearchRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body?;

    let mut unsupported = Vec::new();
    let inclusions = predicates(&request.inclusions, &mut unsupported);
    let filters = predicates(&request.filters, &mut unsupported);
    let has_predicates = !inclusions.is_empty() || !filters.is_empty();

    let mut matches: PackageMap = match (&request.query, has_predicates) {
        (None, false) => state.store.get_all(),
        (Some(query), false) => state.store.get_by_keyword(&query.key_word),
        (None, true) => state.store.get_by_match_filter(&inclusions, &filters),
        (Some(query), true) => {
            let mut matches = state.store.get_by_match_filter(&inclusions, &filters);
            matches.retain(|_, records| {
                records.retain(|record| keyword_matches(record, &query.key_word));
                !records.is_empty()
            });
            matches
        }
    };

    let visibility = Visibility::new(&state, &groups);
    matches.retain(|id, _| visibility.allows(id));

    let mut packages: Vec<_> = matches.into_iter().collect();
    packages.sort_by(|a, b| a.0.cmp(&b.0));
    if request.maximum_results > 0 {
        packages.truncate(request.maximum_results);
    }

    if packages.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let response = ManifestSearchResponse {
        data: packages
            .into_iter()
            .map(|(id, records)| into_result(id, records))
            .collect(),
        unsupported_package_match_fields: unsupported,
        required_package_match_fields: Vec::new(),
    };
    Ok(Json(response).into_response())
}
