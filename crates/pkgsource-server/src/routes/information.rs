//! `GET /information`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use pkgsource_schema::SchemaVersion;
use serde::{Deserialize, Serialize};

use super::Envelope;
use crate::config::AuthMode;
use crate::server::AppState;

/// Source metadata clients read before anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Information {
    /// Identifier of this source.
    pub source_identifier: String,
    /// Protocol versions served.
    pub server_supported_versions: Vec<String>,
    /// How clients must authenticate.
    pub authentication: Authentication,
}

/// Authentication requirements advertised to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Authentication {
    /// `none` or `microsoftEntraId`.
    pub authentication_type: String,
    /// Token resource for Entra ID clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microsoft_entra_id_authentication_info: Option<EntraIdInfo>,
}

/// Entra ID token request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntraIdInfo {
    /// Resource (audience) to request a token for.
    pub resource: String,
}

/// Describe this source.
pub async fn information(State(state): State<Arc<AppState>>) -> Json<Envelope<Information>> {
    let auth = &state.config.auth;
    let authentication = match auth.mode {
        AuthMode::None => Authentication {
            authentication_type: "none".to_string(),
            microsoft_entra_id_authentication_info: None,
        },
        AuthMode::Jwt => Authentication {
            authentication_type: "microsoftEntraId".to_string(),
            microsoft_entra_id_authentication_info: auth
                .entra_resource
                .clone()
                .or_else(|| auth.audience.clone())
                .map(|resource| EntraIdInfo { resource }),
        },
    };

    Json(Envelope::new(Information {
        source_identifier: state.config.source_identifier.clone(),
        server_supported_versions: SchemaVersion::ALL
            .iter()
            .map(ToString::to_string)
            .collect(),
        authentication,
    }))
}
