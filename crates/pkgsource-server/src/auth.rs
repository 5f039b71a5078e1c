//! Bearer-token authentication.
//!
//! In `jwt` mode every request must carry `Authorization: Bearer <jwt>`.
//! The token is verified with either a shared HS256 secret or keys from a
//! JWKS endpoint, and the caller's groups are read from the configured
//! claim. In `none` mode every caller is anonymous with no groups.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::server::AppState;

/// Why a request was not authenticated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header.
    #[error("Authorization header required")]
    MissingToken,

    /// The header is not a bearer token.
    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    /// Signature, expiry, audience or issuer check failed.
    #[error("Invalid bearer token")]
    InvalidToken,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::unauthorized(err.to_string())
    }
}

/// Group memberships of the authenticated caller.
///
/// Inserted as a request extension by [`auth_middleware`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerGroups(pub Vec<String>);

#[derive(Debug, Clone)]
struct CachedJwks {
    set: Arc<JwkSet>,
    fetched_at: Instant,
}

impl CachedJwks {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Verifies bearer tokens and extracts group memberships.
#[derive(Debug)]
pub struct JwtVerifier {
    config: AuthConfig,
    jwks_cache: RwLock<Option<CachedJwks>>,
    http: reqwest::Client,
}

impl JwtVerifier {
    /// Create a verifier for the given settings.
    pub fn new(config: AuthConfig) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to configure HTTP client; using defaults");
                reqwest::Client::new()
            }
        };

        Self {
            config,
            jwks_cache: RwLock::new(None),
            http,
        }
    }

    /// Verify `token` and return the caller's groups.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token fails verification.
    pub async fn verify(&self, token: &str) -> Result<Vec<String>, AuthError> {
        let claims = if let Some(secret) = self.config.signing_secret() {
            self.decode_hs256(token, secret)?
        } else if self.config.jwks_url.is_some() {
            self.decode_with_jwks(token).await?
        } else {
            tracing::error!("JWT auth is enabled but no signing key source is configured");
            return Err(AuthError::InvalidToken);
        };

        if has_groups_overage(&claims) {
            tracing::warn!(
                "Token carries a groups overage claim; group list may be incomplete"
            );
        }

        Ok(self.extract_groups(&claims))
    }

    fn decode_hs256(&self, token: &str, secret: &str) -> Result<Value, AuthError> {
        let validation = self.validation_for(Algorithm::HS256);
        decode::<Value>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|t| t.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    async fn decode_with_jwks(&self, token: &str) -> Result<Value, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or(AuthError::InvalidToken)?;
        let jwk = self.get_jwk(&kid).await?.ok_or(AuthError::InvalidToken)?;
        if !key_accepts(&jwk, header.alg) {
            tracing::warn!(
                alg = ?header.alg,
                kid = %kid,
                "Token algorithm does not match its JWKS key"
            );
            return Err(AuthError::InvalidToken);
        }
        let key = DecodingKey::from_jwk(&jwk).map_err(|_| AuthError::InvalidToken)?;

        // jsonwebtoken rejects the key unless every listed algorithm fits it.
        let validation = self.validation_for(header.alg);

        decode::<Value>(token, &key, &validation)
            .map(|t| t.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    fn validation_for(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = self.config.leeway_seconds;

        if let Some(aud) = self.config.audience.as_deref() {
            validation.set_audience(&[aud]);
        } else {
            validation.validate_aud = false;
        }
        if let Some(iss) = self.config.issuer.as_deref() {
            validation.set_issuer(&[iss]);
        }
        validation
    }

    /// Missing or non-array claims yield no groups.
    fn extract_groups(&self, claims: &Value) -> Vec<String> {
        claims
            .get(&self.config.groups_claim)
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn get_jwk(&self, kid: &str) -> Result<Option<Jwk>, AuthError> {
        let ttl = Duration::from_secs(self.config.jwks_cache_ttl_seconds);
        if let Some(jwk) = self.cached_jwk(kid, ttl).await {
            return Ok(Some(jwk));
        }
        self.refresh_jwks().await?;
        Ok(self.cached_jwk(kid, ttl).await)
    }

    async fn cached_jwk(&self, kid: &str, ttl: Duration) -> Option<Jwk> {
        let cache = self.jwks_cache.read().await;
        let set = match cache.as_ref() {
            Some(cached) if cached.is_fresh(ttl) => Arc::clone(&cached.set),
            _ => return None,
        };
        drop(cache);

        set.keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .cloned()
    }

    async fn refresh_jwks(&self) -> Result<(), AuthError> {
        let Some(url) = self.config.jwks_url.as_deref() else {
            return Ok(());
        };

        let set = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| {
                tracing::warn!(error = %err, "Failed to fetch JWKS");
                AuthError::InvalidToken
            })?
            .json::<JwkSet>()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "Invalid JWKS document");
                AuthError::InvalidToken
            })?;

        *self.jwks_cache.write().await = Some(CachedJwks {
            set: Arc::new(set),
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

/// Only RS256 against RSA keys and ES256 against EC keys are accepted from
/// a JWKS.
fn key_accepts(jwk: &Jwk, alg: Algorithm) -> bool {
    matches!(
        (&jwk.algorithm, alg),
        (AlgorithmParameters::RSA(_), Algorithm::RS256)
            | (AlgorithmParameters::EllipticCurve(_), Algorithm::ES256)
    )
}

/// True when the identity provider left groups out of the token.
pub fn has_groups_overage(claims: &Value) -> bool {
    let names = claims
        .get("_claim_names")
        .and_then(|names| names.get("groups"))
        .is_some();
    let flag = claims.get("hasgroups").and_then(Value::as_bool) == Some(true);
    names || flag
}

fn bearer_token(req: &Request) -> Result<&str, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

/// Resolve the caller's groups and attach them to the request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let groups = match state.verifier.as_deref() {
        None => Vec::new(),
        Some(verifier) => {
            let token = match bearer_token(&req) {
                Ok(token) => token.to_string(),
                Err(err) => return ApiError::from(err).into_response(),
            };
            match verifier.verify(&token).await {
                Ok(groups) => groups,
                Err(err) => return ApiError::from(err).into_response(),
            }
        }
    };

    req.extensions_mut().insert(CallerGroups(groups));
    next.run(req).await
}
