//! HTTP routes exercised through the router without binding a port.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use jsonwebtoken::{EncodingKey, Header, encode};
use pkgsource_core::{ManifestStore, PackageRule, Rule, Ruleset};
use pkgsource_schema::manifest::{Installer, v1_1};
use pkgsource_schema::{Architecture, Locale, PackageVersionRecord, SchemaVersion, VersionData};
use pkgsource_server::{AppState, AuthConfig, AuthMode, Config, router};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

fn record(id: &str, version: &str, name: &str, tags: &[&str], product_code: &str) -> PackageVersionRecord {
    PackageVersionRecord::V1_1(VersionData {
        package_identifier: id.to_string(),
        schema_version: SchemaVersion::V1_1_0,
        package_version: version.to_string(),
        channel: None,
        default_locale: Locale {
            package_locale: "en-US".to_string(),
            fields: v1_1::LocaleFields {
                package_name: name.to_string(),
                publisher: format!("{name} Publisher"),
                short_description: format!("{name} does things"),
                license: "MIT".to_string(),
                tags: tags.iter().map(ToString::to_string).collect(),
                ..Default::default()
            },
        },
        locales: Vec::new(),
        installers: vec![Installer {
            architecture: Architecture::X64,
            installer_url: format!("https://example.com/{id}-{version}.exe"),
            installer_sha256: "AAAA".to_string(),
            signature_sha256: None,
            fields: v1_1::InstallerFields {
                product_code: Some(product_code.to_string()),
                ..Default::default()
            },
        }],
    })
}

fn store() -> Arc<ManifestStore> {
    let store = ManifestStore::new();
    store.set("git.install", "2.45.0", record("git.install", "2.45.0", "Git", &["vcs"], "{GIT-45}"));
    store.set("git.install", "2.46.0", record("git.install", "2.46.0", "Git", &["vcs"], "{GIT-46}"));
    store.set("Vim.Vim", "9.1", record("Vim.Vim", "9.1", "Vim", &["editor"], "{VIM}"));
    store.set(
        "JetBrains.IntelliJ",
        "2024.1",
        record("JetBrains.IntelliJ", "2024.1", "IntelliJ IDEA", &["ide"], "{IDEA}"),
    );
    store.set("Contoso.Secret", "1.0", record("Contoso.Secret", "1.0", "Secret", &["internal"], "{SECRET}"));
    Arc::new(store)
}

fn ruleset() -> Ruleset {
    Ruleset {
        global: Rule::default(),
        packages: vec![PackageRule {
            package_identifier: "Contoso.Secret".to_string(),
            package_version: None,
            rule: Rule {
                allow: vec!["engineering".to_string()],
                ..Rule::default()
            },
        }],
        default: Rule::allow_all(),
    }
}

fn app(auth: AuthConfig) -> Router {
    let config = Config {
        source_identifier: "test-source".to_string(),
        auth,
        authorization: Some(ruleset()),
        ..Config::default()
    };
    router(Arc::new(AppState::new(config, store())))
}

fn open_app() -> Router {
    app(AuthConfig::default())
}

fn jwt_app() -> Router {
    app(AuthConfig {
        mode: AuthMode::Jwt,
        hs256_secret: Some(SECRET.to_string()),
        entra_resource: Some("api://pkgsource".to_string()),
        ..AuthConfig::default()
    })
}

fn bearer(groups: &[&str]) -> String {
    let claims = json!({
        "sub": "tester",
        "exp": jsonwebtoken::get_current_timestamp() + 3600,
        "groups": groups,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await.map_err(|err| match err {})?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .context("read response body")?;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).context("parse JSON body")?
    };
    Ok((status, json))
}

async fn get(app: Router, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .context("build request")?;
    send(app, request).await
}

async fn search(app: Router, body: &Value, auth: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/manifestSearch")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .context("build request")?;
    send(app, request).await
}

fn identifiers(body: &Value) -> Vec<String> {
    body["Data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["PackageIdentifier"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_information() -> Result<()> {
    let (status, body) = get(open_app(), "/information").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"]["SourceIdentifier"], "test-source");
    assert_eq!(
        body["Data"]["ServerSupportedVersions"],
        json!(["1.1.0", "1.2.0", "1.4.0"])
    );
    assert_eq!(body["Data"]["Authentication"]["AuthenticationType"], "none");

    let (_, body) = get(jwt_app(), "/information").await?;
    assert_eq!(
        body["Data"]["Authentication"]["AuthenticationType"],
        "microsoftEntraId"
    );
    assert_eq!(
        body["Data"]["Authentication"]["MicrosoftEntraIdAuthenticationInfo"]["Resource"],
        "api://pkgsource"
    );
    Ok(())
}

#[tokio::test]
async fn test_list_packages_hides_restricted_package() -> Result<()> {
    let (status, body) = get(open_app(), "/packages").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        identifiers(&body),
        vec!["JetBrains.IntelliJ", "Vim.Vim", "git.install"]
    );
    Ok(())
}

#[tokio::test]
async fn test_package_and_versions() -> Result<()> {
    let (status, body) = get(open_app(), "/packages/git.install").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"]["PackageIdentifier"], "git.install");

    let (status, body) = get(open_app(), "/packages/git.install/versions").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"][0]["PackageVersion"], "2.46.0");
    assert_eq!(body["Data"][1]["PackageVersion"], "2.45.0");

    let (status, body) = get(open_app(), "/packages/git.install/versions/2.45.0").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"]["PackageVersion"], "2.45.0");

    let (status, body) = get(open_app(), "/packages/git.install/versions/9.9.9").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ErrorCode"], 404);
    Ok(())
}

#[tokio::test]
async fn test_versions_are_listed_newest_first_numerically() -> Result<()> {
    let store = ManifestStore::new();
    for version in ["9.0.0", "10.0.0", "10.0.0.1", "9.10"] {
        let record = record("Numeric.Order", version, "Numeric", &[], "{NUM}");
        store.set("Numeric.Order", version, record);
    }
    let app = router(Arc::new(AppState::new(Config::default(), Arc::new(store))));

    let (status, body) = get(app.clone(), "/packages/Numeric.Order/versions").await?;
    assert_eq!(status, StatusCode::OK);
    let versions: Vec<&str> = body["Data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["PackageVersion"].as_str())
        .collect();
    assert_eq!(versions, vec!["10.0.0.1", "10.0.0", "9.10", "9.0.0"]);

    let result = search(app, &json!({}), None).await?.1;
    assert_eq!(result["Data"][0]["Versions"][0]["PackageVersion"], "10.0.0.1");
    Ok(())
}

#[tokio::test]
async fn test_unknown_and_hidden_packages_are_not_found() -> Result<()> {
    for uri in [
        "/packages/Nope.Nope",
        "/packages/Contoso.Secret",
        "/packages/Contoso.Secret/versions",
        "/packageManifests/Contoso.Secret",
    ] {
        let (status, body) = get(open_app(), uri).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(body["ErrorMessage"].as_str().is_some());
    }
    Ok(())
}

#[tokio::test]
async fn test_package_manifest() -> Result<()> {
    let (status, body) = get(open_app(), "/packageManifests/git.install").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"]["PackageIdentifier"], "git.install");
    let versions = body["Data"]["Versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["DefaultLocale"]["PackageName"], "Git");
    assert_eq!(versions[0]["Installers"][0]["ProductCode"], "{GIT-46}");

    let (status, body) = get(open_app(), "/packageManifests/git.install?Version=2.45.0").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Data"]["Versions"].as_array().unwrap().len(), 1);
    assert_eq!(body["Data"]["Versions"][0]["PackageVersion"], "2.45.0");

    let (status, _) = get(open_app(), "/packageManifests/git.install?Channel=beta").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_search_by_keyword() -> Result<()> {
    let body = json!({ "Query": { "KeyWord": "VIM", "MatchType": "Substring" } });
    let (status, body) = search(open_app(), &body, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(identifiers(&body), vec!["Vim.Vim"]);
    assert_eq!(body["Data"][0]["Publisher"], "Vim Publisher");
    assert_eq!(body["Data"][0]["Versions"][0]["ProductCodes"], json!(["{VIM}"]));
    Ok(())
}

#[tokio::test]
async fn test_search_filters_and_inclusions() -> Result<()> {
    let body = json!({
        "Filters": [{
            "PackageMatchField": "PackageIdentifier",
            "RequestMatch": { "KeyWord": "git.install", "MatchType": "Exact" }
        }]
    });
    let (_, result) = search(open_app(), &body, None).await?;
    assert_eq!(identifiers(&result), vec!["git.install"]);
    assert_eq!(result["Data"][0]["Versions"].as_array().unwrap().len(), 2);

    let body = json!({
        "Inclusions": [
            { "PackageMatchField": "Tag", "RequestMatch": { "KeyWord": "editor", "MatchType": "Substring" } },
            { "PackageMatchField": "Tag", "RequestMatch": { "KeyWord": "ide", "MatchType": "Substring" } },
            { "PackageMatchField": "HasInstallerType", "RequestMatch": { "KeyWord": "msi", "MatchType": "Exact" } }
        ]
    });
    let (_, result) = search(open_app(), &body, None).await?;
    assert_eq!(identifiers(&result), vec!["JetBrains.IntelliJ", "Vim.Vim"]);
    assert_eq!(result["UnsupportedPackageMatchFields"], json!(["HasInstallerType"]));
    Ok(())
}

#[tokio::test]
async fn test_search_query_and_filters_intersect() -> Result<()> {
    let body = json!({
        "Query": { "KeyWord": "i", "MatchType": "Substring" },
        "Filters": [{
            "PackageMatchField": "Tag",
            "RequestMatch": { "KeyWord": "editor", "MatchType": "Exact" }
        }]
    });
    let (_, result) = search(open_app(), &body, None).await?;
    assert_eq!(identifiers(&result), vec!["Vim.Vim"]);
    Ok(())
}

#[tokio::test]
async fn test_search_everything_with_maximum_results() -> Result<()> {
    let (status, result) = search(open_app(), &json!({}), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(identifiers(&result).len(), 3);

    let (_, result) = search(open_app(), &json!({ "MaximumResults": 2 }), None).await?;
    assert_eq!(identifiers(&result), vec!["JetBrains.IntelliJ", "Vim.Vim"]);
    Ok(())
}

#[tokio::test]
async fn test_search_without_matches_is_no_content() -> Result<()> {
    let body = json!({ "Query": { "KeyWord": "does-not-exist", "MatchType": "Exact" } });
    let (status, result) = search(open_app(), &body, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(result, Value::Null);

    let body = json!({
        "Filters": [{
            "PackageMatchField": "PackageName",
            "RequestMatch": { "KeyWord": "Vim", "MatchType": "Fuzzy" }
        }]
    });
    let (status, _) = search(open_app(), &body, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_search_rejects_malformed_body() -> Result<()> {
    let body = json!({ "Query": { "KeyWord": "vim", "MatchType": "Telepathic" } });
    let (status, result) = search(open_app(), &body, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["ErrorCode"], 400);
    Ok(())
}

#[tokio::test]
async fn test_jwt_mode_requires_token() -> Result<()> {
    let (status, body) = get(jwt_app(), "/packages").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ErrorCode"], 401);

    let request = Request::builder()
        .uri("/packages")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .context("build request")?;
    let (status, _) = send(jwt_app(), request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(jwt_app(), "/health").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_jwt_groups_drive_visibility() -> Result<()> {
    let body = json!({ "Query": { "KeyWord": "secret", "MatchType": "Substring" } });

    let (status, _) = search(jwt_app(), &body, Some(&bearer(&["sales"]))).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, result) = search(jwt_app(), &body, Some(&bearer(&["engineering"]))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(identifiers(&result), vec!["Contoso.Secret"]);
    Ok(())
}
