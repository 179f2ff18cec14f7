// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the App Store Connect API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::{json, Value};

use crate::credential::TokenProvider;
use crate::error::AscError;

/// Page size used when listing builds.
pub const BUILD_PAGE_SIZE: u32 = 50;

const XCODE_METRICS_ACCEPT: &str = "application/vnd.apple.xcode-metrics+json, application/json";

/// Authenticated App Store Connect client.
///
/// Each call fetches headers from the shared [`TokenProvider`], so a token
/// renewed midway through a sequence of calls is picked up immediately.
pub struct AppStoreClient {
    base_url: String,
    tokens: Arc<TokenProvider>,
    client: Client,
}

impl AppStoreClient {
    pub fn new(
        base_url: &str,
        tokens: Arc<TokenProvider>,
        timeout: Duration,
    ) -> Result<Self, AscError> {
        crate::ensure_crypto();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_owned(), tokens, client })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, AscError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            AscError::Config(format!("invalid api url {}{path}: {e}", self.base_url))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<RequestBuilder, AscError> {
        Ok(self.client.request(method, self.url(path, query)?))
    }

    /// Attach fresh credentials, send, and decode the body.
    ///
    /// Non-2xx responses become [`AscError::Remote`] with the raw body.
    /// An empty 2xx body decodes to `null`.
    async fn send(&self, req: RequestBuilder) -> Result<Value, AscError> {
        let headers = self.tokens.bearer_headers()?;
        let resp = req.headers(headers).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::debug!(status = status.as_u16(), %body, "api request failed");
            return Err(AscError::Remote { status: status.as_u16(), body });
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AscError> {
        self.send(self.request(Method::GET, path, query)?).await
    }

    async fn write(&self, method: Method, path: &str, body: &Value) -> Result<Value, AscError> {
        self.send(self.request(method, path, &[])?.json(body)).await
    }

    // -- Apps -----------------------------------------------------------------

    pub async fn list_apps(&self) -> Result<Value, AscError> {
        self.get("/apps", &[]).await
    }

    /// First app whose bundle ID matches, if any.
    pub async fn find_app(&self, bundle_id: &str) -> Result<Option<Value>, AscError> {
        let page = self.get("/apps", &[("filter[bundleId]", bundle_id)]).await?;
        Ok(first_item(page))
    }

    pub async fn perf_power_metrics(&self, app_id: &str) -> Result<Value, AscError> {
        let req = self
            .request(Method::GET, &format!("/apps/{app_id}/perfPowerMetrics"), &[])?
            .header(ACCEPT, HeaderValue::from_static(XCODE_METRICS_ACCEPT));
        self.send(req).await
    }

    // -- Builds ---------------------------------------------------------------

    /// Builds for an app with their pre-release versions included.
    pub async fn list_builds(&self, app_id: &str) -> Result<Value, AscError> {
        let limit = BUILD_PAGE_SIZE.to_string();
        self.get(
            "/builds",
            &[("filter[app]", app_id), ("include", "preReleaseVersion"), ("limit", &limit)],
        )
        .await
    }

    // -- Beta testing ---------------------------------------------------------

    pub async fn list_beta_groups(&self, app_id: &str) -> Result<Value, AscError> {
        self.get("/betaGroups", &[("filter[app]", app_id)]).await
    }

    pub async fn create_beta_group(&self, app_id: &str, name: &str) -> Result<Value, AscError> {
        let body = json!({
            "data": {
                "type": "betaGroups",
                "attributes": { "name": name },
                "relationships": {
                    "app": { "data": { "type": "apps", "id": app_id } }
                }
            }
        });
        self.write(Method::POST, "/betaGroups", &body).await
    }

    pub async fn list_testers_in_group(&self, group_id: &str) -> Result<Value, AscError> {
        self.get(&format!("/betaGroups/{group_id}/betaTesters"), &[]).await
    }

    /// Create (or invite) a tester and place them in the given groups.
    pub async fn add_tester_to_groups(
        &self,
        email: &str,
        group_ids: &[&str],
    ) -> Result<Value, AscError> {
        let body = json!({
            "data": {
                "type": "betaTesters",
                "attributes": { "email": email },
                "relationships": {
                    "betaGroups": { "data": group_linkages(group_ids) }
                }
            }
        });
        self.write(Method::POST, "/betaTesters", &body).await
    }

    /// ID of the tester with this email on the given app, if any.
    pub async fn find_tester(&self, email: &str, app_id: &str) -> Result<Option<String>, AscError> {
        let page =
            self.get("/betaTesters", &[("filter[email]", email), ("filter[apps]", app_id)]).await?;
        Ok(first_item(page)
            .and_then(|tester| tester.get("id").and_then(Value::as_str).map(str::to_owned)))
    }

    pub async fn remove_tester_from_groups(
        &self,
        tester_id: &str,
        group_ids: &[&str],
    ) -> Result<Value, AscError> {
        let body = json!({ "data": group_linkages(group_ids) });
        let path = format!("/betaTesters/{tester_id}/relationships/betaGroups");
        self.write(Method::DELETE, &path, &body).await
    }

    // -- App Store versions ---------------------------------------------------

    pub async fn list_versions(&self, app_id: &str) -> Result<Value, AscError> {
        self.get(&format!("/apps/{app_id}/appStoreVersions"), &[]).await
    }

    pub async fn create_version(
        &self,
        app_id: &str,
        version_string: &str,
        platform: &str,
    ) -> Result<Value, AscError> {
        let body = json!({
            "data": {
                "type": "appStoreVersions",
                "attributes": { "versionString": version_string, "platform": platform },
                "relationships": {
                    "app": { "data": { "type": "apps", "id": app_id } }
                }
            }
        });
        self.write(Method::POST, "/appStoreVersions", &body).await
    }

    /// Point a version at a build.
    pub async fn attach_build(&self, version_id: &str, build_id: &str) -> Result<Value, AscError> {
        let body = json!({ "data": { "type": "builds", "id": build_id } });
        let path = format!("/appStoreVersions/{version_id}/relationships/build");
        self.write(Method::PATCH, &path, &body).await
    }

    pub async fn submit_for_review(&self, version_id: &str) -> Result<Value, AscError> {
        let body = version_relationship("appStoreVersionSubmissions", version_id);
        self.write(Method::POST, "/appStoreVersionSubmissions", &body).await
    }

    /// Release a version that is pending developer release.
    pub async fn request_release(&self, version_id: &str) -> Result<Value, AscError> {
        let body = version_relationship("appStoreVersionReleaseRequests", version_id);
        self.write(Method::POST, "/appStoreVersionReleaseRequests", &body).await
    }
}

fn first_item(mut page: Value) -> Option<Value> {
    match page.get_mut("data").map(Value::take) {
        Some(Value::Array(items)) => items.into_iter().next(),
        _ => None,
    }
}

fn group_linkages(group_ids: &[&str]) -> Value {
    group_ids.iter().map(|id| json!({ "type": "betaGroups", "id": id })).collect()
}

fn version_relationship(kind: &str, version_id: &str) -> Value {
    json!({
        "data": {
            "type": kind,
            "relationships": {
                "appStoreVersion": { "data": { "type": "appStoreVersions", "id": version_id } }
            }
        }
    })
}
