// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public App Store Connect operations.
//!
//! Every operation returns a JSON payload. Expected failures (validation,
//! lookups that find nothing, non-2xx API answers) come back as payloads
//! carrying an `error` field; only faults such as unreadable credentials or
//! a dead network surface as `Err`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::credential::{CredentialConfig, TokenProvider};
use crate::error::AscError;
use crate::release::{self, resolve_app_id, resolve_version, ReleaseRequest};
use crate::upstream::AppStoreClient;

/// Convert expected failures into result payloads; pass faults through.
pub fn settle(result: Result<Value, AscError>) -> Result<Value, AscError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => match err.to_payload() {
            Some(payload) => {
                let status = err.http_status();
                if matches!(err, AscError::Remote { .. }) {
                    warn!(status, err = %err, "app store connect request failed");
                } else {
                    debug!(status, err = %err, "operation answered with error payload");
                }
                Ok(payload)
            }
            None => Err(err),
        },
    }
}

/// Facade over the App Store Connect operations exposed as tools.
pub struct AppStore {
    client: AppStoreClient,
}

impl AppStore {
    pub fn new(client: AppStoreClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, AscError> {
        let tokens = Arc::new(TokenProvider::new(CredentialConfig::from(config)));
        let client = AppStoreClient::new(&config.base_url, tokens, config.request_timeout())?;
        Ok(Self::new(client))
    }

    pub async fn list_apps(&self) -> Result<Value, AscError> {
        settle(self.client.list_apps().await)
    }

    pub async fn get_app_info(&self, bundle_id: &str) -> Result<Value, AscError> {
        settle(match self.client.find_app(bundle_id).await {
            Ok(Some(app)) => Ok(app),
            Ok(None) => Err(AscError::NotFound("App not found".into())),
            Err(err) => Err(err),
        })
    }

    pub async fn list_builds(&self, bundle_id: &str) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            self.client.list_builds(&app_id).await
        }
        .await)
    }

    pub async fn list_beta_groups(&self, bundle_id: &str) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            self.client.list_beta_groups(&app_id).await
        }
        .await)
    }

    pub async fn list_testers_in_group(&self, group_id: &str) -> Result<Value, AscError> {
        settle(self.client.list_testers_in_group(group_id).await)
    }

    pub async fn create_beta_group(&self, name: &str, bundle_id: &str) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            self.client.create_beta_group(&app_id, name).await
        }
        .await)
    }

    pub async fn add_tester_to_group(
        &self,
        email: &str,
        group_id: &str,
    ) -> Result<Value, AscError> {
        settle(self.client.add_tester_to_groups(email, &[group_id]).await)
    }

    /// Remove a tester from one group. `removed` is false when no tester
    /// with that email exists on the app.
    pub async fn remove_tester_from_group(
        &self,
        email: &str,
        group_id: &str,
        bundle_id: &str,
    ) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            let Some(tester_id) = self.client.find_tester(email, &app_id).await? else {
                return Ok(json!({ "removed": false }));
            };
            self.client.remove_tester_from_groups(&tester_id, &[group_id]).await?;
            Ok::<_, AscError>(json!({ "removed": true }))
        }
        .await)
    }

    pub async fn get_performance_metrics(&self, bundle_id: &str) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            self.client.perf_power_metrics(&app_id).await
        }
        .await)
    }

    /// Submit an existing version for review with whatever build it has.
    pub async fn submit_for_review(
        &self,
        bundle_id: &str,
        version: &str,
    ) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            let record = resolve_version(&self.client, &app_id, version).await?;
            self.client.submit_for_review(&record.id).await
        }
        .await)
    }

    pub async fn create_version(
        &self,
        bundle_id: &str,
        version: &str,
        platform: &str,
    ) -> Result<Value, AscError> {
        settle(async {
            let app_id = resolve_app_id(&self.client, bundle_id).await?;
            self.client.create_version(&app_id, version, platform).await
        }
        .await)
    }

    pub async fn release_version(&self, request: &ReleaseRequest) -> Result<Value, AscError> {
        settle(release::release_version(&self.client, request).await)
    }
}
