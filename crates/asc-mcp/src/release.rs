// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release orchestration: move one App Store version one step toward release.
//!
//! Each call resolves app, build and version, then takes the single action
//! the version's current state calls for and returns. It never polls for the
//! version to advance further.

use serde_json::{json, Value};
use tracing::info;

use crate::error::AscError;
use crate::upstream::resources::{AppStoreState, AppStoreVersion, Build, Page};
use crate::upstream::AppStoreClient;

/// Platform assumed when a caller does not name one.
pub const DEFAULT_PLATFORM: &str = "IOS";

/// Which version to release and with which build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub bundle_id: String,
    pub version: String,
    pub build_number: String,
    pub platform: String,
}

/// What to do for a version in a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseAction {
    /// Attach the build, then submit for review.
    AttachAndSubmit,
    /// Approved and held; ask for release.
    RequestRelease,
    /// Already submitted; nothing to do.
    AwaitingReview,
    /// Already live; nothing to do.
    AlreadyLive,
    /// A state this orchestrator does not act on.
    Unhandled(String),
}

impl ReleaseAction {
    pub fn for_state(state: &AppStoreState) -> Self {
        match state {
            AppStoreState::PrepareForSubmission => Self::AttachAndSubmit,
            AppStoreState::PendingDeveloperRelease => Self::RequestRelease,
            AppStoreState::WaitingForReview => Self::AwaitingReview,
            AppStoreState::ReadyForSale => Self::AlreadyLive,
            AppStoreState::Other(raw) => Self::Unhandled(raw.clone()),
        }
    }

    /// Whether the action changes anything upstream.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::AttachAndSubmit | Self::RequestRelease)
    }
}

/// Resolve a bundle ID to the App Store Connect app ID.
pub async fn resolve_app_id(client: &AppStoreClient, bundle_id: &str) -> Result<String, AscError> {
    client
        .find_app(bundle_id)
        .await?
        .and_then(|app| app.get("id").and_then(Value::as_str).map(str::to_owned))
        .ok_or_else(|| AscError::NotFound(format!("App with bundle ID {bundle_id} not found.")))
}

/// Resolve (version, build number) to a build ID among the app's builds.
pub async fn resolve_build_id(
    client: &AppStoreClient,
    app_id: &str,
    version: &str,
    build_number: &str,
) -> Result<String, AscError> {
    let page = Page::<Build>::from_value(&client.list_builds(app_id).await?)?;
    page.find_build_id(version, build_number).map(str::to_owned).ok_or_else(|| {
        AscError::NotFound(format!(
            "Could not find build for version {version} and build number {build_number}"
        ))
    })
}

/// Find the existing App Store version record for a version string.
pub async fn resolve_version(
    client: &AppStoreClient,
    app_id: &str,
    version: &str,
) -> Result<AppStoreVersion, AscError> {
    let page = Page::<AppStoreVersion>::from_value(&client.list_versions(app_id).await?)?;
    page.find_version(version).cloned().ok_or_else(|| {
        AscError::NotFound(format!(
            "Version {version} not found. Please create it on App Store Connect first."
        ))
    })
}

/// Drive one version one step toward release.
pub async fn release_version(
    client: &AppStoreClient,
    request: &ReleaseRequest,
) -> Result<Value, AscError> {
    let app_id = resolve_app_id(client, &request.bundle_id).await?;
    let build_id =
        resolve_build_id(client, &app_id, &request.version, &request.build_number).await?;
    let record = resolve_version(client, &app_id, &request.version).await?;

    let state = record.state()?;
    let action = ReleaseAction::for_state(state);
    info!(
        bundle_id = %request.bundle_id,
        version = %request.version,
        build_id = %build_id,
        platform = %request.platform,
        state = %state,
        ?action,
        mutating = action.is_mutating(),
        "release step"
    );

    match action {
        ReleaseAction::AttachAndSubmit => {
            client.attach_build(&record.id, &build_id).await?;
            client.submit_for_review(&record.id).await
        }
        ReleaseAction::RequestRelease => client.request_release(&record.id).await,
        ReleaseAction::AwaitingReview => Ok(json!({
            "status": "Already in 'WAITING_FOR_REVIEW' state. No action taken."
        })),
        ReleaseAction::AlreadyLive => Ok(json!({
            "status": "Version is already 'READY_FOR_SALE'. No action taken."
        })),
        ReleaseAction::Unhandled(raw) => Ok(json!({
            "status": format!("Version is in an unhandled state: '{raw}'. No action taken."),
            "state": raw,
        })),
    }
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
