// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed views over the few API documents release orchestration reads.
//!
//! Only the fields the orchestrator depends on are modeled; everything else
//! in the JSON:API payload is ignored.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// A JSON:API collection document.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default)]
    pub data: Vec<T>,
    #[serde(default)]
    pub included: Vec<Included>,
}

impl<T: serde::de::DeserializeOwned> Page<T> {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Side-loaded resource from `include=`.
#[derive(Debug, Clone, Deserialize)]
pub struct Included {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<ResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub id: String,
    #[serde(default)]
    pub attributes: BuildAttributes,
    #[serde(default)]
    pub relationships: BuildRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildAttributes {
    /// The build number (`CFBundleVersion`), not the marketing version.
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRelationships {
    #[serde(default)]
    pub pre_release_version: Option<Relationship>,
}

impl Page<Build> {
    /// ID of the first build, in listed order, whose build number and linked
    /// pre-release version string both match.
    ///
    /// Builds without a linked (and included) pre-release version never match.
    pub fn find_build_id(&self, version: &str, build_number: &str) -> Option<&str> {
        let marketing: HashMap<&str, &str> = self
            .included
            .iter()
            .filter(|item| item.kind == "preReleaseVersions")
            .filter_map(|item| Some((item.id.as_str(), item.attributes.get("version")?.as_str()?)))
            .collect();

        self.data
            .iter()
            .find(|build| {
                let Some(linked) =
                    build.relationships.pre_release_version.as_ref().and_then(|r| r.data.as_ref())
                else {
                    return false;
                };
                marketing.get(linked.id.as_str()) == Some(&version)
                    && build.attributes.version.as_deref() == Some(build_number)
            })
            .map(|build| build.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppStoreVersion {
    pub id: String,
    #[serde(default)]
    pub attributes: VersionAttributes,
}

/// Both fields are optional so one odd record does not fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionAttributes {
    #[serde(default)]
    pub version_string: Option<String>,
    #[serde(default)]
    pub app_store_state: Option<AppStoreState>,
}

impl AppStoreVersion {
    /// The record's state. A record without one is not usable.
    pub fn state(&self) -> Result<&AppStoreState, serde_json::Error> {
        self.attributes
            .app_store_state
            .as_ref()
            .ok_or_else(|| serde::de::Error::missing_field("appStoreState"))
    }
}

impl Page<AppStoreVersion> {
    /// First version whose version string matches exactly.
    pub fn find_version(&self, version: &str) -> Option<&AppStoreVersion> {
        self.data.iter().find(|v| v.attributes.version_string.as_deref() == Some(version))
    }
}

/// Lifecycle state of an App Store version.
///
/// Only the states release orchestration acts on get their own variant;
/// anything else is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AppStoreState {
    PrepareForSubmission,
    PendingDeveloperRelease,
    WaitingForReview,
    ReadyForSale,
    Other(String),
}

impl AppStoreState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PrepareForSubmission => "PREPARE_FOR_SUBMISSION",
            Self::PendingDeveloperRelease => "PENDING_DEVELOPER_RELEASE",
            Self::WaitingForReview => "WAITING_FOR_REVIEW",
            Self::ReadyForSale => "READY_FOR_SALE",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for AppStoreState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PREPARE_FOR_SUBMISSION" => Self::PrepareForSubmission,
            "PENDING_DEVELOPER_RELEASE" => Self::PendingDeveloperRelease,
            "WAITING_FOR_REVIEW" => Self::WaitingForReview,
            "READY_FOR_SALE" => Self::ReadyForSale,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for AppStoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
