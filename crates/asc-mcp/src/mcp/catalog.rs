// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed tool catalog advertised by `tools/list`.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::AscError;

pub const TOOL_PREFIX: &str = "app-store-connect/";

const BUNDLE_ID: Param =
    Param { name: "bundleId", description: "The bundle ID of the app", required: true };
const GROUP_ID: Param =
    Param { name: "groupId", description: "The ID of the beta group", required: true };
const VERSION: Param = Param {
    name: "version",
    description: "The version string to submit (e.g., '1.2.3')",
    required: true,
};

/// One input parameter of a tool. Every parameter is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ListApps,
    GetAppInfo,
    ListBetaTesters,
    ListBetaGroups,
    ListTestersInGroup,
    ListBuilds,
    SubmitForReview,
    CreateBetaGroup,
    AddBetaTesterToGroup,
    ReleaseVersion,
    GetPerformanceMetrics,
}

impl Tool {
    /// Catalog order as advertised by `tools/list`.
    pub const ALL: [Tool; 11] = [
        Tool::ListApps,
        Tool::GetAppInfo,
        Tool::ListBetaTesters,
        Tool::ListBetaGroups,
        Tool::ListTestersInGroup,
        Tool::ListBuilds,
        Tool::SubmitForReview,
        Tool::CreateBetaGroup,
        Tool::AddBetaTesterToGroup,
        Tool::ReleaseVersion,
        Tool::GetPerformanceMetrics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListApps => "app-store-connect/list-apps",
            Self::GetAppInfo => "app-store-connect/get-app-info",
            Self::ListBetaTesters => "app-store-connect/list-beta-testers",
            Self::ListBetaGroups => "app-store-connect/list-beta-groups",
            Self::ListTestersInGroup => "app-store-connect/list-testers-in-group",
            Self::ListBuilds => "app-store-connect/list-builds",
            Self::SubmitForReview => "app-store-connect/submit-for-review",
            Self::CreateBetaGroup => "app-store-connect/create-beta-group",
            Self::AddBetaTesterToGroup => "app-store-connect/add-beta-tester-to-group",
            Self::ReleaseVersion => "app-store-connect/release-version",
            Self::GetPerformanceMetrics => "app-store-connect/get-performance-metrics",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let short = name.strip_prefix(TOOL_PREFIX)?;
        Some(match short {
            "list-apps" => Self::ListApps,
            "get-app-info" => Self::GetAppInfo,
            "list-beta-testers" => Self::ListBetaTesters,
            "list-beta-groups" => Self::ListBetaGroups,
            "list-testers-in-group" => Self::ListTestersInGroup,
            "list-builds" => Self::ListBuilds,
            "submit-for-review" => Self::SubmitForReview,
            "create-beta-group" => Self::CreateBetaGroup,
            "add-beta-tester-to-group" => Self::AddBetaTesterToGroup,
            "release-version" => Self::ReleaseVersion,
            "get-performance-metrics" => Self::GetPerformanceMetrics,
            _ => return None,
        })
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ListApps => "List all apps in App Store Connect",
            Self::GetAppInfo => "Get detailed information about an app",
            Self::ListBetaTesters | Self::ListTestersInGroup => {
                "List all beta testers in a specific group"
            }
            Self::ListBetaGroups => "List all beta groups for an app",
            Self::ListBuilds => "List all builds for an app",
            Self::SubmitForReview => "Submit an app version for review",
            Self::CreateBetaGroup => "Create a new beta group",
            Self::AddBetaTesterToGroup => "Add a beta tester to a group",
            Self::ReleaseVersion => "Release a new version of an app",
            Self::GetPerformanceMetrics => "Get performance metrics for an app",
        }
    }

    pub fn params(&self) -> &'static [Param] {
        match self {
            Self::ListApps => &[],
            Self::GetAppInfo
            | Self::ListBetaGroups
            | Self::ListBuilds
            | Self::GetPerformanceMetrics => &[BUNDLE_ID],
            Self::ListBetaTesters | Self::ListTestersInGroup => &[GROUP_ID],
            Self::SubmitForReview => &[BUNDLE_ID, VERSION],
            Self::CreateBetaGroup => &[
                Param { name: "name", description: "The name of the beta group", required: true },
                Param {
                    name: "bundleId",
                    description: "The bundle ID of the app to create the group for",
                    required: true,
                },
            ],
            Self::AddBetaTesterToGroup => &[
                Param { name: "email", description: "The tester's email address", required: true },
                GROUP_ID,
            ],
            Self::ReleaseVersion => &[
                BUNDLE_ID,
                Param {
                    name: "version",
                    description: "The version string to release (e.g., '1.2.3')",
                    required: true,
                },
                Param {
                    name: "buildNumber",
                    description: "The build number to attach to the version",
                    required: true,
                },
                Param {
                    name: "platform",
                    description: "The platform of the version (defaults to IOS)",
                    required: false,
                },
            ],
        }
    }

    pub fn required(&self) -> impl Iterator<Item = &'static str> {
        self.params().iter().filter(|p| p.required).map(|p| p.name)
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        let mut properties = Map::new();
        for param in self.params() {
            properties.insert(
                param.name.to_owned(),
                json!({ "type": "string", "description": param.description }),
            );
        }
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": self.required().collect::<Vec<_>>(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Descriptors for every tool, in catalog order.
pub fn descriptors() -> Vec<ToolDescriptor> {
    Tool::ALL.iter().map(Tool::descriptor).collect()
}

/// Check the catalog is self-consistent: unique prefixed names that resolve
/// back to their tool.
pub fn verify() -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    for tool in Tool::ALL {
        let name = tool.name();
        anyhow::ensure!(name.starts_with(TOOL_PREFIX), "tool {name} lacks prefix {TOOL_PREFIX}");
        anyhow::ensure!(seen.insert(name), "duplicate tool name {name}");
        anyhow::ensure!(
            Tool::from_name(name) == Some(tool),
            "tool name {name} does not resolve to {tool:?}"
        );
    }
    Ok(())
}

/// Arguments of a `tools/call`, normalized to strings.
///
/// Empty strings count as absent. Numbers are accepted and stringified, so a
/// caller sending `"buildNumber": 42` is not rejected.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Fail with every missing required parameter of `tool`, in catalog order.
    pub fn validate(&self, tool: Tool) -> Result<(), AscError> {
        let missing: Vec<&'static str> =
            tool.required().filter(|k| self.get(k).is_none()).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AscError::Validation { missing })
        }
    }

    /// A required value. Call after [`Arguments::validate`].
    pub fn required(&self, key: &'static str) -> Result<String, AscError> {
        self.get(key).ok_or_else(|| AscError::Validation { missing: vec![key] })
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
