// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use serde_json::{json, Value};

/// JSON-RPC error codes written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    ServerError,
}

impl ErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::ServerError => -32000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::MethodNotFound => "METHOD_NOT_FOUND",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::ServerError => "SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of an App Store Connect operation.
///
/// `Validation`, `NotFound` and `Remote` are expected outcomes and are
/// handed back to callers as result payloads (see [`AscError::to_payload`]).
/// The remaining variants are faults that abort the enclosing operation.
#[derive(Debug)]
pub enum AscError {
    /// Required arguments were missing or empty. Raised before any remote call.
    Validation { missing: Vec<&'static str> },
    /// An app, build, version or tester lookup found no match.
    NotFound(String),
    /// The API answered with a non-2xx status.
    Remote { status: u16, body: String },
    /// Credential material or endpoint configuration is unusable.
    Config(String),
    /// The request never produced a response (connect, timeout, TLS).
    Transport(reqwest::Error),
    /// A 2xx response body was not the JSON we expected.
    Decode(serde_json::Error),
}

impl AscError {
    /// HTTP-like status for expected outcomes.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(400),
            Self::NotFound(_) => Some(404),
            Self::Remote { status, .. } => Some(*status),
            Self::Config(_) | Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Render an expected outcome as a result payload. Returns `None` for faults.
    pub fn to_payload(&self) -> Option<Value> {
        match self {
            Self::Validation { .. } => Some(json!({ "error": self.to_string(), "status": 400 })),
            Self::NotFound(message) => Some(json!({ "error": message })),
            Self::Remote { status, body } => {
                Some(match serde_json::from_str::<Value>(body) {
                    Ok(decoded) => {
                        json!({ "error": "HTTP Error", "status_code": status, "body": decoded })
                    }
                    Err(_) => json!({ "error": "HTTP Error", "status_code": status, "text": body }),
                })
            }
            Self::Config(_) | Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl fmt::Display for AscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { missing } if missing.len() == 1 => {
                write!(f, "Missing required parameter: {}", missing[0])
            }
            Self::Validation { missing } => {
                write!(f, "Missing required parameters: {}", missing.join(", "))
            }
            Self::NotFound(message) => f.write_str(message),
            Self::Remote { status, body } => write!(f, "upstream returned {status}: {body}"),
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Transport(err) => write!(f, "request failed: {err}"),
            Self::Decode(err) => write!(f, "unexpected response body: {err}"),
        }
    }
}

impl std::error::Error for AscError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AscError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<serde_json::Error> for AscError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
