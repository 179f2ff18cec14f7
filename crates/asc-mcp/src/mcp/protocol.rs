// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ErrorCode;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Absent (or null) for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// `params` of a `tools/call` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcResponse {
    Result(JsonRpcResult),
    Error(JsonRpcErrorResponse),
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResult {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: JsonRpcError,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self::Result(JsonRpcResult { jsonrpc: JSONRPC_VERSION, id, result })
    }

    pub fn error(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(JsonRpcErrorResponse {
            jsonrpc: JSONRPC_VERSION,
            id,
            error: JsonRpcError { code: code.code(), message: message.into() },
        })
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::error(id, ErrorCode::MethodNotFound, format!("Method '{method}' not found"))
    }

    pub fn id(&self) -> &Value {
        match self {
            Self::Result(r) => &r.id,
            Self::Error(e) => &e.id,
        }
    }
}

/// Wrap an operation result as a single text content block.
pub fn text_content(payload: &Value) -> Result<Value, serde_json::Error> {
    let text = serde_json::to_string_pretty(payload)?;
    Ok(json!({ "content": [{ "type": "text", "text": text }] }))
}
