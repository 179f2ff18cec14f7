// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON-RPC dispatch loop.

use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::error::{AscError, ErrorCode};
use crate::mcp::catalog::{self, Arguments, Tool};
use crate::mcp::protocol::{
    text_content, JsonRpcRequest, JsonRpcResponse, ToolCallParams, JSONRPC_VERSION,
};
use crate::release::{ReleaseRequest, DEFAULT_PLATFORM};
use crate::store::AppStore;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "app-store-connect-services";

/// What to do after handling one input line.
#[derive(Debug)]
enum Step {
    Reply(JsonRpcResponse),
    Skip,
    Stop,
}

pub struct McpServer {
    store: AppStore,
}

impl McpServer {
    pub fn new(store: AppStore) -> Self {
        Self { store }
    }

    /// Serve stdin/stdout until end of input.
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        catalog::verify()?;
        info!(tools = Tool::ALL.len(), "serving on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
    }

    /// Handle requests one line at a time. Each reply is written and flushed
    /// before the next line is read.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let Ok(line) = std::str::from_utf8(&buf) else {
                warn!("message is not valid UTF-8, stopping");
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.handle_line(line).await {
                Step::Reply(response) => {
                    if !write_response(&mut writer, &response).await? {
                        break;
                    }
                }
                Step::Skip => {}
                Step::Stop => break,
            }
        }
        debug!("input closed");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Step {
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => {
                warn!(kind = json_kind(&other), "message is not an object, stopping");
                return Step::Stop;
            }
            Err(e) => {
                warn!(err = %e, "unparseable message, stopping");
                return Step::Stop;
            }
        };
        let id = value.get("id").filter(|id| !id.is_null()).cloned();

        let request = match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => request,
            Err(e) => {
                return match id {
                    Some(id) => Step::Reply(JsonRpcResponse::error(
                        id,
                        ErrorCode::InvalidRequest,
                        format!("Invalid request: {e}"),
                    )),
                    None => {
                        warn!(err = %e, "malformed notification skipped");
                        Step::Skip
                    }
                };
            }
        };

        let Some(id) = id else {
            debug!(method = %request.method, "notification");
            return Step::Skip;
        };
        if request.method.starts_with("notifications/") {
            debug!(method = %request.method, "notification with id ignored");
            return Step::Skip;
        }

        Step::Reply(self.handle(id, request).await)
    }

    /// Answer one request that carries an id.
    pub async fn handle(&self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        if let Some(version) = request.jsonrpc.as_deref().filter(|v| *v != JSONRPC_VERSION) {
            return JsonRpcResponse::error(
                id,
                ErrorCode::InvalidRequest,
                format!("Unsupported jsonrpc version '{version}'"),
            );
        }

        match request.method.as_str() {
            "initialize" => JsonRpcResponse::result(id, initialize_result()),
            "tools/list" => match serde_json::to_value(catalog::descriptors()) {
                Ok(tools) => JsonRpcResponse::result(id, json!({ "tools": tools })),
                Err(e) => internal_error(id, &e),
            },
            "tools/call" => self.tools_call(id, request.params).await,
            other => JsonRpcResponse::method_not_found(id, other),
        }
    }

    async fn tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = match params {
            None => ToolCallParams::default(),
            Some(value) => match serde_json::from_value::<ToolCallParams>(value) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        ErrorCode::InvalidParams,
                        format!("Invalid params: {e}"),
                    )
                }
            },
        };
        let Some(name) = params.name else {
            return JsonRpcResponse::error(id, ErrorCode::InvalidParams, "Missing tool name");
        };
        let Some(tool) = Tool::from_name(&name) else {
            return JsonRpcResponse::error(
                id,
                ErrorCode::MethodNotFound,
                format!("Tool '{name}' not found"),
            );
        };

        let args = Arguments::new(params.arguments.unwrap_or_else(Map::new));
        debug!(tool = tool.name(), "tool call");
        let outcome = match args.validate(tool) {
            Ok(()) => self.dispatch(tool, &args).await,
            Err(invalid) => Err(invalid),
        };

        match crate::store::settle(outcome) {
            Ok(payload) => match text_content(&payload) {
                Ok(result) => JsonRpcResponse::result(id, result),
                Err(e) => internal_error(id, &e),
            },
            Err(fault) => {
                error!(tool = tool.name(), err = %fault, "tool failed");
                JsonRpcResponse::error(
                    id,
                    ErrorCode::InvalidRequest,
                    format!("Error executing tool '{name}': {fault}"),
                )
            }
        }
    }

    async fn dispatch(&self, tool: Tool, args: &Arguments) -> Result<Value, AscError> {
        let store = &self.store;
        match tool {
            Tool::ListApps => store.list_apps().await,
            Tool::GetAppInfo => store.get_app_info(&args.required("bundleId")?).await,
            Tool::ListBetaTesters | Tool::ListTestersInGroup => {
                store.list_testers_in_group(&args.required("groupId")?).await
            }
            Tool::ListBetaGroups => store.list_beta_groups(&args.required("bundleId")?).await,
            Tool::ListBuilds => store.list_builds(&args.required("bundleId")?).await,
            Tool::SubmitForReview => {
                store
                    .submit_for_review(&args.required("bundleId")?, &args.required("version")?)
                    .await
            }
            Tool::CreateBetaGroup => {
                store.create_beta_group(&args.required("name")?, &args.required("bundleId")?).await
            }
            Tool::AddBetaTesterToGroup => {
                store
                    .add_tester_to_group(&args.required("email")?, &args.required("groupId")?)
                    .await
            }
            Tool::ReleaseVersion => {
                let request = ReleaseRequest {
                    bundle_id: args.required("bundleId")?,
                    version: args.required("version")?,
                    build_number: args.required("buildNumber")?,
                    platform: args.get("platform").unwrap_or_else(|| DEFAULT_PLATFORM.to_owned()),
                };
                store.release_version(&request).await
            }
            Tool::GetPerformanceMetrics => {
                store.get_performance_metrics(&args.required("bundleId")?).await
            }
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "enabled": true } },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
    })
}

fn internal_error(id: Value, err: &dyn std::fmt::Display) -> JsonRpcResponse {
    JsonRpcResponse::error(id, ErrorCode::ServerError, format!("Internal server error: {err}"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Write one response line and flush. Returns false when the response could
/// not be serialized and a fallback error was written instead.
async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> anyhow::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let (line, ok) = match serde_json::to_string(response) {
        Ok(line) => (line, true),
        Err(e) => {
            error!(err = %e, "failed to serialize response");
            let fallback = json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": response.id(),
                "error": {
                    "code": ErrorCode::ServerError.code(),
                    "message": format!("Internal server error: {e}"),
                },
            });
            (fallback.to_string(), false)
        }
    };
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(ok)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
