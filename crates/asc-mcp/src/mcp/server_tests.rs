// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::test_support::{
    exchange, tool_call, tool_payload, write_test_key, FakeAppStore, Fixture,
};

struct Harness {
    fake: FakeAppStore,
    server: McpServer,
    _dir: TempDir,
}

async fn harness() -> anyhow::Result<Harness> {
    let dir = tempfile::tempdir()?;
    let fake = FakeAppStore::start(Fixture::new()).await?;
    let server = McpServer::new(fake.store(write_test_key(dir.path())?)?);
    Ok(Harness { fake, server, _dir: dir })
}

#[tokio::test]
async fn initialize_describes_server() -> anyhow::Result<()> {
    let h = harness().await?;
    let replies =
        exchange(&h.server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await?;
    assert_eq!(replies.len(), 1);
    let result = &replies[0]["result"];
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["capabilities"]["tools"]["enabled"], true);
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn tools_list_returns_catalog_once() -> anyhow::Result<()> {
    let h = harness().await?;
    let replies =
        exchange(&h.server, r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#).await?;
    let tools = replies[0]["result"]["tools"].as_array().cloned().unwrap_or_default();
    assert_eq!(tools.len(), Tool::ALL.len());
    assert_eq!(replies[0]["id"], "a");
    assert_eq!(tools[0]["name"], "app-store-connect/list-apps");
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    Ok(())
}

#[tokio::test]
async fn notifications_and_blank_lines_get_no_reply() -> anyhow::Result<()> {
    let h = harness().await?;
    let input = concat!(
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n   \n",
        r#"{"jsonrpc":"2.0","id":7,"method":"notifications/cancelled"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":null,"method":"tools/list"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"tools/list"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":8,"method":"tools/list"}"#,
        "\n",
    );
    let replies = exchange(&h.server, input).await?;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 8);
    Ok(())
}

#[tokio::test]
async fn error_replies() -> anyhow::Result<()> {
    let cases: Vec<(String, i64, &str)> = vec![
        (
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#.to_owned(),
            -32601,
            "Method 'resources/list' not found",
        ),
        (
            tool_call(1, "app-store-connect/delete-app", json!({})),
            -32601,
            "Tool 'app-store-connect/delete-app' not found",
        ),
        (
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{}}"#.to_owned(),
            -32602,
            "Missing tool name",
        ),
        (
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":[1,2]}"#.to_owned(),
            -32602,
            "Invalid params",
        ),
        (
            r#"{"jsonrpc":"1.0","id":1,"method":"tools/list"}"#.to_owned(),
            -32600,
            "Unsupported jsonrpc version '1.0'",
        ),
        (r#"{"jsonrpc":"2.0","id":1}"#.to_owned(), -32600, "Invalid request"),
    ];

    let h = harness().await?;
    for (line, code, message) in &cases {
        let replies = exchange(&h.server, line).await?;
        assert_eq!(replies.len(), 1, "{line}");
        assert_eq!(replies[0]["id"], 1, "{line}");
        assert_eq!(replies[0]["error"]["code"], *code, "{line}");
        let text = replies[0]["error"]["message"].as_str().unwrap_or_default();
        assert!(text.contains(message), "unexpected message {text:?} for {line}");
    }
    assert!(h.fake.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn unparseable_line_stops_the_loop() -> anyhow::Result<()> {
    let h = harness().await?;
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        "\nnot json at all\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );
    let replies = exchange(&h.server, input).await?;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 1);
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_line_stops_the_loop() -> anyhow::Result<()> {
    let h = harness().await?;
    let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#.to_vec();
    input.extend_from_slice(b"\n\xff\xfe\n");
    input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
    input.push(b'\n');

    let mut output = Vec::new();
    h.server.serve(input.as_slice(), &mut output).await?;
    let replies = String::from_utf8(output)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<Vec<Value>, _>>()?;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 1);
    Ok(())
}

#[tokio::test]
async fn non_object_message_stops_the_loop() -> anyhow::Result<()> {
    let h = harness().await?;
    let input = "[1,2,3]\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n";
    assert!(exchange(&h.server, input).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_arguments_are_rejected_before_any_request() -> anyhow::Result<()> {
    let h = harness().await?;
    let line = tool_call(3, "app-store-connect/release-version", json!({ "version": "" }));
    let replies = exchange(&h.server, &line).await?;

    let payload = tool_payload(&replies[0])?;
    assert_eq!(payload["status"], 400);
    assert_eq!(payload["error"], "Missing required parameters: bundleId, version, buildNumber");
    assert!(h.fake.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn ids_are_echoed_verbatim() -> anyhow::Result<()> {
    let h = harness().await?;
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":"req-9","method":"initialize"}"#,
        "\n",
        r#"{"id":12.5,"method":"initialize"}"#,
        "\n",
    );
    let replies = exchange(&h.server, input).await?;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], "req-9");
    assert_eq!(replies[1]["id"], 12.5);
    assert_eq!(replies[1]["jsonrpc"], "2.0");
    Ok(())
}
