// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `asc-mcp` binary and speak
//! JSON-RPC to it over stdio.

use std::time::Duration;

use asc_mcp::test_support::{write_test_key, FakeAppStore, Fixture};
use asc_mcp_specs::AscProcess;
use serde_json::{json, Value};

const TIMEOUT: Duration = Duration::from_secs(10);

fn text_payload(reply: &Value) -> anyhow::Result<Value> {
    let text = reply
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("no text content in {reply}"))?;
    Ok(serde_json::from_str(text)?)
}

#[tokio::test]
async fn handshake_and_catalog() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fake = FakeAppStore::start(Fixture::new()).await?;
    let mut asc = AscProcess::start(&fake.base_url(), &write_test_key(dir.path())?)?;

    let init = asc.request(1, "initialize", json!({}), TIMEOUT).await?;
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["serverInfo"]["name"], "app-store-connect-services");

    let list = asc.request(2, "tools/list", json!({}), TIMEOUT).await?;
    let tools = list["result"]["tools"].as_array().cloned().unwrap_or_default();
    assert_eq!(tools.len(), 11);
    assert_eq!(tools[9]["name"], "app-store-connect/release-version");

    asc.close_stdin();
    let status = asc.wait_exit(TIMEOUT).await?;
    assert!(status.success(), "exit status: {status}");
    assert!(fake.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn notification_gets_no_reply() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fake = FakeAppStore::start(Fixture::new()).await?;
    let mut asc = AscProcess::start(&fake.base_url(), &write_test_key(dir.path())?)?;

    asc.send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).await?;
    // The next reply on stdout must belong to the following request.
    let reply = asc.request(5, "tools/list", json!({}), TIMEOUT).await?;
    assert_eq!(reply["id"], 5);
    Ok(())
}

#[tokio::test]
async fn release_flow_over_stdio() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fake = FakeAppStore::start(
        Fixture::new()
            .app("app-1", "com.example.app")
            .build("app-1", "build-3", "3.0.0", "3")
            .version("app-1", "ver-3", "3.0.0", "PENDING_DEVELOPER_RELEASE"),
    )
    .await?;
    let mut asc = AscProcess::start(&fake.base_url(), &write_test_key(dir.path())?)?;

    let reply = asc
        .request(
            1,
            "tools/call",
            json!({
                "name": "app-store-connect/release-version",
                "arguments": {
                    "bundleId": "com.example.app",
                    "version": "3.0.0",
                    "buildNumber": "3"
                }
            }),
            TIMEOUT,
        )
        .await?;
    let payload = text_payload(&reply)?;
    assert_eq!(payload["data"]["id"], "release-1");

    let mutations = fake.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].path, "/appStoreVersionReleaseRequests");
    assert!(fake.requests().iter().all(|r| r.authorized));
    Ok(())
}

#[tokio::test]
async fn invalid_config_exits_with_usage_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let key = write_test_key(dir.path())?;
    let mut child = tokio::process::Command::new(asc_mcp_specs::asc_mcp_binary())
        .env("ASC_ISSUER_ID", "smoke-issuer")
        .env("ASC_KEY_ID", "SMOKEKEY01")
        .env("ASC_PRIVATE_KEY_PATH", &key)
        .env("ASC_TOKEN_TTL_MINS", "45")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    let status = tokio::time::timeout(TIMEOUT, child.wait()).await??;
    assert_eq!(status.code(), Some(2));
    Ok(())
}
