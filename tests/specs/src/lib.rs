// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `asc-mcp` binary against a fake App Store Connect API and
//! talks JSON-RPC to it over the child's stdin/stdout.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Resolve the path to the compiled `asc-mcp` binary.
pub fn asc_mcp_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("asc-mcp")
}

/// A running `asc-mcp` process that is killed on drop.
pub struct AscProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl AscProcess {
    /// Spawn the server pointed at `base_url`, signing with the key at `key_path`.
    pub fn start(base_url: &str, key_path: &Path) -> anyhow::Result<Self> {
        let binary = asc_mcp_binary();
        anyhow::ensure!(binary.exists(), "asc-mcp binary not found at {}", binary.display());

        let mut child = Command::new(&binary)
            .env("ASC_ISSUER_ID", "smoke-issuer")
            .env("ASC_KEY_ID", "SMOKEKEY01")
            .env("ASC_PRIVATE_KEY_PATH", key_path)
            .env("ASC_BASE_URL", base_url)
            .env("ASC_REQUEST_TIMEOUT_SECS", "5")
            .env("ASC_LOG_LEVEL", "warn")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("child stdout not captured"))?;
        Ok(Self { child, stdin, stdout: BufReader::new(stdout).lines() })
    }

    /// Write one message line.
    pub async fn send(&mut self, message: &Value) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| anyhow::anyhow!("stdin already closed"))?;
        stdin.write_all(format!("{message}\n").as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read the next reply line within `timeout`.
    pub async fn recv(&mut self, timeout: Duration) -> anyhow::Result<Value> {
        let line = tokio::time::timeout(timeout, self.stdout.next_line())
            .await
            .map_err(|_| anyhow::anyhow!("no reply within {timeout:?}"))??
            .ok_or_else(|| anyhow::anyhow!("stdout closed"))?;
        Ok(serde_json::from_str(&line)?)
    }

    /// Send a request and wait for its reply.
    pub async fn request(
        &mut self,
        id: u64,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> anyhow::Result<Value> {
        self.send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;
        let reply = self.recv(timeout).await?;
        anyhow::ensure!(reply["id"] == id, "reply for wrong request: {reply}");
        Ok(reply)
    }

    /// Close stdin, signalling end of input.
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(&mut self, timeout: Duration) -> anyhow::Result<ExitStatus> {
        tokio::time::timeout(timeout, self.child.wait())
            .await
            .map_err(|_| anyhow::anyhow!("asc-mcp did not exit within {timeout:?}"))?
            .map_err(Into::into)
    }
}
