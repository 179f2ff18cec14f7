// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App Store Connect tool server: exposes app, TestFlight and release
//! operations as JSON-RPC tools over stdio.

pub mod config;
pub mod credential;
pub mod error;
pub mod mcp;
pub mod release;
pub mod store;
pub mod test_support;
pub mod upstream;

use std::sync::Once;

use tracing::info;

use crate::config::Config;
use crate::mcp::McpServer;
use crate::store::AppStore;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Serve tool calls on stdin/stdout until end of input.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = AppStore::from_config(&config)?;
    info!(
        base_url = %config.base_url,
        key_id = %config.key_id,
        token_ttl_mins = config.token_ttl_mins,
        "asc-mcp starting"
    );
    McpServer::new(store).run_stdio().await
}
