// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Production App Store Connect API root.
pub const DEFAULT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// App Store Connect refuses tokens that live longer than this.
pub const MAX_TOKEN_TTL_MINS: u64 = 20;

/// Configuration for the App Store Connect tool server.
///
/// Loaded once at startup from flags or `ASC_*` environment variables and
/// never mutated afterwards.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// API issuer ID from the App Store Connect keys page.
    #[arg(long, env = "ASC_ISSUER_ID")]
    pub issuer_id: String,

    /// API key ID (sent as the token's `kid` header).
    #[arg(long, env = "ASC_KEY_ID")]
    pub key_id: String,

    /// Path to the `.p8` private key file.
    #[arg(long, env = "ASC_PRIVATE_KEY_PATH")]
    pub private_key_path: PathBuf,

    /// Token validity in minutes.
    #[arg(long, default_value_t = 19, env = "ASC_TOKEN_TTL_MINS")]
    pub token_ttl_mins: u64,

    /// API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "ASC_BASE_URL")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30, env = "ASC_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Log format (json or text).
    #[arg(long, default_value = "text", env = "ASC_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[arg(long, default_value = "info", env = "ASC_LOG_LEVEL")]
    pub log_level: String,

    /// Append logs to this file in addition to stderr.
    #[arg(long, env = "ASC_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.issuer_id.trim().is_empty() {
            anyhow::bail!("--issuer-id must not be empty");
        }
        if self.key_id.trim().is_empty() {
            anyhow::bail!("--key-id must not be empty");
        }
        if self.token_ttl_mins == 0 || self.token_ttl_mins > MAX_TOKEN_TTL_MINS {
            anyhow::bail!("--token-ttl-mins must be between 1 and {MAX_TOKEN_TTL_MINS}");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("--request-timeout-secs must be positive");
        }
        if !matches!(self.log_format.as_str(), "json" | "text") {
            anyhow::bail!("invalid log format: {} (expected json or text)", self.log_format);
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("invalid --base-url {}: {e}", self.base_url))?;
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_mins * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
