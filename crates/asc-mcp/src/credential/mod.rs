// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App Store Connect API credentials.
//!
//! Requests carry a short-lived ES256 JWT signed with the team's `.p8` key.
//! [`TokenProvider`] issues one lazily, hands out the cached copy until it
//! expires, then signs a fresh one. Nothing is persisted across restarts.

pub mod token;

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use token::{Credential, TokenProvider};

use crate::config::Config;

/// `aud` claim required by App Store Connect.
pub const AUDIENCE: &str = "appstoreconnect-v1";

/// Static inputs for token issuance.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub issuer_id: String,
    pub key_id: String,
    pub private_key_path: PathBuf,
    pub validity: Duration,
}

impl From<&Config> for CredentialConfig {
    fn from(config: &Config) -> Self {
        Self {
            issuer_id: config.issuer_id.clone(),
            key_id: config.key_id.clone(),
            private_key_path: config.private_key_path.clone(),
            validity: config.token_ttl(),
        }
    }
}

/// Current time as epoch seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
