// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lazily renewed bearer tokens.

use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::credential::{epoch_secs, CredentialConfig, AUDIENCE};
use crate::error::AscError;

/// JWT claims App Store Connect expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub aud: String,
}

/// A signed token and the instant it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    /// Issue time as epoch seconds.
    pub issued_at: u64,
    pub validity: Duration,
}

impl Credential {
    /// Expired once `validity` has fully elapsed; equality counts as expired.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now.saturating_sub(self.issued_at) >= self.validity.as_secs()
    }
}

/// Issues and caches the bearer token shared by every API call.
pub struct TokenProvider {
    config: CredentialConfig,
    cached: Mutex<Option<Credential>>,
}

impl TokenProvider {
    pub fn new(config: CredentialConfig) -> Self {
        Self { config, cached: Mutex::new(None) }
    }

    /// Current credential, renewed if missing or expired.
    pub fn credential(&self) -> Result<Credential, AscError> {
        self.credential_at(epoch_secs())
    }

    /// Same as [`credential`](Self::credential) with an explicit clock reading.
    ///
    /// The check and the renewal happen under one lock, so concurrent callers
    /// in the same expiry window share a single renewal.
    pub fn credential_at(&self, now: u64) -> Result<Credential, AscError> {
        let mut cached = self.cached.lock();
        if let Some(credential) = cached.as_ref() {
            if !credential.is_expired_at(now) {
                return Ok(credential.clone());
            }
        }
        let credential = self.issue(now)?;
        tracing::debug!(issued_at = now, key_id = %self.config.key_id, "issued api token");
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// Headers for one authenticated request.
    pub fn bearer_headers(&self) -> Result<HeaderMap, AscError> {
        let credential = self.credential()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential.token))
            .map_err(|e| AscError::Config(format!("token is not a valid header value: {e}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn issue(&self, now: u64) -> Result<Credential, AscError> {
        let path = &self.config.private_key_path;
        let pem = std::fs::read(path).map_err(|e| {
            AscError::Config(format!("cannot read private key {}: {e}", path.display()))
        })?;
        let key = EncodingKey::from_ec_pem(&pem).map_err(|e| {
            AscError::Config(format!("invalid private key {}: {e}", path.display()))
        })?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());
        let validity = self.config.validity;
        let claims = Claims {
            iss: self.config.issuer_id.clone(),
            iat: now,
            exp: now + validity.as_secs(),
            aud: AUDIENCE.to_owned(),
        };
        let token = jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| AscError::Config(format!("failed to sign token: {e}")))?;
        Ok(Credential { token, issued_at: now, validity })
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
