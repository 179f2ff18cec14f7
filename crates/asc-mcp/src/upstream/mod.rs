// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream App Store Connect communication: HTTP client and typed documents.

pub mod client;
pub mod resources;

pub use client::AppStoreClient;
