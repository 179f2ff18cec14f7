// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MCP-style tool server over newline-delimited JSON-RPC.

pub mod catalog;
pub mod protocol;
pub mod server;

pub use server::McpServer;
