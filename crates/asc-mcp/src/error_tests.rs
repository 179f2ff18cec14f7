// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;

#[yare::parameterized(
    invalid_request  = { ErrorCode::InvalidRequest, -32600 },
    method_not_found = { ErrorCode::MethodNotFound, -32601 },
    invalid_params   = { ErrorCode::InvalidParams, -32602 },
    server_error     = { ErrorCode::ServerError, -32000 },
)]
fn wire_codes(code: ErrorCode, expected: i64) {
    assert_eq!(code.code(), expected);
}

#[test]
fn validation_names_every_missing_parameter() -> anyhow::Result<()> {
    let one = AscError::Validation { missing: vec!["bundleId"] };
    assert_eq!(one.to_string(), "Missing required parameter: bundleId");

    let two = AscError::Validation { missing: vec!["bundleId", "version"] };
    assert_eq!(two.to_string(), "Missing required parameters: bundleId, version");
    assert_eq!(
        two.to_payload(),
        Some(json!({ "error": "Missing required parameters: bundleId, version", "status": 400 }))
    );
    Ok(())
}

#[test]
fn remote_json_body_is_echoed_structured() -> anyhow::Result<()> {
    let body = r#"{"errors":[{"code":"STATE_ERROR"}]}"#;
    let err = AscError::Remote { status: 409, body: body.into() };
    assert_eq!(err.http_status(), Some(409));
    assert_eq!(
        err.to_payload(),
        Some(json!({
            "error": "HTTP Error",
            "status_code": 409,
            "body": { "errors": [{ "code": "STATE_ERROR" }] },
        }))
    );
    Ok(())
}

#[test]
fn remote_text_body_is_echoed_raw() -> anyhow::Result<()> {
    let err = AscError::Remote { status: 502, body: "Bad Gateway".into() };
    assert_eq!(
        err.to_payload(),
        Some(json!({ "error": "HTTP Error", "status_code": 502, "text": "Bad Gateway" }))
    );
    Ok(())
}

#[test]
fn not_found_payload_carries_message() -> anyhow::Result<()> {
    let err = AscError::NotFound("App with bundle ID com.example not found.".into());
    assert_eq!(
        err.to_payload(),
        Some(json!({ "error": "App with bundle ID com.example not found." }))
    );
    Ok(())
}

#[test]
fn faults_have_no_payload() -> anyhow::Result<()> {
    let err = AscError::Config("cannot read private key".into());
    assert!(err.to_payload().is_none());
    assert!(err.http_status().is_none());
    assert_eq!(err.to_string(), "configuration error: cannot read private key");
    Ok(())
}
