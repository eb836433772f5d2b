// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use netcfg_core::DeviceType;

fn connect_info(ip: &str) -> DeviceConnectInfo {
    DeviceConnectInfo {
        ip_address: ip.to_string(),
        port: 22,
        protocol: netcfg_core::Protocol::Ssh,
        device_type: DeviceType::CiscoIos,
        username: "admin".to_string(),
        password: "secret".to_string(),
        enable_password: None,
    }
}

#[tokio::test]
async fn open_then_execute_returns_scripted_output() {
    let adapter = FakeSessionAdapter::new();
    adapter.script("10.0.0.2", "show version", "Cisco IOS Software, Version 15.1");

    let handle = adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap();
    let output = adapter.execute(&handle, "show version").await.unwrap();
    assert_eq!(output, "Cisco IOS Software, Version 15.1");
}

#[tokio::test]
async fn unscripted_command_returns_empty_output() {
    let adapter = FakeSessionAdapter::new();
    let handle = adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap();
    assert_eq!(adapter.execute(&handle, "show clock").await.unwrap(), "");
}

#[tokio::test]
async fn open_fails_with_auth_error_when_scripted() {
    let adapter = FakeSessionAdapter::new();
    adapter.fail_auth("10.0.0.2", "bad password");
    let err = adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::AuthError(_)));
}

#[tokio::test]
async fn execute_fails_with_transport_error_when_scripted() {
    let adapter = FakeSessionAdapter::new();
    adapter.fail_execute("10.0.0.2", "connection reset");
    let handle = adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap();
    let err = adapter.execute(&handle, "show version").await.unwrap_err();
    assert!(matches!(err, SessionError::TransportError(_)));
}

#[tokio::test]
async fn execute_after_close_fails_not_open() {
    let adapter = FakeSessionAdapter::new();
    let handle = adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap();
    adapter.close(&handle).await;
    let err = adapter.execute(&handle, "show version").await.unwrap_err();
    assert!(matches!(err, SessionError::NotOpen));
}

#[tokio::test]
async fn records_calls_in_order() {
    let adapter = FakeSessionAdapter::new();
    let handle = adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap();
    adapter.execute(&handle, "show version").await.unwrap();
    adapter.close(&handle).await;

    let calls = adapter.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], SessionCall::Open { .. }));
    assert!(matches!(calls[1], SessionCall::Execute { .. }));
    assert!(matches!(calls[2], SessionCall::Close { .. }));
}

#[tokio::test]
async fn open_count_tracks_distinct_opens() {
    let adapter = FakeSessionAdapter::new();
    adapter
        .open(&connect_info("10.0.0.2"), SessionTimeouts::default())
        .await
        .unwrap();
    adapter
        .open(&connect_info("10.0.0.3"), SessionTimeouts::default())
        .await
        .unwrap();
    assert_eq!(adapter.open_count(), 2);
}
