// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use netcfg_core::DeviceType;

fn connect_info(protocol: Protocol, port: u16) -> DeviceConnectInfo {
    DeviceConnectInfo {
        ip_address: "127.0.0.1".to_string(),
        port,
        protocol,
        device_type: DeviceType::CiscoIos,
        username: "admin".to_string(),
        password: "secret".to_string(),
        enable_password: None,
    }
}

#[test]
fn handle_round_trips_through_prefix() {
    let handle = SessionHandle(format!("{SSH_PREFIX}abc-123"));
    let (protocol, inner) = split_handle(&handle).unwrap();
    assert_eq!(protocol, Protocol::Ssh);
    assert_eq!(inner.as_str(), "abc-123");
}

#[test]
fn unprefixed_handle_is_not_open() {
    let handle = SessionHandle("bare".to_string());
    assert!(matches!(split_handle(&handle), Err(SessionError::NotOpen)));
}

#[tokio::test]
async fn open_on_unreachable_address_fails_per_protocol() {
    let adapter = MultiProtocolAdapter::new();
    // Port 1 is reserved; nothing answers, so both paths fail fast via
    // the transport layer rather than hanging for the full timeout.
    let info = connect_info(Protocol::Ssh, 1);
    let timeouts = SessionTimeouts {
        connect: std::time::Duration::from_millis(200),
        ..Default::default()
    };
    assert!(adapter.open(&info, timeouts).await.is_err());
}
