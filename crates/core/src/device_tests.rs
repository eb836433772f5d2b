use super::*;

fn sample(alias: Option<&str>) -> Device {
    Device {
        id: DeviceId::new("dev-1"),
        alias: alias.map(|s| s.to_string()),
        ip_address: "10.0.0.2".to_string(),
        port: Device::default_port(),
        protocol: Protocol::Ssh,
        device_type: DeviceType::CiscoIos,
        username: "admin".to_string(),
        password_encrypted: "cipher".to_string(),
        enable_password_encrypted: None,
        default_command: "show running-config".to_string(),
        active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        last_backup_at: None,
        last_backup_status: None,
    }
}

#[test]
fn slug_prefers_alias() {
    let device = sample(Some("R1"));
    assert_eq!(device.slug(), "R1");
}

#[test]
fn slug_falls_back_to_ip_with_colons_replaced() {
    let mut device = sample(None);
    device.ip_address = "fe80::1".to_string();
    assert_eq!(device.slug(), "fe80__1");
}

#[test]
fn slug_ignores_empty_alias() {
    let device = sample(Some(""));
    assert_eq!(device.slug(), "10.0.0.2");
}

#[test]
fn protocol_round_trips_through_str() {
    assert_eq!("ssh".parse::<Protocol>().unwrap(), Protocol::Ssh);
    assert_eq!("TELNET".parse::<Protocol>().unwrap(), Protocol::Telnet);
    assert!("rlogin".parse::<Protocol>().is_err());
}

#[test]
fn device_type_round_trips_through_str() {
    for (s, dt) in [
        ("cisco_ios", DeviceType::CiscoIos),
        ("cisco_xe", DeviceType::CiscoXe),
        ("cisco_nxos", DeviceType::CiscoNxos),
        ("cisco_ios_telnet", DeviceType::CiscoIosTelnet),
    ] {
        assert_eq!(s.parse::<DeviceType>().unwrap(), dt);
        assert_eq!(dt.as_str(), s);
    }
}
