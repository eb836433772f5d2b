use std::time::Duration;

use netcfg_core::{DeviceType, Protocol};
use netcfg_engine::EngineConfig;

use super::*;

fn test_config(db_path: &std::path::Path, artifact_root: &std::path::Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.database_url = format!("sqlite://{}", db_path.display());
    config.artifact_root = artifact_root.to_path_buf();
    config
}

#[tokio::test]
async fn build_wires_every_component_and_runs_migrations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("netcfg.db");
    let config = test_config(&db_path, &dir.path().join("backups"));

    let orchestrator = build(&config).await.expect("lifecycle build succeeds");

    // The Task Store migration ran and the device registry is reachable.
    let devices = orchestrator.list_devices(false).await.expect("list_devices");
    assert!(devices.is_empty());

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn built_orchestrator_round_trips_a_device_and_ticks_without_panicking() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("netcfg.db");
    let config = test_config(&db_path, &dir.path().join("backups"));

    let orchestrator = build(&config).await.expect("lifecycle build succeeds");

    let device = orchestrator
        .register_device(
            Some("r1".to_string()),
            "10.0.0.2".to_string(),
            22,
            Protocol::Ssh,
            DeviceType::CiscoIos,
            "admin".to_string(),
            "ciphertext".to_string(),
            None,
            "show running-config".to_string(),
        )
        .await
        .expect("register_device");
    assert_eq!(device.ip_address, "10.0.0.2");

    // A tick with no due schedules and no open sessions is a no-op.
    orchestrator.tick_scheduler().await;
    orchestrator.sweep_idle_connections(Duration::from_secs(1)).await;

    orchestrator.shutdown().await;
}
