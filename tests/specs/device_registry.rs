//! Device registry: registration, listing, and duplicate-IP rejection.

use super::prelude::Fleet;

#[test]
fn add_then_list_shows_the_registered_device() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&[
            "device", "add",
            "--ip-address", "10.0.0.2",
            "--alias", "R1",
            "--username", "admin",
            "--password", "hunter2",
        ])
        .passes()
        .stdout_has("registered device");

    fleet
        .netcfg()
        .args(&["device", "list", "--all"])
        .passes()
        .stdout_has("R1")
        .stdout_has("10.0.0.2:22");
}

#[test]
fn add_with_a_duplicate_ip_address_fails() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&[
            "device", "add",
            "--ip-address", "10.0.0.3",
            "--username", "admin",
            "--password", "hunter2",
        ])
        .passes();

    fleet
        .netcfg()
        .args(&[
            "device", "add",
            "--ip-address", "10.0.0.3",
            "--username", "admin",
            "--password", "hunter2",
        ])
        .fails()
        .stderr_has("duplicate");
}

#[test]
fn add_rejects_an_unrecognized_protocol() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&[
            "device", "add",
            "--ip-address", "10.0.0.4",
            "--username", "admin",
            "--password", "hunter2",
            "--protocol", "carrier-pigeon",
        ])
        .fails()
        .stderr_has("unknown protocol");
}
