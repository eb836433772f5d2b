//! Recurring job management: install, list, and remove.

use super::prelude::Fleet;

#[test]
fn add_list_and_remove_a_weekly_schedule() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&[
            "device", "add",
            "--ip-address", "10.0.1.1",
            "--alias", "core-1",
            "--username", "admin",
            "--password", "hunter2",
        ])
        .passes();

    fleet
        .netcfg()
        .args(&[
            "schedule", "add",
            "--name", "weekly-core-routers",
            "--device", "core-1",
            "weekly", "--weekday", "1", "--hour", "2", "--minute", "30",
        ])
        .passes()
        .stdout_has("installed schedule");

    let list = fleet.netcfg().args(&["schedule", "list"]).passes();
    list.stdout_has("weekly-core-routers").stdout_has("30 2 * * 1");
}

#[test]
fn add_with_a_malformed_custom_cron_fails() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&[
            "schedule", "add",
            "--name", "bad-job",
            "--device", "whatever",
            "custom", "not a cron",
        ])
        .fails()
        .stderr_has("five fields");
}
