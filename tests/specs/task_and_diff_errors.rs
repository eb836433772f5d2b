//! Error surface for unknown tasks: status lookups and diffing.

use super::prelude::Fleet;

#[test]
fn status_of_an_unknown_task_is_not_found() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&["task", "status", "missing-task"])
        .fails()
        .stderr_has("not found");
}

#[test]
fn listing_tasks_on_an_empty_fleet_succeeds_with_no_rows() {
    let fleet = Fleet::new();

    fleet.netcfg().args(&["task", "list"]).passes();
}

#[test]
fn diffing_two_unknown_tasks_is_not_found() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&["diff", "task-a", "task-b"])
        .fails()
        .stderr_has("not found");
}
