//! Fleet-wide counters on an empty store.

use super::prelude::Fleet;

#[test]
fn stats_on_an_empty_fleet_reports_all_zero_counters() {
    let fleet = Fleet::new();

    fleet
        .netcfg()
        .args(&["stats"])
        .passes()
        .stdout_has("total:        0")
        .stdout_has("success:      0");
}

#[test]
fn stats_json_output_is_well_formed() {
    let fleet = Fleet::new();

    let run = fleet.netcfg().args(&["-o", "json", "stats"]).passes();
    let value: serde_json::Value = serde_json::from_str(&run.stdout()).expect("valid JSON");
    assert_eq!(value["total"], 0);
    assert_eq!(value["success_rate"], 0.0);
}
