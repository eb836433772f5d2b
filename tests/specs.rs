//! Black-box behavioral specifications, driven against the compiled `netcfg`
//! binary rather than any crate's internals.
//!
//! The deeper engine invariants (concurrency cap, per-device serialization,
//! cron determinism, diff correctness) are exercised against a
//! `FakeSessionAdapter` inside `netcfg-engine`'s own test suite, since they
//! need a scripted device that this binary-level harness cannot provide.
//! What lives here is everything reachable without a live SSH/Telnet
//! endpoint: device registration, schedule management, and the CLI's error
//! surface for unknown ids.

mod specs {
    #[path = "specs/prelude.rs"]
    mod prelude;
    #[path = "specs/device_registry.rs"]
    mod device_registry;
    #[path = "specs/schedule_management.rs"]
    mod schedule_management;
    #[path = "specs/task_and_diff_errors.rs"]
    mod task_and_diff_errors;
    #[path = "specs/stats.rs"]
    mod stats;
}
