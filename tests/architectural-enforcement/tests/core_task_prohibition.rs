//! Integration Test: No Spawned Tasks in the Kiosk Core
//!
//! **Policy**: The kiosk core library is driven by its surface through
//! `Kiosk::turn`; it never spawns tasks or threads of its own, so teardown
//! leaves nothing running behind it.
//! **Exceptions**: the `kiosk-headless` binary, test code

use architectural_enforcement::{scan_directory, workspace_root};

const SPAWNS: &[&str] = &[
    "tokio::spawn(",
    "task::spawn(",
    "thread::spawn(",
    "spawn_local(",
    "spawn_blocking(",
];

#[test]
fn test_core_library_spawns_nothing() {
    let violations = scan_directory(
        &workspace_root().join("kiosk/core/src"),
        SPAWNS,
        &["bin/kiosk-headless.rs"],
    );

    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        panic!(
            "\nFound {} spawn(s) in the kiosk core library.",
            violations.len()
        );
    }
}
