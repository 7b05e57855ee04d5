//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code in the kiosk core and the terminal display
//! MUST NOT call sleep methods. Waiting is done with `sleep_until` on a
//! deadline the scheduler owns, or with `tokio::time::interval` for frames.
//! **Exceptions**: test code

use architectural_enforcement::{scan_directory, workspace_root};

const SLEEP_CALLS: &[&str] = &["::sleep(", ".sleep("];

#[test]
fn test_no_sleep_in_production_code() {
    let root = workspace_root();
    let mut violations = scan_directory(&root.join("kiosk/core/src"), SLEEP_CALLS, &[]);
    violations.extend(scan_directory(&root.join("tui/src"), SLEEP_CALLS, &[]));

    if !violations.is_empty() {
        eprintln!("\n❌ Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use a Scheduler deadline with sleep_until, or an interval");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}
