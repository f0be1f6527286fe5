//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting happens
//! on channels, timeouts or `tokio::time::interval` ticks.
//! **Exceptions**: test code

use architectural_enforcement::{code_part, rust_sources, SourceFile, PRODUCTION_DIRS};

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let violations: Vec<String> = PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_sources(dir))
        .flat_map(|file| sleep_violations(&file))
        .collect();

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nAcceptable alternatives:");
        eprintln!("  - tokio::time::interval() for periodic work");
        eprintln!("  - tokio::time::timeout() around the awaited operation");
        eprintln!("  - channels to wait for events");

        panic!(
            "\nFound {} sleep violation(s) in production code.",
            violations.len()
        );
    }
}

#[test]
fn test_production_dirs_exist() {
    for dir in PRODUCTION_DIRS {
        assert!(!rust_sources(dir).is_empty(), "no sources under {dir}");
    }
}

fn sleep_violations(file: &SourceFile) -> Vec<String> {
    file.lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_sleep_call(code_part(line)))
        .map(|(idx, _)| file.violation(idx, "sleep"))
        .collect()
}

fn is_sleep_call(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(") || code.contains("sleep_until(")
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep_call("tokio::time::sleep(Duration::from_millis(10)).await;"));
    assert!(is_sleep_call("std::thread::sleep(d);"));
    assert!(!is_sleep_call("let mut ticker = tokio::time::interval(d);"));
}
