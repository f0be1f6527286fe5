//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions MUST NOT use blocking I/O.
//! **Required**: `tokio::fs`, `tokio::net`, `tokio::process` inside async code.
//! **Acceptable**: blocking calls in non-async functions (config loading
//! before the runtime is busy, log file setup) and test code.

use architectural_enforcement::{
    code_part, is_in_async_function, rust_sources, SourceFile, PRODUCTION_DIRS,
};

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::", "Blocking network I/O"),
    ("std::process::Command", "Blocking process I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::thread::sleep", "Thread sleep"),
];

/// Test that async production code does not use blocking I/O
#[test]
fn test_no_blocking_io_in_async_code() {
    let violations: Vec<String> = PRODUCTION_DIRS
        .iter()
        .flat_map(|dir| rust_sources(dir))
        .flat_map(|file| blocking_violations(&file))
        .collect();

    if !violations.is_empty() {
        eprintln!("\nBlocking I/O found in async code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }

        panic!(
            "\nFound {} blocking I/O violation(s) in async code.",
            violations.len()
        );
    }
}

fn blocking_violations(file: &SourceFile) -> Vec<String> {
    let mut violations = Vec::new();
    for (idx, line) in file.lines.iter().enumerate() {
        let code = code_part(line);
        for (pattern, what) in FORBIDDEN {
            if code.contains(pattern) && is_in_async_function(&file.lines, idx) {
                violations.push(file.violation(idx, what));
            }
        }
    }
    violations
}

#[test]
fn test_detects_blocking_read_in_async_fn() {
    let file = SourceFile {
        path: "sample.rs".into(),
        lines: vec![
            "async fn load() {".to_string(),
            "    let s = std::fs::read_to_string(\"a\");".to_string(),
            "}".to_string(),
            "fn load_sync() {".to_string(),
            "    let s = std::fs::read_to_string(\"b\");".to_string(),
            "}".to_string(),
        ],
    };

    let violations = blocking_violations(&file);
    assert_eq!(violations.len(), 1);
    assert!(violations[0].starts_with("sample.rs:2 - Blocking file I/O"));
}
