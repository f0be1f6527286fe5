//! Integration Test: Headless Bridge Core
//!
//! **Policy**: `bridge-core` knows nothing about terminals. Surfaces talk to
//! it through the `UiBridge` trait, so the core must not depend on or name
//! any terminal crate.

use std::fs;

use architectural_enforcement::{code_part, rust_sources, workspace_root};

const TERMINAL_CRATES: &[&str] = &["ratatui", "crossterm", "termion"];

#[test]
fn test_core_sources_do_not_use_terminal_crates() {
    let mut violations = Vec::new();
    for file in rust_sources("bridge/core/src") {
        for (idx, line) in file.lines.iter().enumerate() {
            let code = code_part(line);
            if TERMINAL_CRATES
                .iter()
                .any(|krate| code.contains(&format!("{krate}::")))
            {
                violations.push(file.violation(idx, "terminal crate"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "bridge-core must stay headless:\n{}",
        violations.join("\n")
    );
}

#[test]
fn test_core_manifest_has_no_terminal_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("bridge/core/Cargo.toml"))
        .expect("bridge/core/Cargo.toml readable");

    for krate in TERMINAL_CRATES {
        assert!(
            !manifest
                .lines()
                .any(|line| line.trim_start().starts_with(&format!("{krate} "))
                    || line.trim_start().starts_with(&format!("{krate}="))),
            "bridge-core depends on {krate}"
        );
    }
}

#[test]
fn test_core_denies_missing_docs() {
    let lib = fs::read_to_string(workspace_root().join("bridge/core/src/lib.rs"))
        .expect("bridge/core/src/lib.rs readable");
    assert!(
        lib.lines().any(|line| line.trim() == "#![deny(missing_docs)]"),
        "bridge-core must deny undocumented public items"
    );
}
