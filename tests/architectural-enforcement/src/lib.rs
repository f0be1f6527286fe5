//! Architectural Enforcement Integration Tests
//!
//! Source scans that keep the workspace honest:
//! - `bridge-core` stays headless (no terminal crates)
//! - No sleep() calls in production code
//! - No blocking I/O inside async functions
//!
//! Scans are line based. Everything from the first `#[cfg(test)]` of a file
//! onward counts as test code and is skipped.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source trees, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["bridge/core/src", "tui/src"];

/// A scanned source file
#[derive(Debug)]
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// Lines before the test module
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Load a file, keeping only production lines
    pub fn load(root: &Path, path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        Some(Self {
            path: relative,
            lines: production_lines(&content),
        })
    }

    /// Format a violation at a zero-based line index
    pub fn violation(&self, idx: usize, what: &str) -> String {
        format!(
            "{}:{} - {}: {}",
            self.path.display(),
            idx + 1,
            what,
            self.lines[idx].trim()
        )
    }
}

/// Workspace root, from this crate's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Every `.rs` file under `dir` (relative to the workspace root)
pub fn rust_sources(dir: &str) -> Vec<SourceFile> {
    let root = workspace_root();
    let path = root.join(dir);
    if !path.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(&path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| SourceFile::load(&root, e.path()))
        .collect()
}

/// Lines up to the first `#[cfg(test)]`
pub fn production_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .take_while(|line| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(str::to_string)
        .collect()
}

/// Line with any `//` comment removed
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Whether the nearest enclosing `fn` above `idx` is async
///
/// Scans backwards for the first line declaring a function. Returns `false`
/// at module level.
pub fn is_in_async_function(lines: &[String], idx: usize) -> bool {
    for line in lines[..=idx].iter().rev() {
        let code = code_part(line.trim());
        if code.contains("async fn ") {
            return true;
        }
        if code.starts_with("fn ") || code.contains(" fn ") {
            return false;
        }
        if code.starts_with("mod ") || (code.starts_with("impl") && code.contains('{')) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_production_lines_stop_at_tests() {
        let content = "fn a() {}\n#[cfg(test)]\nmod tests {}\n";
        assert_eq!(production_lines(content), vec!["fn a() {}".to_string()]);
    }

    #[test]
    fn test_async_detection() {
        let src = lines(&[
            "pub async fn start(&self) {",
            "    let x = std::fs::read(\"a\");",
            "}",
            "pub fn load() {",
            "    let y = std::fs::read(\"b\");",
            "}",
        ]);
        assert!(is_in_async_function(&src, 1));
        assert!(!is_in_async_function(&src, 4));
    }

    #[test]
    fn test_module_level_is_not_async() {
        let src = lines(&["use std::fs::File;"]);
        assert!(!is_in_async_function(&src, 0));
    }

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("let a = 1; // sleep(10)"), "let a = 1; ");
    }
}
