//! Architectural Enforcement
//!
//! Source scans backing the integration tests in `tests/`:
//! - No sleep() calls in production code; timers go through deadlines
//! - No spawned tasks inside the kiosk core library
//!
//! Scans stop at the first `#[cfg(test)]` in a file, so unit test modules
//! at the bottom of a file are exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// A forbidden call found in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the call
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, two levels above this package
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Scan every `.rs` file under `dir` for lines containing any of `patterns`.
///
/// Comments are ignored, as is everything from `#[cfg(test)]` on. Files
/// whose path ends with one of `exempt` are skipped.
pub fn scan_directory(dir: &Path, patterns: &[&str], exempt: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !dir.exists() {
        return violations;
    }

    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
    {
        let path = entry.path();
        if exempt.iter().any(|suffix| path.ends_with(suffix)) {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        violations.extend(scan_source(path, &content, patterns));
    }

    violations
}

/// Scan one file's contents
pub fn scan_source(path: &Path, content: &str, patterns: &[&str]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim_start().starts_with("#[cfg(test)]") {
            break;
        }

        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        if patterns.iter().any(|p| code_part.contains(p)) {
            violations.push(Violation {
                path: path.to_path_buf(),
                line: idx + 1,
                text: line.trim().to_string(),
            });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_source_skips_comments_and_test_modules() {
        let source = "\
fn a() {
    // tokio::time::sleep(d) is not allowed
    tokio::time::sleep_until(deadline);
}
fn b() { std::thread::sleep(d); }
#[cfg(test)]
mod tests { fn c() { tokio::time::sleep(d); } }
";
        let found = scan_source(Path::new("x.rs"), source, &["::sleep("]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 5);
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
