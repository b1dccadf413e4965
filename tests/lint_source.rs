//! Lint: library code must propagate errors instead of panicking.
//!
//! Transitions return `Result`, so `.unwrap()` / `.expect(` in non-test
//! code would turn a rejected move into a crash in the browser. Printing
//! goes through the `log` facade, never `println!`.
//!
//! This test scans every `.rs` file under `src/` up to its first
//! `#[cfg(test)]` line.

use std::fs;
use std::path::Path;

const FORBIDDEN: [&str; 4] = [".unwrap()", ".expect(", "println!(", "dbg!("];

/// Scan the non-test part of a source file for forbidden calls.
fn find_violations(source: &str) -> Vec<(usize, String)> {
    let mut violations = Vec::new();

    for (line_num_0, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        // Skip comments
        if trimmed.starts_with("//") {
            continue;
        }

        if FORBIDDEN.iter().any(|pat| line.contains(pat)) {
            violations.push((line_num_0 + 1, trimmed.to_string()));
        }
    }

    violations
}

#[test]
fn no_panicking_calls_in_library_code() {
    let src_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut all_violations = Vec::new();

    visit_source_files(&src_dir, &mut all_violations);

    if !all_violations.is_empty() {
        let mut msg = String::from(
            "Found panicking or printing calls in library code.\n\
             Return a typed error with `?` and log through the `log` crate.\n\n",
        );
        for (file, line_num, line) in &all_violations {
            msg.push_str(&format!("  {}:{}: {}\n", file, line_num, line));
        }
        panic!("{}", msg);
    }
}

fn visit_source_files(dir: &Path, violations: &mut Vec<(String, usize, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            visit_source_files(&path, violations);
        } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
            let Ok(source) = fs::read_to_string(&path) else {
                continue;
            };
            let display_path = path.display().to_string();
            for (line_num, line) in find_violations(&source) {
                violations.push((display_path.clone(), line_num, line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_unwrap() {
        let source = "let x = parse(s).unwrap();";
        assert_eq!(find_violations(source).len(), 1);
    }

    #[test]
    fn detects_expect_and_println() {
        let source = "let x = f().expect(\"boom\");\nprintln!(\"hi\");";
        assert_eq!(find_violations(source).len(), 2);
    }

    #[test]
    fn allows_unwrap_or() {
        let source = "let x = a.unwrap_or(0);\nlet y = b.unwrap_or_default();";
        assert!(find_violations(source).is_empty());
    }

    #[test]
    fn ignores_comments() {
        let source = "// value.unwrap() is fine in docs";
        assert!(find_violations(source).is_empty());
    }

    #[test]
    fn stops_at_test_module() {
        let source = "fn f() {}\n#[cfg(test)]\nmod tests { fn t() { x.unwrap(); } }";
        assert!(find_violations(source).is_empty());
    }
}
