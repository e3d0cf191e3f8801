//! Unified diff generation for dry-run previews.
//!
//! Rewrites in a file are usually a handful of lines near the top, so the diff
//! is a single hunk spanning from the first to the last changed line, with
//! [`CONTEXT_LINES`] of unchanged context on each side.

use std::fmt::Write;

/// Unchanged lines shown around the changed region.
pub const CONTEXT_LINES: usize = 3;

/// Generate a unified diff between `before` and `after` for `path`.
///
/// Returns an empty string when the texts are equal.
pub fn unified_diff(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let start = prefix.saturating_sub(CONTEXT_LINES);
    let old_end = (old.len() - suffix + CONTEXT_LINES).min(old.len());
    let new_end = (new.len() - suffix + CONTEXT_LINES).min(new.len());

    let mut diff = String::new();
    let _ = writeln!(diff, "--- a/{}", path);
    let _ = writeln!(diff, "+++ b/{}", path);
    let _ = writeln!(
        diff,
        "@@ -{} +{} @@",
        hunk_range(start, old_end - start),
        hunk_range(start, new_end - start)
    );

    for line in &old[start..prefix] {
        let _ = writeln!(diff, " {}", line);
    }
    for line in &old[prefix..old.len() - suffix] {
        let _ = writeln!(diff, "-{}", line);
    }
    for line in &new[prefix..new.len() - suffix] {
        let _ = writeln!(diff, "+{}", line);
    }
    for line in &old[old.len() - suffix..old_end] {
        let _ = writeln!(diff, " {}", line);
    }

    diff
}

fn hunk_range(start: usize, len: usize) -> String {
    if len == 0 {
        format!("{},0", start)
    } else {
        format!("{},{}", start + 1, len)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_texts_produce_no_diff() {
        assert!(unified_diff("a.ts", "x\ny\n", "x\ny\n").is_empty());
    }

    #[test]
    fn single_line_rewrite() {
        let before = "import { A } from '@/modules/exchanges';\n";
        let after = "// Module not yet implemented\n// import { A } from '@/modules/exchanges';\n";
        let diff = unified_diff("src/a.ts", before, after);

        assert_eq!(
            diff,
            "--- a/src/a.ts\n\
             +++ b/src/a.ts\n\
             @@ -1,1 +1,2 @@\n\
             -import { A } from '@/modules/exchanges';\n\
             +// Module not yet implemented\n\
             +// import { A } from '@/modules/exchanges';\n"
        );
    }

    #[test]
    fn context_is_limited() {
        let before = "1\n2\n3\n4\n5\nold\n6\n7\n8\n9\n10\n";
        let after = "1\n2\n3\n4\n5\nnew\n6\n7\n8\n9\n10\n";
        let diff = unified_diff("f", before, after);

        assert!(diff.contains("@@ -3,7 +3,7 @@"));
        assert!(diff.contains(" 3\n"));
        assert!(!diff.contains(" 2\n"));
        assert!(diff.contains(" 8\n"));
        assert!(!diff.contains(" 9\n"));
        assert!(diff.contains("-old\n+new\n"));
    }

    #[test]
    fn pure_insertion() {
        let diff = unified_diff("f", "a\nb\n", "a\nstub\nb\n");
        assert!(diff.contains("@@ -1,2 +1,3 @@"));
        assert!(diff.contains(" a\n+stub\n b\n"));
    }

    #[test]
    fn insertion_into_empty_file() {
        let diff = unified_diff("f", "", "new\n");
        assert!(diff.contains("@@ -0,0 +1,1 @@"));
        assert!(diff.contains("+new\n"));
    }
}
