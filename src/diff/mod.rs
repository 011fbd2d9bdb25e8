pub mod hunk;
pub mod parse;

pub use hunk::{DiffLine, Hunk, LineKind, Range};
pub use parse::{MissingNewline, missing_newline, parse_header, parse_hunks};

/// Reconstruct the pre-change file from the post-change lines and the hunks
/// that produced them.
///
/// Lines outside every hunk are copied as-is; each hunk contributes its old
/// region (context and removed lines). Hunks must be ordered and
/// non-overlapping, as `git diff` emits them.
pub fn reverse_apply(current: &[String], hunks: &[Hunk]) -> Vec<String> {
    let mut original = Vec::with_capacity(current.len());
    let mut cursor = 0;

    for hunk in hunks {
        let region = hunk.new.indices();
        let start = region.start.min(current.len());
        if start > cursor {
            original.extend_from_slice(&current[cursor..start]);
        }
        original.extend(hunk.old_lines().map(str::to_string));
        cursor = cursor.max(region.end.min(current.len()));
    }

    if cursor < current.len() {
        original.extend_from_slice(&current[cursor..]);
    }

    original
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn reverse_apply_restores_original() {
        let current = lines("one\ntwo\nTHREE\nthree-b\nfour\nfive\n");
        let hunks = parse_hunks("@@ -2,2 +2,3 @@\n two\n-three\n+THREE\n+three-b\n@@ -4,0 +6 @@\n+five\n");
        assert_eq!(reverse_apply(&current, &hunks), lines("one\ntwo\nthree\nfour\n"));
    }

    #[test]
    fn reverse_apply_pure_deletion() {
        let current = lines("a\nc\n");
        let hunks = parse_hunks("@@ -2 +1,0 @@\n-b\n");
        assert_eq!(reverse_apply(&current, &hunks), lines("a\nb\nc\n"));
    }

    #[test]
    fn reverse_apply_new_file() {
        let current = lines("fresh\nfile\n");
        let hunks = parse_hunks("@@ -0,0 +1,2 @@\n+fresh\n+file\n");
        assert_eq!(reverse_apply(&current, &hunks), Vec::<String>::new());
    }

    #[test]
    fn reverse_apply_without_hunks_is_identity() {
        let current = lines("same\ntext\n");
        assert_eq!(reverse_apply(&current, &[]), current);
    }
}
