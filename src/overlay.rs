//! Rendering hunks as overlay marks on a buffer.

use crate::buffer::{BufferError, BufferStore, Mark};
use crate::diff::{Hunk, LineKind};
use std::path::Path;
use tracing::debug;

/// Text of the per-hunk summary annotation
pub fn summary_text(index: usize, instructions: &str) -> String {
    format!("[hunk {}] {}", index, instructions)
}

/// 1-based line the hunk's annotations are anchored to
fn anchor_line(hunk: &Hunk) -> u32 {
    u32::try_from(hunk.new.offset())
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}

/// Replace the overlay of `path` with marks for `hunks`.
///
/// Existing marks are cleared first, so rendering the same hunks twice leaves
/// the same marks as rendering once. Added lines are highlighted at their
/// post-change position, removed lines become one virtual block above the
/// hunk's first line, and each hunk gets a summary carrying its 1-based index.
pub fn render<S>(
    store: &mut S,
    path: &Path,
    hunks: &[Hunk],
    instructions: &str,
) -> Result<(), BufferError>
where
    S: BufferStore + ?Sized,
{
    store.clear_marks(path)?;

    for (i, hunk) in hunks.iter().enumerate() {
        let anchor = anchor_line(hunk);
        let mut cursor = anchor;
        let mut removed = Vec::new();

        for line in &hunk.lines {
            match line.kind {
                LineKind::Add => {
                    store.add_mark(path, Mark::Added { line: cursor })?;
                    cursor = cursor.saturating_add(1);
                }
                LineKind::Remove => removed.push(line.text.clone()),
                LineKind::Context => cursor = cursor.saturating_add(1),
            }
        }

        if !removed.is_empty() {
            store.add_mark(
                path,
                Mark::Removed {
                    line: anchor,
                    lines: removed,
                },
            )?;
        }
        store.add_mark(
            path,
            Mark::Summary {
                line: anchor,
                text: summary_text(i + 1, instructions),
            },
        )?;
    }

    debug!(path = %path.display(), hunks = hunks.len(), "rendered overlay");
    Ok(())
}

/// Remove the overlay of `path`
pub fn clear<S>(store: &mut S, path: &Path) -> Result<(), BufferError>
where
    S: BufferStore + ?Sized,
{
    store.clear_marks(path)
}

fn push_removed(out: &mut String, lines: &[String]) {
    for text in lines {
        out.push_str(format!("{:<4}  {}", "-", text).trim_end());
        out.push('\n');
    }
}

/// Format a buffer and its overlay as plain text.
///
/// Each buffer line is prefixed with its number and a `+` gutter when it is
/// highlighted as added. Removed lines appear as `-` rows above their anchor
/// and summaries follow their line after `<-`. Marks anchored past the end of
/// the buffer are listed at the bottom.
pub fn view(lines: &[String], marks: &[Mark]) -> String {
    let mut result = String::new();
    let anchored = |n: u32, mark: &Mark| mark.line().max(1) == n;

    for (i, text) in lines.iter().enumerate() {
        let n = i as u32 + 1;

        for mark in marks.iter().filter(|m| anchored(n, *m)) {
            if let Mark::Removed { lines, .. } = mark {
                push_removed(&mut result, lines);
            }
        }

        let added = marks
            .iter()
            .any(|m| matches!(m, Mark::Added { line } if *line == n));
        let gutter = if added { '+' } else { ' ' };
        let mut row = format!("{:<4}{} {}", n, gutter, text);

        for mark in marks.iter().filter(|m| anchored(n, *m)) {
            if let Mark::Summary { text, .. } = mark {
                row.push_str("  <- ");
                row.push_str(text);
            }
        }

        result.push_str(row.trim_end());
        result.push('\n');
    }

    let past_end = lines.len() as u32;
    for mark in marks.iter().filter(|m| m.line().max(1) > past_end) {
        match mark {
            Mark::Removed { lines, .. } => push_removed(&mut result, lines),
            Mark::Summary { text, .. } => {
                result.push_str(&format!("{:<4}  <- {}\n", "~", text));
            }
            Mark::Added { .. } => {}
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBufferStore;
    use crate::diff::{DiffLine, Range, parse_hunks};
    use similar_asserts::assert_eq;

    const PATH: &str = "notes.txt";

    fn setup(text: &str, diff: &str) -> (MemoryBufferStore, Vec<Hunk>) {
        let mut store = MemoryBufferStore::new();
        store.open_text(PATH, text);
        (store, parse_hunks(diff))
    }

    #[test]
    fn render_marks_added_removed_and_summary() {
        let (mut store, hunks) = setup(
            "first\ncontext\nnew line\nextra line\ntail\n",
            "@@ -2,2 +2,3 @@\n context\n-old line\n+new line\n+extra line\n",
        );
        render(&mut store, Path::new(PATH), &hunks, "a/r/A").unwrap();

        assert_eq!(
            store.marks(Path::new(PATH)),
            vec![
                Mark::Added { line: 3 },
                Mark::Added { line: 4 },
                Mark::Removed {
                    line: 2,
                    lines: vec!["old line".to_string()],
                },
                Mark::Summary {
                    line: 2,
                    text: "[hunk 1] a/r/A".to_string(),
                },
            ]
        );
    }

    #[test]
    fn render_is_idempotent() {
        let (mut store, hunks) = setup(
            "a\nB\nc\nd\nE\n",
            "@@ -2 +2 @@\n-b\n+B\n@@ -5 +5 @@\n-e\n+E\n",
        );
        let path = Path::new(PATH);

        render(&mut store, path, &hunks, "a/r/A").unwrap();
        let once = store.marks(path);
        render(&mut store, path, &hunks, "a/r/A").unwrap();

        assert_eq!(store.marks(path), once);
        assert_eq!(once.len(), 6);
    }

    #[test]
    fn render_numbers_hunks_from_one() {
        let (mut store, hunks) = setup(
            "a\nB\nc\nd\nE\n",
            "@@ -2 +2 @@\n-b\n+B\n@@ -5 +5 @@\n-e\n+E\n",
        );
        render(&mut store, Path::new(PATH), &hunks, "go").unwrap();

        let summaries: Vec<_> = store
            .marks(Path::new(PATH))
            .into_iter()
            .filter_map(|m| match m {
                Mark::Summary { line, text } => Some((line, text)),
                _ => None,
            })
            .collect();
        assert_eq!(
            summaries,
            vec![
                (2, "[hunk 1] go".to_string()),
                (5, "[hunk 2] go".to_string())
            ]
        );
    }

    #[test]
    fn render_pure_deletion_anchors_below_preceding_line() {
        let (mut store, hunks) = setup("a\nc\n", "@@ -2 +1,0 @@\n-b\n");
        render(&mut store, Path::new(PATH), &hunks, "go").unwrap();
        assert_eq!(
            store.marks(Path::new(PATH)),
            vec![
                Mark::Removed {
                    line: 2,
                    lines: vec!["b".to_string()],
                },
                Mark::Summary {
                    line: 2,
                    text: "[hunk 1] go".to_string(),
                },
            ]
        );
    }

    #[test]
    fn render_anchor_at_last_line_number_does_not_overflow() {
        let (mut store, _) = setup("a\n", "");
        let hunks = vec![Hunk {
            old: Range::new(1, 2),
            new: Range::new(u32::MAX, 0),
            lines: vec![DiffLine::remove("x"), DiffLine::remove("y")],
        }];
        render(&mut store, Path::new(PATH), &hunks, "go").unwrap();

        assert_eq!(
            store.marks(Path::new(PATH)),
            vec![
                Mark::Removed {
                    line: u32::MAX,
                    lines: vec!["x".to_string(), "y".to_string()],
                },
                Mark::Summary {
                    line: u32::MAX,
                    text: "[hunk 1] go".to_string(),
                },
            ]
        );
    }

    #[test]
    fn render_with_no_hunks_clears() {
        let (mut store, hunks) = setup("a\nB\n", "@@ -2 +2 @@\n-b\n+B\n");
        let path = Path::new(PATH);
        render(&mut store, path, &hunks, "go").unwrap();
        render(&mut store, path, &[], "go").unwrap();
        assert!(store.marks(path).is_empty());
    }

    #[test]
    fn render_unknown_buffer_fails() {
        let mut store = MemoryBufferStore::new();
        let hunks = parse_hunks("@@ -1 +1 @@\n-a\n+b\n");
        assert!(render(&mut store, Path::new("missing"), &hunks, "go").is_err());
    }

    #[test]
    fn view_of_rendered_overlay() {
        let (mut store, hunks) = setup(
            "first\ncontext\nnew line\nextra line\ntail\n",
            "@@ -2,2 +2,3 @@\n context\n-old line\n+new line\n+extra line\n",
        );
        let path = Path::new(PATH);
        render(&mut store, path, &hunks, "a/r/A").unwrap();

        let lines = store.lines(path).unwrap();
        insta::assert_snapshot!(view(&lines, &store.marks(path)), @r"
        1     first
        -     old line
        2     context  <- [hunk 1] a/r/A
        3   + new line
        4   + extra line
        5     tail
        ");
    }

    #[test]
    fn view_places_removed_block_above_hunk_start() {
        let (mut store, hunks) = setup("a\n", "@@ -1,2 +1 @@\n a\n-gone\n");
        let path = Path::new(PATH);
        render(&mut store, path, &hunks, "go").unwrap();

        let lines = store.lines(path).unwrap();
        insta::assert_snapshot!(view(&lines, &store.marks(path)), @r"
        -     gone
        1     a  <- [hunk 1] go
        ");
    }

    #[test]
    fn view_lists_marks_past_the_end() {
        let (mut store, hunks) = setup("a\n", "@@ -2 +1,0 @@\n-gone\n");
        let path = Path::new(PATH);
        render(&mut store, path, &hunks, "go").unwrap();

        let lines = store.lines(path).unwrap();
        insta::assert_snapshot!(view(&lines, &store.marks(path)), @r"
        1     a
        -     gone
        ~     <- [hunk 1] go
        ");
    }

    #[test]
    fn view_without_marks() {
        let lines = vec!["plain".to_string(), String::new()];
        assert_eq!(view(&lines, &[]), "1     plain\n2\n");
    }
}
