//! Parsing unified diff text into [`Hunk`]s.
//!
//! Only hunk structure is extracted. File headers (`diff --git`, `index`,
//! `--- a/...`, `+++ b/...`) and markers such as `\ No newline at end of file`
//! are skipped by [`parse_hunks`]; [`missing_newline`] reads those markers
//! separately.
//!
//! # Examples
//!
//! ```
//! use diff_overlay::diff::{parse_hunks, DiffLine};
//!
//! let hunks = parse_hunks("@@ -2,2 +2,3 @@\n context\n-old line\n+new line\n+extra line\n");
//! assert_eq!(hunks.len(), 1);
//! assert_eq!(hunks[0].old_count(), 2);
//! assert_eq!(hunks[0].new_count(), 3);
//! assert_eq!(hunks[0].lines[1], DiffLine::remove("old line"));
//! ```

use super::hunk::{DiffLine, Hunk, LineKind, Range};
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as number},
    combinator::opt,
    sequence::preceded,
};

/// `start[,count]`, count defaulting to 1
fn range(input: &str) -> IResult<&str, Range> {
    (number, opt(preceded(char(','), number)))
        .map(|(start, count)| Range::new(start, count.unwrap_or(1)))
        .parse(input)
}

/// `@@ -old +new @@`, anything after the closing marker is left unparsed
fn header(input: &str) -> IResult<&str, (Range, Range)> {
    (tag("@@ -"), range, tag(" +"), range, tag(" @@"))
        .map(|(_, old, _, new, _)| (old, new))
        .parse(input)
}

/// Parse a hunk header line into its old and new ranges.
///
/// Returns `None` if the line is not a hunk header. A trailing section
/// heading (`@@ -1 +1 @@ fn main() {`) is accepted and ignored.
pub fn parse_header(line: &str) -> Option<(Range, Range)> {
    header(line).ok().map(|(_, ranges)| ranges)
}

/// A hunk still receiving lines, with the number of old/new lines seen so far
struct OpenHunk {
    hunk: Hunk,
    old_seen: u32,
    new_seen: u32,
}

impl OpenHunk {
    fn is_complete(&self) -> bool {
        self.old_seen >= self.hunk.old.count && self.new_seen >= self.hunk.new.count
    }

    fn push(&mut self, line: DiffLine) {
        match line.kind {
            LineKind::Add => self.new_seen += 1,
            LineKind::Remove => self.old_seen += 1,
            LineKind::Context => {
                self.old_seen += 1;
                self.new_seen += 1;
            }
        }
        self.hunk.lines.push(line);
    }
}

/// Kind of a body line from its leading character
fn line_kind(line: &str) -> Option<LineKind> {
    match line.chars().next()? {
        '+' => Some(LineKind::Add),
        '-' => Some(LineKind::Remove),
        ' ' => Some(LineKind::Context),
        _ => None,
    }
}

/// Classify a body line, stripping its prefix
fn body_line(line: &str) -> Option<DiffLine> {
    let kind = line_kind(line)?;
    Some(DiffLine {
        kind,
        text: line[1..].to_string(),
    })
}

/// Sides of a diff whose last line has no terminating newline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingNewline {
    /// The pre-change file ends without a newline
    pub old: bool,
    /// The post-change file ends without a newline
    pub new: bool,
}

impl MissingNewline {
    /// Whether the diff says anything about the end of the file
    pub fn is_known(&self) -> bool {
        self.old || self.new
    }
}

/// Read the `\ No newline at end of file` markers of a diff.
///
/// A marker applies to the side of the body line right before it: a removed
/// line means the old file, an added line the new one, a context line both.
pub fn missing_newline(text: &str) -> MissingNewline {
    let mut missing = MissingNewline::default();
    let mut previous = None;

    for line in text.lines() {
        if parse_header(line).is_some() {
            previous = None;
        } else if line.starts_with('\\') {
            match previous {
                Some(LineKind::Remove) => missing.old = true,
                Some(LineKind::Add) => missing.new = true,
                Some(LineKind::Context) => {
                    missing.old = true;
                    missing.new = true;
                }
                None => {}
            }
        } else {
            previous = line_kind(line);
        }
    }

    missing
}

/// Parse unified diff text for a single file into its hunks.
///
/// Text without any hunk header (including the empty string) yields an empty
/// vector. Once a hunk has received as many lines as its header declares,
/// further lines are ignored until the next header, so trailing file
/// headers of a following diff section never leak into it.
pub fn parse_hunks(text: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current: Option<OpenHunk> = None;

    for line in text.lines() {
        if let Some((old, new)) = parse_header(line) {
            hunks.extend(current.take().map(|open| open.hunk));
            current = Some(OpenHunk {
                hunk: Hunk {
                    old,
                    new,
                    lines: Vec::new(),
                },
                old_seen: 0,
                new_seen: 0,
            });
            continue;
        }

        let Some(open) = current.as_mut() else {
            continue;
        };
        if open.is_complete() {
            continue;
        }
        if let Some(parsed) = body_line(line) {
            open.push(parsed);
        }
    }

    hunks.extend(current.map(|open| open.hunk));
    hunks
}
