use std::fmt;

/// Classification of a single line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Present only in the new version (`+`)
    Add,
    /// Present only in the old version (`-`)
    Remove,
    /// Present in both versions (` `)
    Context,
}

impl LineKind {
    /// The unified diff prefix character for this kind
    pub fn prefix(self) -> char {
        match self {
            LineKind::Add => '+',
            LineKind::Remove => '-',
            LineKind::Context => ' ',
        }
    }
}

/// One line of a hunk, prefix stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
}

impl DiffLine {
    pub fn add(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Add,
            text: text.into(),
        }
    }

    pub fn remove(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Remove,
            text: text.into(),
        }
    }

    pub fn context(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Context,
            text: text.into(),
        }
    }
}

/// A 1-based line range from a hunk header (`-start,count` or `+start,count`).
///
/// When `count` is zero, `start` names the line *after which* the empty
/// region sits, following the unified diff convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: u32,
    pub count: u32,
}

impl Range {
    pub fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    /// 0-based index of the first line of the region
    pub fn offset(&self) -> usize {
        if self.count == 0 {
            self.start as usize
        } else {
            self.start.saturating_sub(1) as usize
        }
    }

    /// 0-based half-open index range covered by the region
    pub fn indices(&self) -> std::ops::Range<usize> {
        let offset = self.offset();
        offset..offset + self.count as usize
    }

    fn fmt_with_sign(&self, f: &mut fmt::Formatter<'_>, sign: char) -> fmt::Result {
        match self.count {
            1 => write!(f, "{}{}", sign, self.start),
            n => write!(f, "{}{},{}", sign, self.start, n),
        }
    }
}

/// One contiguous region of change in a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old: Range,
    pub new: Range,
    /// Lines in diff order
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Build a hunk from its lines, deriving both counts from them.
    pub fn from_lines(old_start: u32, new_start: u32, lines: Vec<DiffLine>) -> Self {
        let old_count = lines.iter().filter(|l| l.kind != LineKind::Add).count() as u32;
        let new_count = lines.iter().filter(|l| l.kind != LineKind::Remove).count() as u32;
        Self {
            old: Range::new(old_start, old_count),
            new: Range::new(new_start, new_count),
            lines,
        }
    }

    pub fn old_start(&self) -> u32 {
        self.old.start
    }

    pub fn old_count(&self) -> u32 {
        self.old.count
    }

    pub fn new_start(&self) -> u32 {
        self.new.start
    }

    pub fn new_count(&self) -> u32 {
        self.new.count
    }

    /// The region as it was before the change (context and removed lines)
    pub fn old_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Add)
            .map(|l| l.text.as_str())
    }

    /// The region as it is after the change (context and added lines)
    pub fn new_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Remove)
            .map(|l| l.text.as_str())
    }

    /// Whether the header counts agree with the lines actually present
    pub fn is_consistent(&self) -> bool {
        self.old_lines().count() == self.old.count as usize
            && self.new_lines().count() == self.new.count as usize
    }

    /// Net change in line count when this hunk is applied (new - old)
    pub fn delta(&self) -> i64 {
        i64::from(self.new.count) - i64::from(self.old.count)
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@ ")?;
        self.old.fmt_with_sign(f, '-')?;
        write!(f, " ")?;
        self.new.fmt_with_sign(f, '+')?;
        writeln!(f, " @@")?;

        for line in &self.lines {
            writeln!(f, "{}{}", line.kind.prefix(), line.text)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn sample() -> Hunk {
        Hunk::from_lines(
            2,
            2,
            vec![
                DiffLine::context("context"),
                DiffLine::remove("old line"),
                DiffLine::add("new line"),
                DiffLine::add("extra line"),
            ],
        )
    }

    #[test]
    fn from_lines_derives_counts() {
        let hunk = sample();
        assert_eq!(hunk.old, Range::new(2, 2));
        assert_eq!(hunk.new, Range::new(2, 3));
        assert!(hunk.is_consistent());
        assert_eq!(hunk.delta(), 1);
    }

    #[test]
    fn old_and_new_lines_reconstruct_regions() {
        let hunk = sample();
        assert_eq!(hunk.old_lines().collect::<Vec<_>>(), vec!["context", "old line"]);
        assert_eq!(
            hunk.new_lines().collect::<Vec<_>>(),
            vec!["context", "new line", "extra line"]
        );
    }

    #[test]
    fn render_mixed_change() {
        assert_eq!(
            sample().to_string(),
            "@@ -2,2 +2,3 @@\n context\n-old line\n+new line\n+extra line\n"
        );
    }

    #[test]
    fn render_elides_single_counts() {
        let hunk = Hunk::from_lines(
            10,
            10,
            vec![DiffLine::remove("old version"), DiffLine::add("new version")],
        );
        assert_eq!(hunk.to_string(), "@@ -10 +10 @@\n-old version\n+new version\n");
    }

    #[test]
    fn render_pure_insertion() {
        let hunk = Hunk::from_lines(10, 11, vec![DiffLine::add("new line here")]);
        assert_eq!(hunk.to_string(), "@@ -10,0 +11 @@\n+new line here\n");
    }

    #[test]
    fn range_offset_follows_empty_region_convention() {
        assert_eq!(Range::new(10, 2).offset(), 9);
        assert_eq!(Range::new(10, 2).indices(), 9..11);
        // Empty region after line 10
        assert_eq!(Range::new(10, 0).offset(), 10);
        assert_eq!(Range::new(10, 0).indices(), 10..10);
        // Empty file
        assert_eq!(Range::new(0, 0).indices(), 0..0);
    }
}
