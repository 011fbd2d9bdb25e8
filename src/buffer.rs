//! Live buffers and their overlay marks.
//!
//! [`BufferStore`] is the narrow surface the session needs from whatever
//! holds file contents: read all lines, replace a line range, and manage a
//! clearable set of visual marks per buffer. [`MemoryBufferStore`] keeps
//! everything in memory.

use error_set::error_set;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

error_set! {
    /// Errors from buffer access
    BufferError := {
        /// No buffer is open for the path
        #[display("No open buffer for {path}")]
        UnknownBuffer { path: String },
        /// A line range does not fit the buffer
        #[display("Line range {start}..{end} is outside buffer of {len} lines")]
        InvalidRange { start: usize, end: usize, len: usize },
    }
}

/// A visual annotation over a buffer. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    /// Highlight an added line in place
    Added { line: u32 },
    /// Virtual lines shown above `line` without occupying buffer lines
    Removed { line: u32, lines: Vec<String> },
    /// Text shown at the end of `line`
    Summary { line: u32, text: String },
}

impl Mark {
    /// The buffer line the mark is anchored to
    pub fn line(&self) -> u32 {
        match self {
            Mark::Added { line } | Mark::Removed { line, .. } | Mark::Summary { line, .. } => *line,
        }
    }
}

/// Access to live buffers, keyed by file path
pub trait BufferStore {
    /// Full content of the buffer, one entry per line
    fn lines(&self, path: &Path) -> Result<Vec<String>, BufferError>;

    /// Replace the 0-based half-open line range `start..end` with `lines`.
    ///
    /// `start == end` inserts before line `start`.
    fn set_lines(
        &mut self,
        path: &Path,
        start: usize,
        end: usize,
        lines: Vec<String>,
    ) -> Result<(), BufferError>;

    /// Remove every overlay mark of the buffer
    fn clear_marks(&mut self, path: &Path) -> Result<(), BufferError>;

    /// Add one overlay mark to the buffer
    fn add_mark(&mut self, path: &Path, mark: Mark) -> Result<(), BufferError>;

    /// Current overlay marks, in insertion order
    fn marks(&self, path: &Path) -> Vec<Mark>;
}

#[derive(Debug, Default)]
struct Buffer {
    lines: Vec<String>,
    marks: Vec<Mark>,
}

/// In-memory [`BufferStore`]
#[derive(Debug, Default)]
pub struct MemoryBufferStore {
    buffers: HashMap<PathBuf, Buffer>,
}

impl MemoryBufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or replace) a buffer with the given content
    pub fn open(&mut self, path: impl Into<PathBuf>, lines: Vec<String>) {
        self.buffers.insert(
            path.into(),
            Buffer {
                lines,
                marks: Vec::new(),
            },
        );
    }

    /// Open a buffer from text, splitting it into lines
    pub fn open_text(&mut self, path: impl Into<PathBuf>, text: &str) {
        self.open(path, text.lines().map(str::to_string).collect());
    }

    /// Close a buffer, returning its final lines
    pub fn close(&mut self, path: &Path) -> Option<Vec<String>> {
        self.buffers.remove(path).map(|buffer| buffer.lines)
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.buffers.contains_key(path)
    }

    /// Borrow the lines of an open buffer
    pub fn contents(&self, path: &Path) -> Option<&[String]> {
        self.buffers.get(path).map(|buffer| buffer.lines.as_slice())
    }

    fn buffer_mut(&mut self, path: &Path) -> Result<&mut Buffer, BufferError> {
        self.buffers
            .get_mut(path)
            .ok_or_else(|| BufferError::UnknownBuffer {
                path: path.display().to_string(),
            })
    }
}

impl BufferStore for MemoryBufferStore {
    fn lines(&self, path: &Path) -> Result<Vec<String>, BufferError> {
        self.contents(path)
            .map(<[String]>::to_vec)
            .ok_or_else(|| BufferError::UnknownBuffer {
                path: path.display().to_string(),
            })
    }

    fn set_lines(
        &mut self,
        path: &Path,
        start: usize,
        end: usize,
        lines: Vec<String>,
    ) -> Result<(), BufferError> {
        let buffer = self.buffer_mut(path)?;
        let len = buffer.lines.len();
        if start > end || end > len {
            return Err(BufferError::InvalidRange { start, end, len });
        }
        buffer.lines.splice(start..end, lines);
        Ok(())
    }

    fn clear_marks(&mut self, path: &Path) -> Result<(), BufferError> {
        self.buffer_mut(path)?.marks.clear();
        Ok(())
    }

    fn add_mark(&mut self, path: &Path, mark: Mark) -> Result<(), BufferError> {
        self.buffer_mut(path)?.marks.push(mark);
        Ok(())
    }

    fn marks(&self, path: &Path) -> Vec<Mark> {
        self.buffers
            .get(path)
            .map(|buffer| buffer.marks.clone())
            .unwrap_or_default()
    }
}
