use error_set::error_set;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod buffer;
pub mod config;
pub mod diff;
pub mod overlay;
pub mod session;
pub mod source;

pub use buffer::{BufferError, BufferStore, Mark, MemoryBufferStore};
pub use config::{Config, ConfigError};
pub use diff::{DiffLine, Hunk, LineKind, parse_hunks};
pub use session::{PendingDiffSet, Session, SessionError};
pub use source::{DiffSource, GitDiffSource, SourceError, StaticDiffSource};

error_set! {
    /// Top-level error for diff-overlay operations
    OverlayError := {
        #[display("No changes to review in {file}")]
        NothingToShow { file: String },
        SessionError(SessionError),
        BufferError(BufferError),
        ConfigError(ConfigError),
    } || FileError

    /// Errors from reading and writing working-tree files
    FileError := {
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to write {path}: {message}")]
        WriteFailed { path: String, message: String },
    }
}

/// How a file on disk terminates its lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineEnding {
    crlf: bool,
    final_newline: bool,
}

impl LineEnding {
    /// Taken from the first line break; mixed endings are not kept
    fn detect(text: &str) -> Self {
        Self {
            crlf: text
                .find('\n')
                .is_some_and(|i| text[..i].ends_with('\r')),
            final_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    fn terminator(self) -> &'static str {
        if self.crlf { "\r\n" } else { "\n" }
    }
}

/// Files of one repository opened for review.
///
/// Buffers live in memory; [`Workspace::save`] writes a buffer back to the
/// working tree with the line terminator the file was read with. The final
/// newline follows the file, unless a rejection restored the pre-change end
/// of the file.
pub struct Workspace {
    repo: PathBuf,
    session: Session<MemoryBufferStore, GitDiffSource>,
    line_endings: HashMap<PathBuf, LineEnding>,
}

impl Workspace {
    /// Create a workspace for the repository at `repo`
    ///
    /// # Examples
    /// ```no_run
    /// # use diff_overlay::{Config, Workspace};
    /// # use std::path::Path;
    /// let mut workspace = Workspace::new(".", Config::default());
    /// workspace.open(Path::new("src/lib.rs")).unwrap();
    /// workspace.session_mut().reject_hunk(Path::new("src/lib.rs"), 1).unwrap();
    /// workspace.save(Path::new("src/lib.rs")).unwrap();
    /// ```
    pub fn new(repo: impl Into<PathBuf>, config: Config) -> Self {
        let repo = repo.into();
        let source = GitDiffSource::new(repo.clone(), &config);
        Self {
            repo,
            session: Session::new(config, MemoryBufferStore::new(), source),
            line_endings: HashMap::new(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    pub fn session(&self) -> &Session<MemoryBufferStore, GitDiffSource> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<MemoryBufferStore, GitDiffSource> {
        &mut self.session
    }

    /// Load `file` (relative to the repository) into a buffer and show its
    /// diff.
    pub fn open(&mut self, file: &Path) -> Result<(), OverlayError> {
        let full_path = self.repo.join(file);
        let text = std::fs::read_to_string(&full_path).map_err(|e| FileError::ReadFailed {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })?;

        self.line_endings
            .insert(file.to_path_buf(), LineEnding::detect(&text));
        self.session.store_mut().open_text(file, &text);

        if !self.session.show_diff(file) {
            return Err(OverlayError::NothingToShow {
                file: file.display().to_string(),
            });
        }
        Ok(())
    }

    /// Write the buffer of `file` back to the working tree
    pub fn save(&self, file: &Path) -> Result<(), OverlayError> {
        let lines = self.session.store().lines(file)?;
        let ending = self.line_endings.get(file).copied().unwrap_or(LineEnding {
            crlf: false,
            final_newline: true,
        });
        let mut text = lines.join(ending.terminator());
        let newline = self
            .session
            .final_newline(file)
            .unwrap_or(ending.final_newline);
        if newline && !lines.is_empty() {
            text.push_str(ending.terminator());
        }

        let full_path = self.repo.join(file);
        std::fs::write(&full_path, text).map_err(|e| FileError::WriteFailed {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("Wrote {}", full_path.display());
        Ok(())
    }

    /// The buffer of `file` with its current overlay, as plain text
    pub fn view(&self, file: &Path) -> Result<String, OverlayError> {
        let store = self.session.store();
        Ok(overlay::view(&store.lines(file)?, &store.marks(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn line_ending_of_unix_text() {
        assert_eq!(
            LineEnding::detect("a\nb"),
            LineEnding {
                crlf: false,
                final_newline: false
            }
        );
        assert_eq!(LineEnding::detect("a\nb\n").terminator(), "\n");
    }

    #[test]
    fn line_ending_of_crlf_text() {
        let ending = LineEnding::detect("one\r\ntwo\r\n");
        assert!(ending.crlf && ending.final_newline);
        assert_eq!(ending.terminator(), "\r\n");
    }

    #[test]
    fn line_ending_of_empty_text() {
        assert_eq!(
            LineEnding::detect(""),
            LineEnding {
                crlf: false,
                final_newline: true
            }
        );
    }
}
