//! Where unified diff text comes from.

use crate::config::Config;
use error_set::error_set;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

error_set! {
    /// Errors from obtaining a diff
    SourceError := {
        #[display("Failed to run git diff: {message}")]
        SpawnFailed { message: String },
        #[display("git diff failed: {stderr}")]
        ExitStatus { stderr: String },
        #[display("Invalid UTF-8 in git diff output: {message}")]
        InvalidUtf8 { message: String },
    }
}

/// Produces unified diff text for one file
pub trait DiffSource {
    /// Diff of `path` against the source's reference point.
    ///
    /// Returns empty text when the file has no changes.
    fn diff(&self, path: &Path) -> Result<String, SourceError>;
}

/// Diffs the working tree against a revision by running `git diff`.
///
/// The call blocks until git exits.
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    repo: PathBuf,
    git: String,
    reference: String,
    context_lines: u32,
}

impl GitDiffSource {
    pub fn new(repo: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            repo: repo.into(),
            git: config.git.clone(),
            reference: config.reference.clone(),
            context_lines: config.context_lines,
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.git);
        command
            .arg("-C")
            .arg(&self.repo)
            .args(["diff", "--no-ext-diff", "--no-color"])
            .arg(format!("-U{}", self.context_lines))
            .arg(&self.reference)
            .arg("--")
            .arg(path);
        command
    }
}

impl DiffSource for GitDiffSource {
    fn diff(&self, path: &Path) -> Result<String, SourceError> {
        let output = self
            .command(path)
            .output()
            .map_err(|e| SourceError::SpawnFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::ExitStatus {
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| SourceError::InvalidUtf8 {
            message: e.to_string(),
        })
    }
}

/// Serves fixed diff text per path. Paths without an entry have no changes.
#[derive(Debug, Clone, Default)]
pub struct StaticDiffSource {
    diffs: HashMap<PathBuf, Result<String, String>>,
}

impl StaticDiffSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diff text returned for `path`
    pub fn insert(&mut self, path: impl Into<PathBuf>, diff: impl Into<String>) {
        self.diffs.insert(path.into(), Ok(diff.into()));
    }

    /// Make `path` fail as if the diff command exited with `stderr`
    pub fn fail(&mut self, path: impl Into<PathBuf>, stderr: impl Into<String>) {
        self.diffs.insert(path.into(), Err(stderr.into()));
    }
}

impl DiffSource for StaticDiffSource {
    fn diff(&self, path: &Path) -> Result<String, SourceError> {
        match self.diffs.get(path) {
            Some(Ok(diff)) => Ok(diff.clone()),
            Some(Err(stderr)) => Err(SourceError::ExitStatus {
                stderr: stderr.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}
