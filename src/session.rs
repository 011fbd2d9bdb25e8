//! Pending hunks per file and the accept/reject decisions applied to them.
//!
//! A [`Session`] is the whole application context: configuration, the buffer
//! store, the diff source and every [`PendingDiffSet`]. Nothing is global;
//! construct one per editor instance (or per test).

use crate::buffer::{BufferError, BufferStore};
use crate::config::Config;
use crate::diff::{Hunk, MissingNewline, missing_newline, parse_hunks, reverse_apply};
use crate::overlay;
use crate::source::DiffSource;
use error_set::error_set;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

error_set! {
    /// Errors from hunk decisions
    SessionError := {
        /// No overlay is being shown for the path
        #[display("No pending diff for {path}")]
        NoPendingDiff { path: String },
        /// The 1-based index does not name a pending hunk
        #[display("Hunk {index} out of range for {path} ({count} pending)")]
        HunkOutOfRange { path: String, index: usize, count: usize },
        /// The hunk's old range is not covered by the snapshot
        #[display("Snapshot of {path} does not cover hunk {index}")]
        SnapshotMismatch { path: String, index: usize },
        BufferError(BufferError),
    }
}

/// Not-yet-resolved hunks of one file plus the text needed to revert them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDiffSet {
    target: PathBuf,
    hunks: Vec<Hunk>,
    original_content: Vec<String>,
    missing_newline: MissingNewline,
}

impl PendingDiffSet {
    /// The buffer this set overlays
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Pending hunks; position `i` is hunk `i + 1` in the user surface
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// The file as it was before any of the hunks
    pub fn original_content(&self) -> &[String] {
        &self.original_content
    }

    /// Which sides of the diff end without a final newline
    pub fn missing_newline(&self) -> MissingNewline {
        self.missing_newline
    }

    pub fn len(&self) -> usize {
        self.hunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// 0-based position of the 1-based `index`
    fn position(&self, index: usize) -> Result<usize, SessionError> {
        if index == 0 || index > self.hunks.len() {
            return Err(SessionError::HunkOutOfRange {
                path: self.target.display().to_string(),
                index,
                count: self.hunks.len(),
            });
        }
        Ok(index - 1)
    }
}

/// Whether every hunk's post-change lines are what the buffer holds
fn matches_buffer(current: &[String], hunks: &[Hunk]) -> bool {
    hunks.iter().all(|hunk| {
        current
            .get(hunk.new.indices())
            .is_some_and(|region| region.iter().map(String::as_str).eq(hunk.new_lines()))
    })
}

/// Overlay manager and hunk decision engine
pub struct Session<S, D> {
    config: Config,
    store: S,
    source: D,
    pending: HashMap<PathBuf, PendingDiffSet>,
    final_newline: HashMap<PathBuf, bool>,
}

impl<S: BufferStore, D: DiffSource> Session<S, D> {
    pub fn new(config: Config, store: S, source: D) -> Self {
        Self {
            config,
            store,
            source,
            pending: HashMap::new(),
            final_newline: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    /// The pending set shown for `path`, if any
    pub fn pending(&self, path: &Path) -> Option<&PendingDiffSet> {
        self.pending.get(path)
    }

    /// Paths currently showing an overlay
    pub fn pending_paths(&self) -> impl Iterator<Item = &Path> {
        self.pending.keys().map(PathBuf::as_path)
    }

    /// Number of pending hunks for `path` (zero without a pending set)
    pub fn hunk_count(&self, path: &Path) -> usize {
        self.pending.get(path).map_or(0, PendingDiffSet::len)
    }

    /// Whether the buffer of `path` ends with a newline, when its diff says.
    ///
    /// `None` means no diff marked the end of the file, so the file keeps its
    /// own state. Rejections that restore the end of the file switch this to
    /// the pre-change state.
    pub fn final_newline(&self, path: &Path) -> Option<bool> {
        self.final_newline.get(path).copied()
    }

    /// Fetch the diff of `path`, show it as an overlay and start tracking it.
    ///
    /// Returns `false` when there is nothing to show: the diff source failed,
    /// the diff has no hunks, or the buffer does not hold the diff's
    /// post-change text. Any set already shown for `path` is replaced, or
    /// dropped with its overlay in the last two cases.
    pub fn show_diff(&mut self, path: &Path) -> bool {
        let text = match self.source.diff(path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %path.display(), "diff unavailable: {}", e);
                return false;
            }
        };

        let hunks = parse_hunks(&text);
        if hunks.is_empty() {
            debug!(path = %path.display(), "no changes to show");
            self.drop_stale(path);
            return false;
        }

        let current = match self.store.lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(path = %path.display(), "cannot show diff: {}", e);
                self.drop_stale(path);
                return false;
            }
        };
        if !matches_buffer(&current, &hunks) {
            warn!(path = %path.display(), "diff does not match buffer contents");
            self.drop_stale(path);
            return false;
        }

        if let Err(e) = overlay::render(&mut self.store, path, &hunks, &self.config.instructions) {
            warn!(path = %path.display(), "cannot render overlay: {}", e);
            return false;
        }

        info!(path = %path.display(), hunks = hunks.len(), "showing diff");
        let missing = missing_newline(&text);
        if missing.is_known() {
            self.final_newline.insert(path.to_path_buf(), !missing.new);
        } else {
            self.final_newline.remove(path);
        }

        let original_content = reverse_apply(&current, &hunks);
        self.pending.insert(
            path.to_path_buf(),
            PendingDiffSet {
                target: path.to_path_buf(),
                hunks,
                original_content,
                missing_newline: missing,
            },
        );
        true
    }

    /// Refresh the overlay of a file after it changed on disk or in the editor
    pub fn on_file_changed(&mut self, path: &Path) -> bool {
        self.show_diff(path)
    }

    /// Keep hunk `index` (1-based) as it is and stop tracking it.
    pub fn accept_hunk(&mut self, path: &Path, index: usize) -> Result<(), SessionError> {
        let set = self.set_mut(path)?;
        let position = set.position(index)?;
        set.hunks.remove(position);

        info!(path = %path.display(), index, "accepted hunk");
        self.refresh(path)
    }

    /// Write the pre-change text of hunk `index` (1-based) back into the
    /// buffer and stop tracking it.
    ///
    /// Later hunks are moved by the change in line count so their overlay
    /// stays on the right lines.
    pub fn reject_hunk(&mut self, path: &Path, index: usize) -> Result<(), SessionError> {
        let set = self.set_mut(path)?;
        let position = set.position(index)?;
        let hunk = &set.hunks[position];
        let target = hunk.new.indices();
        let delta = hunk.delta();
        let restores_end = hunk.old.indices().end >= set.original_content.len();
        let missing = set.missing_newline;
        let original = set
            .original_content
            .get(hunk.old.indices())
            .map(<[String]>::to_vec)
            .ok_or_else(|| SessionError::SnapshotMismatch {
                path: path.display().to_string(),
                index,
            })?;

        self.store.set_lines(path, target.start, target.end, original)?;
        if restores_end {
            self.restore_final_newline(path, missing);
        }

        let set = self.set_mut(path)?;
        set.hunks.remove(position);
        for later in &mut set.hunks[position..] {
            later.new.start = u32::try_from(i64::from(later.new.start) - delta).unwrap_or(0);
        }

        info!(path = %path.display(), index, "rejected hunk");
        self.refresh(path)
    }

    /// Keep every pending change of `path` and remove its overlay.
    pub fn accept_all(&mut self, path: &Path) -> Result<(), SessionError> {
        let set = self.pending.remove(path).ok_or_else(|| no_pending(path))?;

        info!(path = %path.display(), hunks = set.len(), "accepted all hunks");
        overlay::clear(&mut self.store, path)?;
        Ok(())
    }

    /// Restore the whole buffer to its pre-change content and remove the
    /// overlay.
    pub fn reject_all(&mut self, path: &Path) -> Result<(), SessionError> {
        let set = self.pending.get(path).ok_or_else(|| no_pending(path))?;
        let original = set.original_content.clone();
        let missing = set.missing_newline;
        let len = self.store.lines(path)?.len();

        self.store.set_lines(path, 0, len, original)?;
        self.restore_final_newline(path, missing);

        if let Some(set) = self.pending.remove(path) {
            info!(path = %path.display(), hunks = set.len(), "rejected all hunks");
        }
        overlay::clear(&mut self.store, path)?;
        Ok(())
    }

    fn set_mut(&mut self, path: &Path) -> Result<&mut PendingDiffSet, SessionError> {
        self.pending.get_mut(path).ok_or_else(|| no_pending(path))
    }

    /// Re-render the remaining hunks, or drop the set once none are left
    fn refresh(&mut self, path: &Path) -> Result<(), SessionError> {
        if self.hunk_count(path) == 0 {
            self.pending.remove(path);
            overlay::clear(&mut self.store, path)?;
            return Ok(());
        }

        if let Some(set) = self.pending.get(path) {
            overlay::render(&mut self.store, path, &set.hunks, &self.config.instructions)?;
        }
        Ok(())
    }

    /// The end of the buffer is pre-change text again
    fn restore_final_newline(&mut self, path: &Path, missing: MissingNewline) {
        if missing.is_known() {
            self.final_newline.insert(path.to_path_buf(), !missing.old);
        }
    }

    /// Forget a set whose changes disappeared
    fn drop_stale(&mut self, path: &Path) {
        if self.pending.remove(path).is_none() {
            return;
        }
        if let Err(e) = overlay::clear(&mut self.store, path) {
            debug!(path = %path.display(), "cannot clear stale overlay: {}", e);
        }
    }
}

fn no_pending(path: &Path) -> SessionError {
    SessionError::NoPendingDiff {
        path: path.display().to_string(),
    }
}
