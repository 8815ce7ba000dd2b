use std::hash::{DefaultHasher, Hash, Hasher};

use crate::editor::EditorBuffer;
use crate::layout::LayoutConfig;
use crate::render::{Element, screenplay_container};

/// Hash text for comparing against what the store last held.
pub(super) fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.as_bytes().hash(&mut hasher);
    hasher.finish()
}

/// Which surface of a view is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Edit surface visible, preview hidden (and possibly stale).
    Editing,
    /// Preview visible, edit surface hidden.
    #[default]
    Previewing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// What raised the current status, so a later success can clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    Parse,
    Save,
    Load,
}

/// Status indicator shown alongside the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStatus {
    pub level: StatusLevel,
    pub source: StatusSource,
    pub message: String,
}

/// Unsaved-change tracking for the edit surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    dirty: bool,
    failed_saves: u32,
}

impl DirtyTracker {
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Saves that failed since the last successful one.
    pub const fn failed_saves(&self) -> u32 {
        self.failed_saves
    }

    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub const fn save_complete(&mut self) {
        self.dirty = false;
        self.failed_saves = 0;
    }

    /// Dirty stays set after a failed save.
    pub const fn save_failed(&mut self) {
        self.failed_saves = self.failed_saves.saturating_add(1);
    }

    /// Content now matches the store without us writing it (reload).
    pub const fn reset(&mut self) {
        self.dirty = false;
        self.failed_saves = 0;
    }
}

/// The complete state of one open document view.
pub struct Model {
    /// Visible surface
    pub mode: ViewMode,
    /// Authoritative in-memory document text
    pub raw_text: String,
    /// The edit surface
    pub editor: EditorBuffer,
    /// Rendered preview container (`div.screenplay`)
    pub preview: Element,
    /// Layout used for the next render
    pub layout: LayoutConfig,
    /// Unsaved-change state
    pub dirty: DirtyTracker,
    /// Set once the view has been torn down
    pub closed: bool,
    status: Option<ViewStatus>,
    /// Hash of the text last read from or written to the store
    pub(super) persisted_hash: Option<u64>,
    /// Host clock time of this view's last successful write
    pub(super) written_at_ms: Option<u64>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(String::new(), LayoutConfig::default())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("mode", &self.mode)
            .field("raw_text_bytes", &self.raw_text.len())
            .field("dirty", &self.dirty)
            .field("closed", &self.closed)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Model with `text` in both the raw buffer and the edit surface, and an
    /// empty preview.
    pub fn new(text: String, layout: LayoutConfig) -> Self {
        Self {
            mode: ViewMode::Previewing,
            editor: EditorBuffer::from_text(&text),
            raw_text: text,
            preview: screenplay_container(),
            layout,
            dirty: DirtyTracker::default(),
            closed: false,
            status: None,
            persisted_hash: None,
            written_at_ms: None,
        }
    }

    pub fn edit_surface_visible(&self) -> bool {
        self.mode == ViewMode::Editing
    }

    pub fn preview_visible(&self) -> bool {
        self.mode == ViewMode::Previewing
    }

    pub const fn status(&self) -> Option<&ViewStatus> {
        self.status.as_ref()
    }

    pub(super) fn set_status(
        &mut self,
        level: StatusLevel,
        source: StatusSource,
        message: impl Into<String>,
    ) {
        self.status = Some(ViewStatus {
            level,
            source,
            message: message.into(),
        });
    }

    /// Drop the status if it was raised by `source`.
    pub(super) fn clear_status(&mut self, source: StatusSource) {
        if self.status.as_ref().is_some_and(|s| s.source == source) {
            self.status = None;
        }
    }

    /// Replace raw text and edit surface together.
    pub(super) fn replace_text(&mut self, text: String) {
        self.editor.set_text(&text);
        self.raw_text = text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_tracker_keeps_dirty_after_failure() {
        let mut tracker = DirtyTracker::default();
        tracker.mark_dirty();
        tracker.save_failed();
        tracker.save_failed();
        assert!(tracker.is_dirty());
        assert_eq!(tracker.failed_saves(), 2);

        tracker.save_complete();
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.failed_saves(), 0);
    }

    #[test]
    fn test_clear_status_only_matching_source() {
        let mut model = Model::default();
        model.set_status(StatusLevel::Error, StatusSource::Save, "disk full");
        model.clear_status(StatusSource::Parse);
        assert!(model.status().is_some());
        model.clear_status(StatusSource::Save);
        assert!(model.status().is_none());
    }

    #[test]
    fn test_new_model_starts_previewing_with_text_in_editor() {
        let model = Model::new("FADE IN:".into(), LayoutConfig::default());
        assert!(model.preview_visible());
        assert!(!model.edit_surface_visible());
        assert_eq!(model.editor.text(), "FADE IN:");
        assert_eq!(model.raw_text, "FADE IN:");
    }
}
