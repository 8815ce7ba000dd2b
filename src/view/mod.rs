//! Document view: edit surface, preview and persistence kept consistent.
//!
//! A view is either [`ViewMode::Editing`] or [`ViewMode::Previewing`]. It
//! follows the same split the rest of the crate uses:
//! - [`Model`]: all state of one open view
//! - [`Message`]: events the host feeds in
//! - [`update`]: pure state transitions
//! - side effects (render, save, reload) run by [`DocumentView::handle`]
//!
//! The host supplies a millisecond clock with every message; debounced
//! saves fire on [`Message::Tick`] once their delay has elapsed.

mod debounce;
mod effects;
mod model;
mod update;

pub use debounce::SaveDebouncer;
pub use effects::ECHO_WINDOW_MS;
pub use model::{DirtyTracker, Model, StatusLevel, StatusSource, ViewMode, ViewStatus};
pub use update::{Message, update};

use std::rc::Rc;

use crate::editor::EditorBuffer;
use crate::layout::LayoutConfig;
use crate::render::Element;
use crate::screenplay::{ParseError, ScreenplayParser};
use crate::store::{DocumentHandle, DocumentStore, StoreError};

/// Default delay between the last edit and its save.
pub const DEFAULT_SAVE_DELAY_MS: u64 = 2_000;

/// Errors surfaced by a document view.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("failed to load document: {0}")]
    Load(#[source] StoreError),
    #[error("failed to save document: {0}")]
    Save(#[source] StoreError),
    #[error("failed to render screenplay: {0}")]
    Parse(#[from] ParseError),
    #[error("view is closed")]
    Closed,
}

/// Settings a view is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub layout: LayoutConfig,
    pub save_delay_ms: u64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            save_delay_ms: DEFAULT_SAVE_DELAY_MS,
        }
    }
}

/// One open screenplay document.
pub struct DocumentView {
    handle: DocumentHandle,
    model: Model,
    store: Rc<dyn DocumentStore>,
    parser: Rc<dyn ScreenplayParser>,
    saver: SaveDebouncer,
}

impl std::fmt::Debug for DocumentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentView")
            .field("handle", &self.handle)
            .field("model", &self.model)
            .field("saver", &self.saver)
            .finish_non_exhaustive()
    }
}

impl DocumentView {
    /// Open an existing document: load it, fill the edit surface and render
    /// the preview once.
    ///
    /// # Errors
    /// [`ViewError::Load`] when the store cannot read the document; no view
    /// is created in that case.
    pub fn open(
        handle: DocumentHandle,
        store: Rc<dyn DocumentStore>,
        parser: Rc<dyn ScreenplayParser>,
        options: ViewOptions,
    ) -> Result<Self, ViewError> {
        let text = store.read(&handle).map_err(ViewError::Load)?;
        Ok(Self::with_text(handle, text, store, parser, options))
    }

    /// Like [`DocumentView::open`], but from the store's cached snapshot.
    ///
    /// # Errors
    /// [`ViewError::Load`] when no snapshot or document is available.
    pub fn open_cached(
        handle: DocumentHandle,
        store: Rc<dyn DocumentStore>,
        parser: Rc<dyn ScreenplayParser>,
        options: ViewOptions,
    ) -> Result<Self, ViewError> {
        let text = store.read_cached(&handle).map_err(ViewError::Load)?;
        Ok(Self::with_text(handle, text, store, parser, options))
    }

    /// Start a new, empty document. Nothing is written until the first edit
    /// is saved.
    pub fn create(
        handle: DocumentHandle,
        store: Rc<dyn DocumentStore>,
        parser: Rc<dyn ScreenplayParser>,
        options: ViewOptions,
    ) -> Self {
        let mut view = Self::with_text(handle, String::new(), store, parser, options);
        view.model.persisted_hash = None;
        view
    }

    fn with_text(
        handle: DocumentHandle,
        text: String,
        store: Rc<dyn DocumentStore>,
        parser: Rc<dyn ScreenplayParser>,
        options: ViewOptions,
    ) -> Self {
        let mut model = Model::new(text, options.layout);
        model.persisted_hash = Some(model::hash_text(&model.raw_text));
        let mut view = Self {
            handle,
            model,
            store,
            parser,
            saver: SaveDebouncer::new(options.save_delay_ms),
        };
        // A source the parser rejects opens on the edit surface so it can be
        // fixed; the preview stays empty until the next successful render.
        if view.render_preview().is_err() {
            view.model.mode = ViewMode::Editing;
        }
        tracing::debug!(
            handle = %view.handle,
            bytes = view.model.raw_text.len(),
            mode = ?view.model.mode,
            "view opened"
        );
        view
    }

    /// Feed one event into the view.
    ///
    /// # Errors
    /// Collaborator failures are returned after the view has recorded them
    /// in its status; the view stays usable. [`ViewError::Closed`] after a
    /// successful [`Message::Close`].
    pub fn handle(&mut self, msg: Message, now_ms: u64) -> Result<(), ViewError> {
        if self.model.closed {
            return Err(ViewError::Closed);
        }
        tracing::trace!(handle = %self.handle, ?msg, mode = ?self.model.mode, "view message");
        let revision = self.model.editor.revision();
        self.model = update(std::mem::take(&mut self.model), &msg);
        let content_changed = self.model.editor.revision() != revision;
        self.handle_message_side_effects(&msg, content_changed, now_ms)
    }

    /// Empty both surfaces, flushing any unsaved edits first.
    ///
    /// # Errors
    /// [`ViewError::Save`] if the flush fails; nothing is cleared then.
    pub fn clear(&mut self, now_ms: u64) -> Result<(), ViewError> {
        if self.model.closed {
            return Err(ViewError::Closed);
        }
        self.flush(now_ms)?;
        self.model.preview.clear();
        self.model.replace_text(String::new());
        self.model.persisted_hash = None;
        Ok(())
    }

    pub const fn document(&self) -> &DocumentHandle {
        &self.handle
    }

    /// Title shown for the view.
    pub fn display_text(&self) -> String {
        self.handle
            .basename()
            .unwrap_or_else(|| "fountain (no file)".to_string())
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    pub const fn mode(&self) -> ViewMode {
        self.model.mode
    }

    pub fn raw_text(&self) -> &str {
        &self.model.raw_text
    }

    pub const fn editor(&self) -> &EditorBuffer {
        &self.model.editor
    }

    pub const fn preview(&self) -> &Element {
        &self.model.preview
    }

    pub const fn layout(&self) -> LayoutConfig {
        self.model.layout
    }

    pub const fn is_dirty(&self) -> bool {
        self.model.dirty.is_dirty()
    }

    pub const fn is_closed(&self) -> bool {
        self.model.closed
    }

    pub const fn status(&self) -> Option<&ViewStatus> {
        self.model.status()
    }

    pub const fn save_pending(&self) -> bool {
        self.saver.is_pending()
    }

    /// Clock value at which the next [`Message::Tick`] has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.saver.deadline()
    }
}
