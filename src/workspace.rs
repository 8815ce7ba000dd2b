//! Host-side registry of open views.
//!
//! The workspace owns the collaborators every view shares and the
//! process-wide layout setting. Changing the setting is published to every
//! open view; views never read it back from the workspace.

use std::fmt;
use std::rc::Rc;

use crate::inline::{self, RenderedHost};
use crate::layout::{Density, LayoutConfig};
use crate::screenplay::ScreenplayParser;
use crate::store::{DocumentHandle, DocumentStore};
use crate::view::{DocumentView, Message, ViewError, ViewOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("no open view with id {0}")]
    UnknownView(ViewId),
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Failures collected while broadcasting a message to several views.
pub type BroadcastErrors = Vec<(ViewId, ViewError)>;

pub struct Workspace {
    store: Rc<dyn DocumentStore>,
    parser: Rc<dyn ScreenplayParser>,
    options: ViewOptions,
    views: Vec<(ViewId, DocumentView)>,
    next_id: u64,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("options", &self.options)
            .field("views", &self.views)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(
        store: Rc<dyn DocumentStore>,
        parser: Rc<dyn ScreenplayParser>,
        options: ViewOptions,
    ) -> Self {
        Self {
            store,
            parser,
            options,
            views: Vec::new(),
            next_id: 1,
        }
    }

    pub const fn layout(&self) -> LayoutConfig {
        self.options.layout
    }

    /// Change the render density for every open view and future renders.
    pub fn set_density(&mut self, density: Density, now_ms: u64) -> BroadcastErrors {
        self.set_layout(self.options.layout.with_density(density), now_ms)
    }

    pub fn set_layout(&mut self, layout: LayoutConfig, now_ms: u64) -> BroadcastErrors {
        if layout == self.options.layout {
            return Vec::new();
        }
        tracing::debug!(density = %layout.density, views = self.views.len(), "layout changed");
        self.options.layout = layout;
        self.broadcast(|_| true, &Message::LayoutChanged(layout), now_ms)
    }

    /// Open a view on `handle`. A document that is already open in another
    /// view is opened from the store's cached snapshot.
    ///
    /// # Errors
    /// [`ViewError::Load`] when the document cannot be read.
    pub fn open(&mut self, handle: DocumentHandle) -> Result<ViewId, ViewError> {
        let view = if self.is_open(&handle) {
            DocumentView::open_cached(handle, self.store.clone(), self.parser.clone(), self.options)?
        } else {
            DocumentView::open(handle, self.store.clone(), self.parser.clone(), self.options)?
        };
        Ok(self.insert(view))
    }

    pub fn create(&mut self, handle: DocumentHandle) -> ViewId {
        let view = DocumentView::create(handle, self.store.clone(), self.parser.clone(), self.options);
        self.insert(view)
    }

    fn insert(&mut self, view: DocumentView) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        tracing::debug!(%id, handle = %view.document(), "view registered");
        self.views.push((id, view));
        id
    }

    pub fn is_open(&self, handle: &DocumentHandle) -> bool {
        self.views.iter().any(|(_, view)| view.document() == handle)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn ids(&self) -> Vec<ViewId> {
        self.views.iter().map(|(id, _)| *id).collect()
    }

    pub fn view(&self, id: ViewId) -> Option<&DocumentView> {
        self.views
            .iter()
            .find(|(view_id, _)| *view_id == id)
            .map(|(_, view)| view)
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut DocumentView, WorkspaceError> {
        self.views
            .iter_mut()
            .find(|(view_id, _)| *view_id == id)
            .map(|(_, view)| view)
            .ok_or(WorkspaceError::UnknownView(id))
    }

    /// Feed one message to one view.
    ///
    /// # Errors
    /// [`WorkspaceError::UnknownView`] for a stale id, otherwise whatever the
    /// view reports.
    pub fn dispatch(&mut self, id: ViewId, msg: Message, now_ms: u64) -> Result<(), WorkspaceError> {
        self.view_mut(id)?.handle(msg, now_ms)?;
        Ok(())
    }

    /// Advance the clock for every view, firing due saves.
    pub fn tick(&mut self, now_ms: u64) -> BroadcastErrors {
        self.broadcast(|_| true, &Message::Tick, now_ms)
    }

    /// Report an external change to every view on `handle`.
    pub fn file_changed(&mut self, handle: &DocumentHandle, now_ms: u64) -> BroadcastErrors {
        self.broadcast(|view| view.document() == handle, &Message::FileChanged, now_ms)
    }

    fn broadcast(
        &mut self,
        filter: impl Fn(&DocumentView) -> bool,
        msg: &Message,
        now_ms: u64,
    ) -> BroadcastErrors {
        let mut errors = Vec::new();
        for (id, view) in &mut self.views {
            if !filter(view) {
                continue;
            }
            if let Err(err) = view.handle(msg.clone(), now_ms) {
                errors.push((*id, err));
            }
        }
        errors
    }

    /// Close a view, flushing unsaved edits. The view is only removed when
    /// the flush succeeds.
    ///
    /// # Errors
    /// [`WorkspaceError::UnknownView`] or the failed flush.
    pub fn close(&mut self, id: ViewId, now_ms: u64) -> Result<(), WorkspaceError> {
        self.dispatch(id, Message::Close, now_ms)?;
        self.views.retain(|(view_id, _)| *view_id != id);
        tracing::debug!(%id, "view removed");
        Ok(())
    }

    /// Close every view; views whose flush fails stay open.
    pub fn close_all(&mut self, now_ms: u64) -> BroadcastErrors {
        let errors = self.broadcast(|_| true, &Message::Close, now_ms);
        self.views.retain(|(_, view)| !view.is_closed());
        errors
    }

    /// Earliest clock value at which [`Workspace::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.views
            .iter()
            .filter_map(|(_, view)| view.next_deadline())
            .min()
    }

    /// Render a markdown host document with its screenplay blocks, using the
    /// current layout setting.
    ///
    /// # Errors
    /// Returns an error only if HTML serialization fails.
    pub fn render_markdown(&self, markdown: &str) -> std::io::Result<RenderedHost> {
        inline::render_markdown(markdown, &self.options.layout, &*self.parser)
    }
}
