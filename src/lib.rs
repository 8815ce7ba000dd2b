// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. view::ViewError)
    clippy::module_name_repetitions
)]

//! # Fountain View
//!
//! Paginated preview and editing of Fountain screenplays.
//!
//! A screenplay is parsed by a pluggable collaborator into HTML fragments,
//! which are arranged into a pages container styled by the page size and
//! render density. Each open document is a view that is either editing the
//! raw text or previewing the rendered pages; edits are saved after a short
//! quiet period.
//!
//! ## Architecture
//!
//! Document views use The Elm Architecture (TEA) pattern:
//! - **Model**: state of one open view
//! - **Message**: edits, mode toggles, external changes, clock ticks
//! - **Update**: pure state transitions
//! - **Side effects**: render, save, reload
//!
//! ## Modules
//!
//! - [`screenplay`]: parser collaborator seam
//! - [`layout`]: page size and render density
//! - [`render`]: pagination renderer and HTML tree
//! - [`inline`]: screenplay blocks inside markdown documents
//! - [`editor`]: the edit surface
//! - [`store`]: document persistence seam
//! - [`view`]: document view state machine
//! - [`workspace`]: open views and the shared layout setting
//! - [`watcher`]: file watching
//! - [`config`]: saved command-line defaults

pub mod config;
pub mod editor;
pub mod inline;
pub mod layout;
pub mod perf;
pub mod render;
pub mod screenplay;
pub mod store;
pub mod view;
pub mod watcher;
pub mod workspace;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::layout::{Density, LayoutConfig, PageSize};
    pub use crate::render::{Element, render, render_new};
    pub use crate::screenplay::{ParseError, ParsedDocument, ScreenplayParser};
    pub use crate::store::{DocumentHandle, DocumentStore, FileStore};
    pub use crate::view::{DocumentView, Message, ViewError, ViewMode, ViewOptions};
    pub use crate::workspace::{ViewId, Workspace};
}
