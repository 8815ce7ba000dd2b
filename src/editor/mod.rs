//! Edit surface for screenplay source.
//!
//! Provides a rope-backed text buffer with cursor management. Content
//! changes bump a revision counter; cursor movement does not.

mod buffer;

pub use buffer::{Cursor, Direction, Edit, EditorBuffer};
