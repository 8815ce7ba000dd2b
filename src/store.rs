//! Persistence seam for backing documents.
//!
//! Views only talk to a [`DocumentStore`]: read the full text, write the full
//! text, or take a cheap cached snapshot.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Identifies a backing document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle(PathBuf);

impl DocumentHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Base name without extension, used as the view title.
    pub fn basename(&self) -> Option<String> {
        self.0
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(DocumentHandle),
    #[error("I/O error on {handle}: {source}")]
    Io {
        handle: DocumentHandle,
        #[source]
        source: std::io::Error,
    },
    #[error("write rejected for {handle}: {reason}")]
    Rejected {
        handle: DocumentHandle,
        reason: String,
    },
}

impl StoreError {
    fn from_io(handle: &DocumentHandle, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            Self::NotFound(handle.clone())
        } else {
            Self::Io {
                handle: handle.clone(),
                source,
            }
        }
    }
}

/// Load/save primitives for backing documents.
pub trait DocumentStore {
    /// Read the full text.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] for an invalid handle, [`StoreError::Io`]
    /// for other failures.
    fn read(&self, handle: &DocumentHandle) -> Result<String, StoreError>;

    /// Replace the full text.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the write is rejected or fails.
    fn write(&self, handle: &DocumentHandle, text: &str) -> Result<(), StoreError>;

    /// Best-effort snapshot that may be slightly stale and may skip I/O.
    ///
    /// # Errors
    /// Same as [`DocumentStore::read`] when no snapshot is available.
    fn read_cached(&self, handle: &DocumentHandle) -> Result<String, StoreError> {
        self.read(handle)
    }
}

/// Filesystem-backed store keeping the last text seen per path.
#[derive(Debug, Default)]
pub struct FileStore {
    cache: RefCell<HashMap<PathBuf, String>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn remember(&self, handle: &DocumentHandle, text: &str) {
        self.cache
            .borrow_mut()
            .insert(handle.path().to_path_buf(), text.to_string());
    }
}

impl DocumentStore for FileStore {
    fn read(&self, handle: &DocumentHandle) -> Result<String, StoreError> {
        let text = std::fs::read_to_string(handle.path())
            .map_err(|err| StoreError::from_io(handle, err))?;
        self.remember(handle, &text);
        Ok(text)
    }

    fn write(&self, handle: &DocumentHandle, text: &str) -> Result<(), StoreError> {
        let path = handle.path();
        let tmp = temp_sibling(path);
        std::fs::write(&tmp, text).map_err(|err| StoreError::from_io(handle, err))?;
        if let Err(err) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(StoreError::from_io(handle, err));
        }
        self.remember(handle, text);
        tracing::debug!(path = %path.display(), bytes = text.len(), "document written");
        Ok(())
    }

    fn read_cached(&self, handle: &DocumentHandle) -> Result<String, StoreError> {
        if let Some(text) = self.cache.borrow().get(handle.path()) {
            return Ok(text.clone());
        }
        self.read(handle)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "document".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.fountain-view.tmp"))
}

/// In-memory store. Records every write, and can be told to reject writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RefCell<HashMap<DocumentHandle, String>>,
    writes: RefCell<Vec<(DocumentHandle, String)>>,
    fail_writes: Cell<bool>,
    reads: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(self, handle: &DocumentHandle, text: &str) -> Self {
        self.set_external(handle, text);
        self
    }

    /// Change a document behind the views' backs (not recorded as a write).
    pub fn set_external(&self, handle: &DocumentHandle, text: &str) {
        self.docs
            .borrow_mut()
            .insert(handle.clone(), text.to_string());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Texts written for `handle`, oldest first.
    pub fn writes_for(&self, handle: &DocumentHandle) -> Vec<String> {
        self.writes
            .borrow()
            .iter()
            .filter(|(h, _)| h == handle)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn contents(&self, handle: &DocumentHandle) -> Option<String> {
        self.docs.borrow().get(handle).cloned()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, handle: &DocumentHandle) -> Result<String, StoreError> {
        self.reads.set(self.reads.get() + 1);
        self.contents(handle)
            .ok_or_else(|| StoreError::NotFound(handle.clone()))
    }

    fn write(&self, handle: &DocumentHandle, text: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Rejected {
                handle: handle.clone(),
                reason: "store is read-only".to_string(),
            });
        }
        self.set_external(handle, text);
        self.writes
            .borrow_mut()
            .push((handle.clone(), text.to_string()));
        Ok(())
    }

    fn read_cached(&self, handle: &DocumentHandle) -> Result<String, StoreError> {
        self.contents(handle)
            .ok_or_else(|| StoreError::NotFound(handle.clone()))
    }
}
