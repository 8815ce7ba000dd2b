//! External change detection for open documents.
//!
//! One notify watcher covers every watched document. Parent directories are
//! watched (non-recursively) so editors that save by renaming over the file
//! are still seen. The host polls [`DocumentWatcher::take_changed`] from its
//! event loop and feeds the handles to [`crate::workspace::Workspace::file_changed`].
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::store::DocumentHandle;

/// Default quiet period before a burst of file events counts as one change.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

struct Watched {
    handle: DocumentHandle,
    /// Canonical path, as the OS reports it in events.
    path: PathBuf,
    dir: PathBuf,
    pending_since: Option<Instant>,
}

impl Watched {
    fn is_hit_by(&self, event_path: &Path) -> bool {
        event_path == self.path
            || event_path == self.dir
            || (event_path.parent() == Some(self.dir.as_path())
                && event_path.file_name() == self.path.file_name())
    }
}

pub struct DocumentWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    docs: Vec<Watched>,
    /// Watched directories and how many documents live in each.
    dirs: HashMap<PathBuf, usize>,
    debounce: Duration,
}

impl std::fmt::Debug for DocumentWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWatcher")
            .field("docs", &self.docs.iter().map(|d| &d.handle).collect::<Vec<_>>())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl DocumentWatcher {
    /// # Errors
    /// Returns an error if the platform watcher cannot be created.
    pub fn new(debounce: Duration) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        Ok(Self {
            watcher,
            rx,
            docs: Vec::new(),
            dirs: HashMap::new(),
            debounce,
        })
    }

    /// Start reporting changes to `handle`. Watching twice is a no-op.
    ///
    /// # Errors
    /// Returns an error if the document's directory cannot be watched.
    pub fn watch(&mut self, handle: &DocumentHandle) -> notify::Result<()> {
        if self.is_watching(handle) {
            return Ok(());
        }
        let path = resolve_path(handle.path());
        let dir = parent_dir(&path);
        if !self.dirs.contains_key(&dir) {
            self.watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }
        *self.dirs.entry(dir.clone()).or_default() += 1;
        tracing::debug!(%handle, dir = %dir.display(), "watching document");
        self.docs.push(Watched {
            handle: handle.clone(),
            path,
            dir,
            pending_since: None,
        });
        Ok(())
    }

    pub fn unwatch(&mut self, handle: &DocumentHandle) {
        let Some(idx) = self.docs.iter().position(|d| &d.handle == handle) else {
            return;
        };
        let doc = self.docs.swap_remove(idx);
        if let Some(count) = self.dirs.get_mut(&doc.dir) {
            *count -= 1;
            if *count == 0 {
                self.dirs.remove(&doc.dir);
                if let Err(err) = self.watcher.unwatch(&doc.dir) {
                    tracing::debug!(dir = %doc.dir.display(), error = %err, "unwatch failed");
                }
            }
        }
    }

    pub fn is_watching(&self, handle: &DocumentHandle) -> bool {
        self.docs.iter().any(|d| &d.handle == handle)
    }

    /// Drain pending events and return the documents whose changes have
    /// been quiet for the debounce period.
    pub fn take_changed(&mut self) -> Vec<DocumentHandle> {
        let now = Instant::now();
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) => self.mark_pending(&event, now),
                Err(err) => tracing::warn!(error = %err, "file watcher error"),
            }
        }

        let debounce = self.debounce;
        self.docs
            .iter_mut()
            .filter(|doc| {
                doc.pending_since
                    .is_some_and(|since| now.duration_since(since) >= debounce)
            })
            .map(|doc| {
                doc.pending_since = None;
                doc.handle.clone()
            })
            .collect()
    }

    fn mark_pending(&mut self, event: &Event, now: Instant) {
        let mut hits = 0;
        for doc in &mut self.docs {
            if event.paths.iter().any(|p| doc.is_hit_by(p)) {
                doc.pending_since = Some(now);
                hits += 1;
            }
        }
        if hits == 0 {
            tracing::trace!(kind = ?event.kind, paths = ?event.paths, "ignored file event");
        } else {
            tracing::debug!(kind = ?event.kind, hits, "file event");
        }
    }
}

/// Absolute form of `path` matching what the OS reports in events, even for
/// a document not yet written to disk.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(dir), Some(name)) => dir
            .canonicalize()
            .map_or_else(|_| absolute.clone(), |dir| dir.join(name)),
        _ => absolute,
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
