use crate::render;

use super::model::{StatusLevel, StatusSource, ViewMode, hash_text};
use super::{DocumentView, Message, ViewError};

/// How long after a write a matching file event still counts as its echo.
/// Covers the watcher debounce plus one host poll.
pub const ECHO_WINDOW_MS: u64 = 1_000;

impl DocumentView {
    pub(super) fn handle_message_side_effects(
        &mut self,
        msg: &Message,
        content_changed: bool,
        now_ms: u64,
    ) -> Result<(), ViewError> {
        match msg {
            Message::Edit(_) => {
                if content_changed {
                    self.saver.queue(now_ms);
                }
                Ok(())
            }
            Message::ToggleMode => self.toggle_mode(),
            Message::FileChanged => self.reload(now_ms),
            Message::LayoutChanged(layout) => {
                if render::apply_layout(&mut self.model.preview, layout) {
                    tracing::debug!(handle = %self.handle, density = %layout.density, "swapped layout classes");
                    Ok(())
                } else if self.model.mode == ViewMode::Previewing {
                    // Nothing rendered to restyle yet.
                    self.render_preview()
                } else {
                    Ok(())
                }
            }
            Message::Tick => {
                if self.saver.take_ready(now_ms) {
                    self.save(now_ms)
                } else {
                    Ok(())
                }
            }
            Message::Close => {
                self.flush(now_ms)?;
                self.model.closed = true;
                tracing::debug!(handle = %self.handle, "view closed");
                Ok(())
            }
        }
    }

    fn toggle_mode(&mut self) -> Result<(), ViewError> {
        match self.model.mode {
            ViewMode::Previewing => {
                // The edit surface already mirrors the raw text.
                self.model.mode = ViewMode::Editing;
                Ok(())
            }
            ViewMode::Editing => {
                self.model.raw_text = self.model.editor.text();
                // Render before swapping so the preview is never shown stale.
                self.render_preview()?;
                self.model.mode = ViewMode::Previewing;
                Ok(())
            }
        }
    }

    /// Rebuild the preview from the raw text. On failure the previous
    /// preview stays in place and the error is shown in the status.
    pub(super) fn render_preview(&mut self) -> Result<(), ViewError> {
        match render::render(
            &self.model.raw_text,
            &mut self.model.preview,
            &self.model.layout,
            &*self.parser,
        ) {
            Ok(()) => {
                self.model.clear_status(StatusSource::Parse);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(handle = %self.handle, error = %err, "render failed");
                self.model.set_status(
                    StatusLevel::Error,
                    StatusSource::Parse,
                    format!("Render failed: {err}"),
                );
                Err(err.into())
            }
        }
    }

    /// An external change whose text matches our last write is taken as the
    /// echo of that write while the view is clean, or while unsaved edits are
    /// younger than [`ECHO_WINDOW_MS`]. Otherwise the external writer wins.
    fn reload(&mut self, now_ms: u64) -> Result<(), ViewError> {
        let text = match self.store.read(&self.handle) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(handle = %self.handle, error = %err, "reload failed");
                self.model.set_status(
                    StatusLevel::Error,
                    StatusSource::Load,
                    format!("Reload failed: {err}"),
                );
                return Err(ViewError::Load(err));
            }
        };
        self.model.clear_status(StatusSource::Load);

        let hash = hash_text(&text);
        if self.model.persisted_hash == Some(hash) && self.is_own_echo(now_ms) {
            tracing::debug!(handle = %self.handle, "external change matches persisted text");
            return Ok(());
        }

        tracing::debug!(handle = %self.handle, bytes = text.len(), "reloading external change");
        self.model.replace_text(text);
        self.model.persisted_hash = Some(hash);
        self.model.dirty.reset();
        self.saver.cancel();
        if self.model.mode == ViewMode::Previewing {
            self.render_preview()?;
        }
        Ok(())
    }

    fn is_own_echo(&self, now_ms: u64) -> bool {
        !self.model.dirty.is_dirty()
            || self
                .model
                .written_at_ms
                .is_some_and(|at| now_ms.saturating_sub(at) < ECHO_WINDOW_MS)
    }

    /// Save now if there are unsaved edits, cancelling any pending delay.
    pub(super) fn flush(&mut self, now_ms: u64) -> Result<(), ViewError> {
        self.saver.cancel();
        if self.model.dirty.is_dirty() {
            self.save(now_ms)?;
        }
        Ok(())
    }

    fn save(&mut self, now_ms: u64) -> Result<(), ViewError> {
        if !self.model.dirty.is_dirty() {
            return Ok(());
        }
        let _scope = crate::perf::scope("view.save");
        match self.store.write(&self.handle, &self.model.raw_text) {
            Ok(()) => {
                self.model.dirty.save_complete();
                self.model.persisted_hash = Some(hash_text(&self.model.raw_text));
                self.model.written_at_ms = Some(now_ms);
                self.model.clear_status(StatusSource::Save);
                tracing::debug!(handle = %self.handle, bytes = self.model.raw_text.len(), "saved");
                Ok(())
            }
            Err(err) => {
                self.model.dirty.save_failed();
                let failures = self.model.dirty.failed_saves();
                tracing::warn!(handle = %self.handle, failures, error = %err, "save failed");
                self.model.set_status(
                    StatusLevel::Error,
                    StatusSource::Save,
                    format!("Save failed ({failures}x), will retry: {err}"),
                );
                // Retry on the next debounce cycle.
                self.saver.queue(now_ms);
                Err(ViewError::Save(err))
            }
        }
    }
}
