use crate::editor::Edit;
use crate::layout::LayoutConfig;

use super::model::{Model, ViewMode};

/// Events a document view reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Swap between the edit surface and the preview
    ToggleMode,
    /// The edit surface changed (or its cursor moved)
    Edit(Edit),
    /// The backing document changed outside this view
    FileChanged,
    /// Process-wide layout setting changed
    LayoutChanged(LayoutConfig),
    /// Clock tick; fires a due debounced save
    Tick,
    /// Tear the view down, flushing unsaved edits first
    Close,
}

/// Pure state transition for a message.
///
/// Mode switches, reloads, saves and teardown touch collaborators and are
/// handled as side effects by the view.
pub fn update(mut model: Model, msg: &Message) -> Model {
    match msg {
        Message::Edit(edit) => {
            // The edit surface is hidden while previewing.
            if model.mode != ViewMode::Editing {
                return model;
            }
            if model.editor.apply(edit) {
                model.raw_text = model.editor.text();
                model.dirty.mark_dirty();
            }
        }
        Message::LayoutChanged(layout) => {
            model.layout = *layout;
        }
        // ToggleMode/FileChanged/Tick/Close: handled as side effects
        Message::ToggleMode | Message::FileChanged | Message::Tick | Message::Close => {}
    }
    model
}
