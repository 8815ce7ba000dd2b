use ropey::Rope;

/// Line/column position of the caret. Columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A single change event on the edit surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    InsertChar(char),
    Insert(String),
    Newline,
    DeleteBack,
    DeleteForward,
    Move(Direction),
    /// Jump to `(line, col)`, clamped to the content.
    MoveTo(usize, usize),
    MoveHome,
    MoveEnd,
    /// Replace the whole content (paste-over, external tool).
    ReplaceAll(String),
}

impl Edit {
    /// Whether this edit can change content (as opposed to moving the caret).
    pub const fn is_content_edit(&self) -> bool {
        !matches!(
            self,
            Self::Move(_) | Self::MoveTo(..) | Self::MoveHome | Self::MoveEnd
        )
    }
}

/// Rope-backed edit surface.
///
/// The caret is a char offset into the rope. `revision` increases on every
/// content change and never on caret movement, so callers can tell edits
/// that need saving from navigation.
pub struct EditorBuffer {
    rope: Rope,
    caret: usize,
    /// Column kept across vertical moves through shorter lines.
    goal_col: Option<usize>,
    revision: u64,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            caret: 0,
            goal_col: None,
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub fn cursor(&self) -> Cursor {
        let line = self.rope.char_to_line(self.caret);
        Cursor::at(line, self.caret - self.rope.line_to_char(line))
    }

    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of line `idx` without its line ending.
    pub fn line(&self, idx: usize) -> Option<String> {
        (idx < self.rope.len_lines()).then(|| {
            let line = self.rope.line(idx).to_string();
            line.trim_end_matches(['\n', '\r']).to_string()
        })
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Repopulate the buffer, keeping the caret on the same line and column
    /// where the new content allows.
    pub fn set_text(&mut self, text: &str) {
        let Cursor { line, col } = self.cursor();
        self.rope = Rope::from_str(text);
        self.caret = self.clamped_offset(line, col);
        self.goal_col = None;
        self.revision += 1;
    }

    /// Apply an edit. Returns `true` when the content changed.
    pub fn apply(&mut self, edit: &Edit) -> bool {
        if !edit.is_content_edit() {
            self.navigate(edit);
            return false;
        }
        let changed = match edit {
            Edit::InsertChar(ch) => self.insert(ch.encode_utf8(&mut [0; 4])),
            Edit::Insert(text) => self.insert(text),
            Edit::Newline => self.insert("\n"),
            Edit::DeleteBack => self.delete_back(),
            Edit::DeleteForward => self.delete_forward(),
            Edit::ReplaceAll(text) => {
                if self.rope == text.as_str() {
                    false
                } else {
                    self.set_text(text);
                    return true;
                }
            }
            Edit::Move(_) | Edit::MoveTo(..) | Edit::MoveHome | Edit::MoveEnd => false,
        };
        if changed {
            self.goal_col = None;
            self.revision += 1;
        }
        changed
    }

    fn navigate(&mut self, edit: &Edit) {
        let Cursor { line, col } = self.cursor();
        match edit {
            Edit::Move(Direction::Up) => return self.move_vertical(line.checked_sub(1), col),
            Edit::Move(Direction::Down) => {
                let below = Some(line + 1).filter(|l| *l < self.line_count());
                return self.move_vertical(below, col);
            }
            Edit::Move(Direction::Left) => self.caret = self.caret.saturating_sub(1),
            Edit::Move(Direction::Right) => {
                self.caret = (self.caret + 1).min(self.rope.len_chars());
            }
            Edit::MoveTo(line, col) => self.caret = self.clamped_offset(*line, *col),
            Edit::MoveHome => self.caret = self.rope.line_to_char(line),
            Edit::MoveEnd => self.caret = self.rope.line_to_char(line) + self.line_chars(line),
            _ => {}
        }
        self.goal_col = None;
    }

    fn move_vertical(&mut self, target: Option<usize>, col: usize) {
        if let Some(target) = target {
            let goal = *self.goal_col.get_or_insert(col);
            self.caret = self.clamped_offset(target, goal);
        }
    }

    fn insert(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.rope.insert(self.caret, text);
        self.caret += text.chars().count();
        true
    }

    fn delete_back(&mut self) -> bool {
        if self.caret == 0 {
            return false;
        }
        // A CRLF pair goes as one line break.
        let start = if self.caret >= 2
            && self.rope.char(self.caret - 1) == '\n'
            && self.rope.char(self.caret - 2) == '\r'
        {
            self.caret - 2
        } else {
            self.caret - 1
        };
        self.rope.remove(start..self.caret);
        self.caret = start;
        true
    }

    fn delete_forward(&mut self) -> bool {
        let len = self.rope.len_chars();
        if self.caret >= len {
            return false;
        }
        let end = if self.rope.char(self.caret) == '\r'
            && self.caret + 1 < len
            && self.rope.char(self.caret + 1) == '\n'
        {
            self.caret + 2
        } else {
            self.caret + 1
        };
        self.rope.remove(self.caret..end);
        true
    }

    /// Chars on `line`, line ending excluded.
    fn line_chars(&self, line: usize) -> usize {
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        len
    }

    fn clamped_offset(&self, line: usize, col: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line) + col.min(self.line_chars(line))
    }
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.rope.len_lines())
            .field("cursor", &self.cursor())
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
