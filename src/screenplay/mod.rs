//! Screenplay parsing seam.
//!
//! The screenplay grammar itself lives outside this crate. A
//! [`ScreenplayParser`] turns raw text into a [`ParsedDocument`]: an optional
//! title-page markup fragment and a body markup fragment, both already
//! serialized. The fragments are trusted and injected verbatim by the
//! renderer.

mod command;
mod plain;

pub use command::CommandParser;
pub use plain::PlainTextParser;

use serde::{Deserialize, Serialize};

/// Output of a parser: title page (if the source has one) and body markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Title-page markup. Absent when the source has no title-page block.
    #[serde(default)]
    pub title_page: Option<String>,
    /// Body markup. Always present, may be empty.
    #[serde(default, alias = "script")]
    pub body: String,
}

impl ParsedDocument {
    /// Build a parsed document, treating an empty title-page fragment as
    /// absent.
    pub fn new(title_page: Option<String>, body: impl Into<String>) -> Self {
        Self {
            title_page: title_page.filter(|markup| !markup.is_empty()),
            body: body.into(),
        }
    }

    /// Re-apply the empty-title normalization to a deserialized value.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.title_page, self.body)
    }
}

/// Errors a parser collaborator can report.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to run parser `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parser `{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("parser produced malformed output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("screenplay rejected: {0}")]
    Rejected(String),
}

/// Turns raw screenplay text into markup fragments.
///
/// Implementations must be deterministic for identical input and must not
/// fail on empty input.
pub trait ScreenplayParser {
    /// Parse `text` into title-page and body fragments.
    ///
    /// # Errors
    /// Returns [`ParseError`] when the collaborator cannot interpret the text
    /// or cannot be reached.
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError>;
}

impl<P: ScreenplayParser + ?Sized> ScreenplayParser for &P {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        (**self).parse(text)
    }
}

impl<P: ScreenplayParser + ?Sized> ScreenplayParser for std::rc::Rc<P> {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        (**self).parse(text)
    }
}

/// Whether `path` names a screenplay document (`.fountain`, any case).
pub fn is_screenplay_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCREENPLAY_EXTENSION))
}

/// File extension and code-block tag handled by this crate.
pub const SCREENPLAY_EXTENSION: &str = "fountain";

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_empty_title_page_is_absent() {
        let doc = ParsedDocument::new(Some(String::new()), "<p>x</p>");
        assert!(doc.title_page.is_none());
        assert_eq!(doc.body, "<p>x</p>");
    }

    #[test]
    fn test_collaborator_json_uses_script_alias() {
        let json = r#"{"title_page": "<h1>T</h1>", "script": "<p>body</p>"}"#;
        let doc: ParsedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.title_page.as_deref(), Some("<h1>T</h1>"));
        assert_eq!(doc.body, "<p>body</p>");
    }

    #[test]
    fn test_collaborator_json_with_empty_title_normalizes() {
        let json = r#"{"title_page": "", "body": ""}"#;
        let doc = serde_json::from_str::<ParsedDocument>(json)
            .unwrap()
            .normalized();
        assert_eq!(doc, ParsedDocument::default());
    }

    #[test]
    fn test_is_screenplay_path() {
        assert!(is_screenplay_path(Path::new("draft.fountain")));
        assert!(is_screenplay_path(Path::new("DRAFT.FOUNTAIN")));
        assert!(!is_screenplay_path(Path::new("notes.md")));
        assert!(!is_screenplay_path(Path::new("fountain")));
    }
}
