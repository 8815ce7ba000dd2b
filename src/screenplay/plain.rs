use super::{ParseError, ParsedDocument, ScreenplayParser};
use crate::render::escape_html;

/// Grammar-free fallback used when no parser command is configured.
///
/// Every blank-line separated paragraph becomes an escaped `<p>` with the
/// original line breaks preserved. No title page is ever produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl ScreenplayParser for PlainTextParser {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let normalized = text.replace("\r\n", "\n");
        let mut body = String::with_capacity(normalized.len() + 16);
        for paragraph in normalized.split("\n\n") {
            let lines: Vec<&str> = paragraph
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .collect();
            if lines.is_empty() {
                continue;
            }
            body.push_str("<p>");
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    body.push_str("<br />");
                }
                body.push_str(&escape_html(line));
            }
            body.push_str("</p>");
        }
        Ok(ParsedDocument::new(None, body))
    }
}
