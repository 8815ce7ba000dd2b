//! Screenplay fragments embedded in markdown.
//!
//! A fenced code block tagged `fountain` inside a markdown host document is
//! rendered once into a `div.screenplay` container. There is no edit surface
//! and nothing is persisted. The rest of the host document is rendered to
//! HTML by comrak with raw HTML suppressed: only the parser's fragments are
//! trusted, and they are spliced in after comrak has formatted the page.

use comrak::nodes::NodeValue;
use comrak::{Arena, Options, format_html, parse_document};

use crate::layout::LayoutConfig;
use crate::render::render_new;
use crate::screenplay::{ParseError, SCREENPLAY_EXTENSION, ScreenplayParser};

/// Marks placeholder text. Comrak does not escape it.
const MARK: char = '\u{FFFC}';

/// Result of rendering a host document.
#[derive(Debug)]
pub struct RenderedHost {
    pub html: String,
    /// Screenplay blocks rendered successfully.
    pub rendered_blocks: usize,
    /// Blocks whose parse failed; they stay plain code blocks.
    pub failures: Vec<BlockFailure>,
}

#[derive(Debug)]
pub struct BlockFailure {
    /// 1-based line of the opening fence in the host document.
    pub line: usize,
    pub error: ParseError,
}

/// Whether a code block info string selects the screenplay renderer.
pub fn is_screenplay_block(info: &str) -> bool {
    info.split_whitespace()
        .next()
        .is_some_and(|tag| tag.eq_ignore_ascii_case(SCREENPLAY_EXTENSION))
}

/// Render `markdown` to HTML, replacing every screenplay code block with a
/// rendered screenplay container.
///
/// Raw HTML written in the host document is omitted, as comrak does by
/// default.
///
/// # Errors
/// Returns an error only if HTML serialization fails.
pub fn render_markdown<P>(
    markdown: &str,
    layout: &LayoutConfig,
    parser: &P,
) -> std::io::Result<RenderedHost>
where
    P: ScreenplayParser + ?Sized,
{
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    let root = parse_document(&arena, markdown, &options);

    let prefix = placeholder_prefix(markdown);
    let mut containers = Vec::new();
    let mut failures = Vec::new();
    for node in root.descendants() {
        let (source, line) = {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::CodeBlock(block) if is_screenplay_block(&block.info) => {
                    (block.literal.clone(), data.sourcepos.start.line)
                }
                _ => continue,
            }
        };

        match render_new(&source, layout, parser) {
            Ok(container) => {
                let token = format!("{prefix}{}{MARK}", containers.len());
                node.data.borrow_mut().value = NodeValue::Text(token.clone());
                containers.push((token, container.to_html()));
            }
            Err(error) => {
                tracing::warn!(line, error = %error, "screenplay block failed to render");
                failures.push(BlockFailure { line, error });
            }
        }
    }

    let mut out = Vec::new();
    format_html(root, &options, &mut out)?;
    let mut html = String::from_utf8_lossy(&out).into_owned();
    for (token, container) in &containers {
        html = html.replacen(token, &format!("{container}\n"), 1);
    }
    Ok(RenderedHost {
        html,
        rendered_blocks: containers.len(),
        failures,
    })
}

/// A placeholder prefix that cannot occur in `markdown`.
fn placeholder_prefix(markdown: &str) -> String {
    let mut prefix = format!("{MARK}screenplay-");
    while markdown.contains(&prefix) {
        prefix.insert(0, MARK);
    }
    prefix
}
