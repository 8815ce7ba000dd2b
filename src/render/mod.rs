//! Pagination renderer.
//!
//! Assembles parser output into a pages container:
//!
//! ```text
//! div#script.<page-size>.dpi<N>
//! ├── div.page.title-page   (only when the source has a title page)
//! └── div.page              (body)
//! ```
//!
//! Rendering always replaces the target's children. Parser markup is
//! trusted and injected verbatim; only ids and classes produced here are
//! escaped.

mod page;
mod tree;

pub use page::{STYLESHEET, standalone_html};
pub use tree::{Element, Node, escape_html};

use crate::layout::LayoutConfig;
use crate::screenplay::{ParseError, ParsedDocument, ScreenplayParser};

/// Id of the root pages container. External code finds the root through it
/// to swap layout classes without re-rendering.
pub const ROOT_ID: &str = "script";

/// Class of the outer container a render target carries.
pub const SCREENPLAY_CLASS: &str = "screenplay";

const PAGE_CLASS: &str = "page";
const TITLE_PAGE_CLASS: &str = "page title-page";

/// Empty render target (`div.screenplay`).
pub fn screenplay_container() -> Element {
    Element::div().with_class(SCREENPLAY_CLASS)
}

/// Parse `text` and replace the contents of `target` with fresh pages.
///
/// Parsing happens before `target` is touched, so on failure the previous
/// contents stay in place.
///
/// # Errors
/// Propagates the parser's [`ParseError`].
pub fn render<P>(
    text: &str,
    target: &mut Element,
    layout: &LayoutConfig,
    parser: &P,
) -> Result<(), ParseError>
where
    P: ScreenplayParser + ?Sized,
{
    let _scope = crate::perf::scope("render.total");
    let parsed = parser.parse(text)?;
    let root = assemble(&parsed, layout);
    target.replace_children(vec![Node::Element(root)]);
    tracing::debug!(
        input_bytes = text.len(),
        title_page = parsed.title_page.is_some(),
        density = %layout.density,
        "rendered screenplay"
    );
    Ok(())
}

/// One-shot render into a new `div.screenplay` container.
///
/// # Errors
/// Propagates the parser's [`ParseError`].
pub fn render_new<P>(text: &str, layout: &LayoutConfig, parser: &P) -> Result<Element, ParseError>
where
    P: ScreenplayParser + ?Sized,
{
    let mut target = screenplay_container();
    render(text, &mut target, layout, parser)?;
    Ok(target)
}

/// Build the root pages container for already-parsed fragments.
pub fn assemble(parsed: &ParsedDocument, layout: &LayoutConfig) -> Element {
    let mut pages = Element::div().with_id(ROOT_ID);
    pages.set_classes(layout.root_classes());

    if let Some(title_page) = &parsed.title_page {
        pages.push(
            Element::div()
                .with_class(TITLE_PAGE_CLASS)
                .with_markup(title_page.as_str()),
        );
    }
    pages.push(
        Element::div()
            .with_class(PAGE_CLASS)
            .with_markup(parsed.body.as_str()),
    );
    pages
}

/// Rewrite the layout classes of the `#script` root inside `target`.
///
/// Returns `false` when `target` holds no rendered root (nothing to update).
pub fn apply_layout(target: &mut Element, layout: &LayoutConfig) -> bool {
    let Some(root) = target.find_by_id_mut(ROOT_ID) else {
        return false;
    };
    root.set_classes(layout.root_classes());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Density;
    use crate::screenplay::PlainTextParser;

    struct FixedParser(ParsedDocument);

    impl ScreenplayParser for FixedParser {
        fn parse(&self, _text: &str) -> Result<ParsedDocument, ParseError> {
            Ok(self.0.clone())
        }
    }

    struct FailingParser;

    impl ScreenplayParser for FailingParser {
        fn parse(&self, _text: &str) -> Result<ParsedDocument, ParseError> {
            Err(ParseError::Rejected("unterminated boneyard".into()))
        }
    }

    fn titled() -> FixedParser {
        FixedParser(ParsedDocument::new(
            Some("<h1>BRICK &amp; STEEL</h1>".into()),
            "<h3>EXT. DOCKS - NIGHT</h3>",
        ))
    }

    #[test]
    fn test_render_builds_title_and_body_pages() {
        let mut target = screenplay_container();
        render("ignored", &mut target, &LayoutConfig::default(), &titled()).unwrap();

        assert_eq!(
            target.to_html(),
            concat!(
                r#"<div class="screenplay"><div id="script" class="us-letter dpi72">"#,
                r#"<div class="page title-page"><h1>BRICK &amp; STEEL</h1></div>"#,
                r#"<div class="page"><h3>EXT. DOCKS - NIGHT</h3></div>"#,
                "</div></div>"
            )
        );
    }

    #[test]
    fn test_render_twice_does_not_accumulate_pages() {
        let mut target = screenplay_container();
        let layout = LayoutConfig::default();
        render("a", &mut target, &layout, &titled()).unwrap();
        let first = target.to_html();
        render("a", &mut target, &layout, &titled()).unwrap();

        assert_eq!(target.to_html(), first);
        assert_eq!(target.count_id(ROOT_ID), 1);
    }

    #[test]
    fn test_empty_text_renders_body_without_title_page() {
        let mut target = screenplay_container();
        render("", &mut target, &LayoutConfig::default(), &PlainTextParser).unwrap();

        let root = target.find_by_id(ROOT_ID).unwrap();
        let pages: Vec<_> = root.child_elements().collect();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].has_class("page"));
        assert!(!pages[0].has_class("title-page"));
        assert_eq!(pages[0].inner_html(), "");
    }

    #[test]
    fn test_parse_failure_leaves_previous_content() {
        let mut target = screenplay_container();
        let layout = LayoutConfig::default();
        render("a", &mut target, &layout, &titled()).unwrap();
        let before = target.clone();

        let err = render("b", &mut target, &layout, &FailingParser).unwrap_err();
        assert!(matches!(err, ParseError::Rejected(_)));
        assert_eq!(target, before);
    }

    #[test]
    fn test_density_change_keeps_markup_and_updates_class() {
        let mut at_72 = screenplay_container();
        let mut at_150 = screenplay_container();
        let layout = LayoutConfig::default();
        render("a", &mut at_72, &layout, &titled()).unwrap();
        render("a", &mut at_150, &layout.with_density(Density::Dpi150), &titled()).unwrap();

        let root_72 = at_72.find_by_id(ROOT_ID).unwrap();
        let root_150 = at_150.find_by_id(ROOT_ID).unwrap();
        assert_eq!(root_72.inner_html(), root_150.inner_html());
        assert!(root_150.has_class("dpi150"));
        assert!(!root_150.has_class("dpi72"));
    }

    #[test]
    fn test_apply_layout_swaps_classes_in_place() {
        let mut target = render_new("a", &LayoutConfig::default(), &titled()).unwrap();
        let body_before = target.find_by_id(ROOT_ID).unwrap().inner_html();

        assert!(apply_layout(
            &mut target,
            &LayoutConfig::default().with_density(Density::Dpi100)
        ));
        let root = target.find_by_id(ROOT_ID).unwrap();
        assert_eq!(root.classes(), ["us-letter", "dpi100"]);
        assert_eq!(root.inner_html(), body_before);
    }

    #[test]
    fn test_apply_layout_on_empty_target_is_noop() {
        let mut target = screenplay_container();
        assert!(!apply_layout(&mut target, &LayoutConfig::default()));
        assert!(target.is_empty());
    }
}
