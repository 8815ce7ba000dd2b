use std::rc::Rc;

use proptest::prelude::*;

use fountain_view::editor::Edit;
use fountain_view::layout::{Density, LayoutConfig, PageSize};
use fountain_view::render::{ROOT_ID, apply_layout, render, screenplay_container};
use fountain_view::screenplay::{ParseError, ParsedDocument, PlainTextParser, ScreenplayParser};
use fountain_view::store::{DocumentHandle, FileStore};
use fountain_view::view::{DocumentView, Message, ViewMode, ViewOptions};

/// Treats a leading `Title:` line as the title page.
struct TitleParser;

impl ScreenplayParser for TitleParser {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let (title, rest) = match text.strip_prefix("Title:") {
            Some(rest) => {
                let (line, body) = rest.split_once('\n').unwrap_or((rest, ""));
                (Some(format!("<h1>{}</h1>", line.trim())), body)
            }
            None => (None, text),
        };
        let body = PlainTextParser.parse(rest)?.body;
        Ok(ParsedDocument::new(title, body))
    }
}

fn page_classes(target: &fountain_view::render::Element) -> Vec<String> {
    target
        .find_by_id(ROOT_ID)
        .map(|root| {
            root.child_elements()
                .map(|page| page.classes().join(" "))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_empty_document_renders_single_body_page() {
    let mut target = screenplay_container();
    render("", &mut target, &LayoutConfig::default(), &TitleParser).unwrap();

    assert_eq!(page_classes(&target), vec!["page"]);
    assert_eq!(
        target.to_html(),
        r#"<div class="screenplay"><div id="script" class="us-letter dpi72"><div class="page"></div></div></div>"#
    );
}

#[test]
fn test_title_page_comes_first() {
    let mut target = screenplay_container();
    let text = "Title: Big Fish\nINT. RIVER - DAY";
    render(text, &mut target, &LayoutConfig::default(), &TitleParser).unwrap();

    assert_eq!(page_classes(&target), vec!["page title-page", "page"]);
    let html = target.to_html();
    assert!(html.contains(r#"<div class="page title-page"><h1>Big Fish</h1></div>"#));
    assert!(html.contains("<p>INT. RIVER - DAY</p>"));
}

#[test]
fn test_density_change_keeps_markup() {
    let text = "Title: Big Fish\nINT. RIVER - DAY";
    let mut at_72 = screenplay_container();
    let mut at_150 = screenplay_container();
    render(text, &mut at_72, &LayoutConfig::default(), &TitleParser).unwrap();
    let wide = LayoutConfig::default().with_density(Density::Dpi150);
    render(text, &mut at_150, &wide, &TitleParser).unwrap();

    let root_72 = at_72.find_by_id(ROOT_ID).unwrap();
    let root_150 = at_150.find_by_id(ROOT_ID).unwrap();
    assert_eq!(root_72.inner_html(), root_150.inner_html());
    assert!(root_150.has_class("dpi150"));
    assert!(!root_150.has_class("dpi72"));

    // A live swap lands on the same result as a fresh render.
    assert!(apply_layout(&mut at_72, &wide));
    assert_eq!(at_72.to_html(), at_150.to_html());
}

#[test]
fn test_a4_layout_classes() {
    let mut target = screenplay_container();
    let layout = LayoutConfig::new(PageSize::A4, Density::Dpi100);
    render("FADE IN:", &mut target, &layout, &TitleParser).unwrap();
    assert_eq!(
        target.find_by_id(ROOT_ID).unwrap().classes(),
        ["a4".to_string(), "dpi100".to_string()]
    );
}

#[test]
fn test_file_backed_view_edit_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.fountain");
    std::fs::write(&path, "INT. HOUSE - DAY").unwrap();
    let handle = DocumentHandle::new(&path);
    let store = Rc::new(FileStore::new());

    let mut view = DocumentView::open(
        handle,
        store,
        Rc::new(TitleParser),
        ViewOptions {
            save_delay_ms: 100,
            ..ViewOptions::default()
        },
    )
    .unwrap();
    assert_eq!(view.display_text(), "pilot");

    view.handle(Message::ToggleMode, 0).unwrap();
    view.handle(Message::Edit(Edit::MoveEnd), 1).unwrap();
    view.handle(Message::Edit(Edit::Insert("\n\nJOHN enters.".into())), 2)
        .unwrap();
    view.handle(Message::Tick, 50).unwrap();
    assert!(view.is_dirty());
    view.handle(Message::Tick, 102).unwrap();
    assert!(!view.is_dirty());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "INT. HOUSE - DAY\n\nJOHN enters."
    );

    std::fs::write(&path, "EXT. ROOF - NIGHT").unwrap();
    view.handle(Message::FileChanged, 200).unwrap();
    assert_eq!(view.mode(), ViewMode::Editing);
    assert_eq!(view.editor().text(), "EXT. ROOF - NIGHT");

    view.handle(Message::ToggleMode, 300).unwrap();
    assert!(view.preview().to_html().contains("<p>EXT. ROOF - NIGHT</p>"));
    view.handle(Message::Close, 400).unwrap();
    assert!(view.is_closed());
}

proptest! {
    #[test]
    fn prop_render_is_idempotent(text in "[ -~\n]{0,200}", dpi in 0usize..3) {
        let layout = LayoutConfig::default().with_density(Density::ALL[dpi]);
        let mut target = screenplay_container();
        render(&text, &mut target, &layout, &TitleParser).unwrap();
        let first = target.to_html();
        render(&text, &mut target, &layout, &TitleParser).unwrap();
        prop_assert_eq!(first, target.to_html());
        prop_assert_eq!(target.count_id(ROOT_ID), 1);
    }
}
