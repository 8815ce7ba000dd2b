//! Minimal container tree the renderer assembles.
//!
//! Elements carry an id, a class list and children. Markup nodes hold
//! serialized fragments that are emitted verbatim.

use std::fmt::Write;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Trusted markup, written out unescaped.
    Markup(String),
}

/// A container element (`div` unless stated otherwise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add classes from a space-separated list.
    #[must_use]
    pub fn with_class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(ToOwned::to_owned));
        self
    }

    #[must_use]
    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.set_inner_markup(markup);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Overwrite the class attribute.
    pub fn set_classes(&mut self, classes: Vec<String>) {
        self.classes = classes;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, skipping markup nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(el) => Some(el),
            Node::Markup(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(Node::Element(child));
    }

    /// Replace all children with a single trusted markup fragment.
    pub fn set_inner_markup(&mut self, markup: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Markup(markup.into()));
    }

    /// Replace all children.
    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Depth-first search for an element with `id`, including `self`.
    pub fn find_by_id(&self, id: &str) -> Option<&Self> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|el| el.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Self> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(el) => el.find_by_id_mut(id),
            Node::Markup(_) => None,
        })
    }

    /// Count elements with `id` in this subtree.
    pub fn count_id(&self, id: &str) -> usize {
        usize::from(self.id.as_deref() == Some(id))
            + self.child_elements().map(|el| el.count_id(id)).sum::<usize>()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialized children only.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }

    pub fn write_html(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        if let Some(id) = &self.id {
            let _ = write!(out, " id=\"{}\"", escape_html(id));
        }
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&self.classes.join(" ")));
        }
        out.push('>');
        for child in &self.children {
            write_node(child, out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => el.write_html(out),
        Node::Markup(markup) => out.push_str(markup),
    }
}

/// Escape text for use in element content or a quoted attribute value.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_id_classes_and_markup() {
        let el = Element::div()
            .with_id("script")
            .with_class("us-letter dpi72")
            .with_markup("<p>raw & unescaped</p>");
        assert_eq!(
            el.to_html(),
            r#"<div id="script" class="us-letter dpi72"><p>raw & unescaped</p></div>"#
        );
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let el = Element::div().with_id("a\"b");
        assert_eq!(el.to_html(), r#"<div id="a&quot;b"></div>"#);
    }

    #[test]
    fn test_find_by_id_mut_reaches_nested_element() {
        let mut outer = Element::div().with_class("screenplay");
        let mut mid = Element::div();
        mid.push(Element::div().with_id("script"));
        outer.push(mid);

        outer
            .find_by_id_mut("script")
            .unwrap()
            .set_classes(vec!["a4".into()]);
        assert!(outer.find_by_id("script").unwrap().has_class("a4"));
        assert!(outer.find_by_id("missing").is_none());
    }

    #[test]
    fn test_set_inner_markup_replaces_children() {
        let mut el = Element::div();
        el.push(Element::div());
        el.push(Element::div());
        el.set_inner_markup("x");
        assert_eq!(el.children().len(), 1);
        assert_eq!(el.inner_html(), "x");
    }
}
