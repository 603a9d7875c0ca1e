//! Markup parsing into a flat, document-ordered element list.
//!
//! The html5ever tree is copied once into an arena where every element's
//! descendants occupy the contiguous id range `id + 1 .. end`. Detectors only
//! ever need document-order scans, subtree scans and parent lookups, which
//! the arena answers without walking reference-counted nodes.

use std::collections::HashSet;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Index of an element in document order.
pub type NodeId = usize;

/// Tags whose text never renders.
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Pending work for [`Document::walk`].
enum Visit {
    Enter(Handle, Option<NodeId>, bool),
    Exit(NodeId),
}

#[derive(Debug, Clone)]
enum Child {
    Element(NodeId),
    Text(String),
}

/// One element of a parsed document.
#[derive(Debug, Clone)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<Child>,
    end: NodeId,
}

impl Element {
    /// Attribute value by (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Class list, in attribute order.
    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Whether the raw `class` attribute contains any keyword (case-insensitive).
    pub fn class_contains_any(&self, keywords: &[String]) -> bool {
        self.attr("class")
            .is_some_and(|c| crate::config::heuristics::contains_any(c, keywords))
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn is_any(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| t.eq_ignore_ascii_case(&self.tag))
    }
}

/// A parsed page.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    /// Parse markup. Never fails: html5ever recovers from malformed input and
    /// anything it cannot place is dropped.
    pub fn parse(markup: &str) -> Self {
        let dom: RcDom = parse_document(RcDom::default(), Default::default()).one(markup);
        let mut doc = Document::default();
        doc.walk(&dom.document);
        doc
    }

    /// Copy the tree in document order. Iterative, so nesting depth is
    /// bounded by memory rather than the call stack.
    fn walk(&mut self, root: &Handle) {
        let mut stack = vec![Visit::Enter(root.clone(), None, false)];
        while let Some(visit) = stack.pop() {
            let (handle, parent, hidden) = match visit {
                Visit::Exit(id) => {
                    self.elements[id].end = self.elements.len();
                    continue;
                }
                Visit::Enter(handle, parent, hidden) => (handle, parent, hidden),
            };
            match handle.data {
                NodeData::Document => {
                    for child in handle.children.borrow().iter().rev() {
                        stack.push(Visit::Enter(child.clone(), parent, hidden));
                    }
                }
                NodeData::Element {
                    ref name,
                    ref attrs,
                    ..
                } => {
                    let id = self.elements.len();
                    let tag = name.local.to_string().to_ascii_lowercase();
                    let hidden = hidden || NON_RENDERED.contains(&tag.as_str());
                    let attrs = attrs
                        .borrow()
                        .iter()
                        .map(|a| {
                            (
                                a.name.local.to_string().to_ascii_lowercase(),
                                a.value.to_string(),
                            )
                        })
                        .collect();
                    self.elements.push(Element {
                        tag,
                        attrs,
                        parent,
                        children: Vec::new(),
                        end: id + 1,
                    });
                    if let Some(p) = parent {
                        self.elements[p].children.push(Child::Element(id));
                    }
                    stack.push(Visit::Exit(id));
                    for child in handle.children.borrow().iter().rev() {
                        stack.push(Visit::Enter(child.clone(), Some(id), hidden));
                    }
                }
                NodeData::Text { ref contents } => {
                    if hidden {
                        continue;
                    }
                    if let Some(p) = parent {
                        self.elements[p]
                            .children
                            .push(Child::Text(contents.borrow().to_string()));
                    }
                }
                _ => {}
            }
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.elements[id]
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = (NodeId, &Element)> + '_ {
        self.elements.iter().enumerate()
    }

    /// Descendants of `id` in document order (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Element)> + '_ {
        let end = self.elements[id].end;
        (id + 1..end).map(move |d| (d, &self.elements[d]))
    }

    /// Direct element children of `id`.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.elements[id].children.iter().filter_map(|c| match c {
            Child::Element(e) => Some(*e),
            Child::Text(_) => None,
        })
    }

    /// Rendered text of an element, whitespace-collapsed.
    ///
    /// Adjacent text nodes are separated by a space before collapsing, so the
    /// text of any subtree is always a substring of [`Document::full_text`].
    pub fn text(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        self.collect_text(id, &mut parts);
        collapse_whitespace(&parts.join(" "))
    }

    fn collect_text<'a>(&'a self, id: NodeId, out: &mut Vec<&'a str>) {
        let mut stack: Vec<&'a Child> = self.elements[id].children.iter().rev().collect();
        while let Some(child) = stack.pop() {
            match child {
                Child::Text(t) => out.push(t),
                Child::Element(e) => stack.extend(self.elements[*e].children.iter().rev()),
            }
        }
    }

    /// Text of the whole document, whitespace-collapsed.
    pub fn full_text(&self) -> String {
        let mut parts = Vec::new();
        for (id, el) in self.elements() {
            if el.parent.is_none() {
                self.collect_text(id, &mut parts);
            }
        }
        collapse_whitespace(&parts.join(" "))
    }

    /// Set of every element's non-empty collapsed text.
    pub fn text_set(&self) -> HashSet<String> {
        (0..self.elements.len())
            .map(|id| self.text(id))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Trim and collapse runs of whitespace to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_parse_document_order_and_ranges() {
        let doc = Document::parse("<nav><a href='/x'>X</a><span>Y</span></nav><p>Z</p>");
        let tags: Vec<&str> = doc.elements().map(|(_, e)| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["html", "head", "body", "nav", "a", "span", "p"]);

        let nav = doc.elements().find(|(_, e)| e.is("nav")).unwrap().0;
        let inside: Vec<&str> = doc.descendants(nav).map(|(_, e)| e.tag.as_str()).collect();
        assert_eq!(inside, vec!["a", "span"]);
    }

    #[test]
    fn test_text_skips_script_and_style() {
        let doc = Document::parse(
            "<div id='d'>Hello <script>var x = 1;</script><style>p{}</style><b>world</b></div>",
        );
        let div = doc.elements().find(|(_, e)| e.is("div")).unwrap().0;
        assert_eq!(doc.text(div), "Hello world");
    }

    #[test]
    fn test_subtree_text_is_substring_of_full_text() {
        let doc = Document::parse("<div><p>One <i>two</i></p>  <p>three\nfour</p></div>");
        let full = doc.full_text();
        for (id, _) in doc.elements() {
            assert!(full.contains(&doc.text(id)), "{:?}", doc.text(id));
        }
    }

    #[test]
    fn test_attrs_and_classes() {
        let doc = Document::parse("<div class='Main-Menu open' role='navigation'></div>");
        let (_, div) = doc.elements().find(|(_, e)| e.is("div")).unwrap();
        assert_eq!(div.attr("role"), Some("navigation"));
        assert_eq!(div.classes(), vec!["Main-Menu", "open"]);
        assert!(div.class_contains_any(&["menu".to_string()]));
    }

    #[test]
    fn test_malformed_markup_does_not_panic() {
        let doc = Document::parse("<div><a href='x'>broken<div></span></li>>>");
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_tag_and_attr_names_are_lowercase_strings() {
        let doc = Document::parse("<DIV DATA-Role='menu'><SCRIPT>x()</SCRIPT>Hi</DIV>");
        let (id, div) = doc.elements().find(|(_, e)| e.is("div")).unwrap();
        assert_eq!(div.tag, "div");
        assert_eq!(div.attr("data-role"), Some("menu"));
        assert_eq!(doc.text(id), "Hi");
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 20_000;
        let markup = format!(
            "{}<a href='/deep'>Deep</a>{}",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        let doc = Document::parse(&markup);
        assert!(doc.len() > depth);
        assert_eq!(doc.full_text(), "Deep");
        let (a, _) = doc.elements().find(|(_, e)| e.is("a")).unwrap();
        assert_eq!(doc.text(a), "Deep");
        let (outer, _) = doc.elements().find(|(_, e)| e.is("div")).unwrap();
        assert_eq!(doc.descendants(outer).filter(|(_, e)| e.is("a")).count(), 1);
    }
}
