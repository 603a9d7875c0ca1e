//! Immutable captures of page state taken at probe boundaries.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::dom::Document;

/// Rendered markup at a point in time, optionally with the set of text lines
/// that were actually visible (as opposed to merely present in the DOM).
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    markup: String,
    document: Document,
    visible_text: Option<HashSet<String>>,
}

impl PageSnapshot {
    /// Capture markup. Parsing happens once, here.
    pub fn new(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let document = Document::parse(&markup);
        Self {
            markup,
            document,
            visible_text: None,
        }
    }

    /// Attach the visible-text lines read from the browser. Blank lines are dropped.
    pub fn with_visible_text<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.visible_text = Some(
            lines
                .into_iter()
                .map(|l| l.as_ref().trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        );
        self
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn visible_text(&self) -> Option<&HashSet<String>> {
        self.visible_text.as_ref()
    }

    /// Texts considered "already shown" before a probe: the visible lines if
    /// captured, otherwise every element's text in the markup.
    pub fn text_baseline(&self) -> Cow<'_, HashSet<String>> {
        match self.visible_text {
            Some(ref v) => Cow::Borrowed(v),
            None => Cow::Owned(self.document.text_set()),
        }
    }

    /// The whole page's collapsed text.
    pub fn text_blob(&self) -> String {
        self.document.full_text()
    }

    /// Byte-identical markup.
    pub fn same_markup(&self, other: &PageSnapshot) -> bool {
        self.markup == other.markup
    }
}
