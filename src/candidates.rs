//! Candidate enumeration. Finds elements worth hovering or clicking.

use std::collections::HashSet;

use tracing::debug;

use crate::config::heuristics::contains_any;
use crate::config::CandidateRules;
use crate::dom::{Document, NodeId};
use crate::finding::{CandidateElement, CandidateKind};
use crate::snapshot::PageSnapshot;

/// Candidates found on one page load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    elements: Vec<CandidateElement>,
}

impl CandidateSet {
    pub fn all(&self) -> &[CandidateElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Nav candidates, in document order, for the hover pass.
    pub fn hover_targets(&self) -> impl Iterator<Item = &CandidateElement> {
        self.elements
            .iter()
            .filter(|c| c.kind == CandidateKind::Nav)
    }

    /// Triggers plus nav buttons, for the click pass.
    pub fn click_targets(&self) -> impl Iterator<Item = &CandidateElement> {
        self.elements.iter().filter(|c| c.is_clickable())
    }
}

/// Enumerates candidates from a snapshot according to [`CandidateRules`].
pub struct CandidateFinder<'a> {
    rules: &'a CandidateRules,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(rules: &'a CandidateRules) -> Self {
        Self { rules }
    }

    /// Find nav candidates first, then triggers. `(text, href)` pairs are
    /// unique across the whole result. `_url` is accepted for callers that
    /// thread the page URL through; filtering is markup-only.
    pub fn find(&self, snapshot: &PageSnapshot, _url: Option<&str>) -> CandidateSet {
        let doc = snapshot.document();
        let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
        let mut elements = Vec::new();

        for candidate in self
            .nav_candidates(doc)
            .into_iter()
            .chain(self.trigger_candidates(doc))
        {
            let key = (candidate.text.clone(), candidate.href.clone());
            if seen.insert(key) {
                elements.push(candidate);
            }
        }

        debug!(
            "candidates: {} total ({} nav)",
            elements.len(),
            elements.iter().filter(|c| c.kind == CandidateKind::Nav).count()
        );
        CandidateSet { elements }
    }

    fn is_nav_container(&self, doc: &Document, id: NodeId) -> bool {
        let el = doc.get(id);
        el.is_any(&self.rules.nav_container_tags) || el.class_contains_any(&self.rules.nav_class_keywords)
    }

    fn nav_candidates(&self, doc: &Document) -> Vec<CandidateElement> {
        // Nested containers (a `.menu` inside a `<nav>`) would otherwise
        // yield the same element twice.
        let mut taken = vec![false; doc.len()];
        let mut out = Vec::new();

        for (id, _) in doc.elements() {
            if !self.is_nav_container(doc, id) {
                continue;
            }
            for (d, el) in doc.descendants(id) {
                if taken[d] || !el.is_any(&self.rules.nav_item_tags) {
                    continue;
                }
                taken[d] = true;
                let text = doc.text(d);
                let len = text.chars().count();
                if len < self.rules.min_nav_len || len >= self.rules.max_nav_len {
                    continue;
                }
                let mut c = CandidateElement::new(text, el.tag.clone(), CandidateKind::Nav);
                if let Some(href) = el.attr("href") {
                    c = c.with_href(href.trim());
                }
                out.push(c);
            }
        }
        out
    }

    fn trigger_candidates(&self, doc: &Document) -> Vec<CandidateElement> {
        let mut out = Vec::new();
        for (id, el) in doc.elements() {
            let text = match el.tag.as_str() {
                "a" | "button" => doc.text(id),
                "input" => {
                    let ty = el.attr("type").unwrap_or("").to_ascii_lowercase();
                    if ty != "submit" && ty != "button" {
                        continue;
                    }
                    crate::dom::collapse_whitespace(el.attr("value").unwrap_or(""))
                }
                _ => continue,
            };
            if text.is_empty()
                || text.chars().count() > self.rules.max_trigger_len
                || contains_any(&text, &self.rules.trigger_noise)
            {
                continue;
            }
            let href = el.attr("href").map(str::trim).unwrap_or("");
            let lower = href.to_ascii_lowercase();
            if self
                .rules
                .skip_href_prefixes
                .iter()
                .any(|p| lower.starts_with(&p.to_ascii_lowercase()))
            {
                continue;
            }
            out.push(CandidateElement::new(text, el.tag.clone(), CandidateKind::Trigger).with_href(href));
        }
        out
    }
}
