//! Snapshot diffing: what a probe revealed.
//!
//! Both operations are pure functions over snapshots.

use std::collections::HashSet;

use crate::config::heuristics::contains_any;
use crate::config::DiffRules;
use crate::finding::RevealedItem;
use crate::snapshot::PageSnapshot;

/// Links in `final_snapshot` whose text was not shown before the probe.
///
/// Comparing against the visible-text baseline rather than the full markup
/// catches menus that exist in the DOM but are CSS-hidden until hovered.
/// Results are in document order, one per distinct text.
pub fn new_textual_elements(
    initial_visible: &HashSet<String>,
    final_snapshot: &PageSnapshot,
    rules: &DiffRules,
) -> Vec<RevealedItem> {
    let doc = final_snapshot.document();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (id, el) in doc.elements() {
        if !el.is("a") {
            continue;
        }
        let Some(href) = el.attr("href") else {
            continue;
        };
        let text = doc.text(id);
        if text.is_empty()
            || contains_any(&text, &rules.noise_keywords)
            || initial_visible.contains(&text)
            || !seen.insert(text.clone())
        {
            continue;
        }
        let href = href.trim();
        out.push(RevealedItem {
            text,
            tag: el.tag.clone(),
            href: (!href.is_empty()).then(|| href.to_string()),
            classes: Vec::new(),
        });
    }
    out
}

/// `(tag, classes)` signatures present in `final_snapshot` but not in
/// `initial`, in order of first appearance, at most `limit`.
///
/// Low-confidence signal for reveals that add markup without readable text
/// (icon-only submenus). Items carry no text.
pub fn new_structures(
    initial: &PageSnapshot,
    final_snapshot: &PageSnapshot,
    limit: usize,
) -> Vec<RevealedItem> {
    let before: HashSet<(String, Vec<String>)> = initial
        .document()
        .elements()
        .map(|(_, e)| (e.tag.clone(), e.classes()))
        .collect();

    let mut emitted = HashSet::new();
    let mut out = Vec::new();
    for (_, el) in final_snapshot.document().elements() {
        if out.len() >= limit {
            break;
        }
        let sig = (el.tag.clone(), el.classes());
        if before.contains(&sig) || !emitted.insert(sig.clone()) {
            continue;
        }
        out.push(RevealedItem {
            text: String::new(),
            tag: sig.0,
            href: None,
            classes: sig.1,
        });
    }
    out
}
