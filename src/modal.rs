//! Modal detection: did a click open a dialog, and what does it say?

use std::collections::HashSet;

use tracing::debug;

use crate::config::heuristics::contains_any;
use crate::config::ModalRules;
use crate::dom::{collapse_whitespace, Document, NodeId};
use crate::finding::{ModalButton, ModalFinding};
use crate::snapshot::PageSnapshot;
use crate::strategy::FirstMatch;

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4"];

/// Detects dialogs that appeared between two snapshots.
pub struct ModalDetector<'a> {
    rules: &'a ModalRules,
}

impl<'a> ModalDetector<'a> {
    pub fn new(rules: &'a ModalRules) -> Self {
        Self { rules }
    }

    /// The first dialog-like container in `final_snapshot` that carries new
    /// text and at least one actionable button.
    ///
    /// "New" means the container text is not a substring of the initial
    /// page's full text: dialogs often repeat page boilerplate, so a per-line
    /// set difference would reject real dialogs while substring containment
    /// only rejects containers that were there all along.
    pub fn detect(&self, initial: &PageSnapshot, final_snapshot: &PageSnapshot) -> Option<ModalFinding> {
        if initial.same_markup(final_snapshot) {
            return None;
        }
        let blob = initial.text_blob();
        let doc = final_snapshot.document();

        for id in self.containers(doc) {
            let text = doc.text(id);
            if text.chars().count() < self.rules.min_text_len
                || contains_any(&text, &self.rules.reject_keywords)
            {
                continue;
            }
            if blob.contains(&text) {
                continue;
            }
            let buttons = self.buttons(doc, id);
            if !self.has_action(&buttons) {
                debug!("modal candidate <{}> has no actionable button", doc.get(id).tag);
                continue;
            }
            let title = self.title(doc, id, &buttons);
            return ModalFinding::new(title, text, buttons);
        }
        None
    }

    /// Candidate containers: by role, then class, then inline style, each
    /// group in document order, each element once. Falls back to every
    /// container-like element when nothing matched.
    fn containers(&self, doc: &Document) -> Vec<NodeId> {
        let r = self.rules;
        let groups: [Box<dyn Fn(NodeId) -> bool + '_>; 3] = [
            Box::new(|id| {
                doc.get(id)
                    .attr("role")
                    .is_some_and(|role| r.roles.iter().any(|x| x.eq_ignore_ascii_case(role.trim())))
            }),
            Box::new(|id| doc.get(id).class_contains_any(&r.class_keywords)),
            Box::new(|id| {
                doc.get(id)
                    .attr("style")
                    .is_some_and(|s| contains_any(s, &r.style_keywords))
            }),
        ];

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for matches in &groups {
            for (id, _) in doc.elements() {
                if matches(id) && seen.insert(id) {
                    out.push(id);
                }
            }
        }
        if out.is_empty() {
            out = doc
                .elements()
                .filter(|(_, e)| e.is_any(&r.fallback_tags))
                .map(|(id, _)| id)
                .collect();
        }
        out
    }

    /// Buttons, links and button-type inputs with text, de-duplicated by text.
    fn buttons(&self, doc: &Document, container: NodeId) -> Vec<ModalButton> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (id, el) in doc.descendants(container) {
            let text = match el.tag.as_str() {
                "button" | "a" => doc.text(id),
                "input" => match el.attr("type").map(str::to_ascii_lowercase).as_deref() {
                    Some("button") | Some("submit") => {
                        collapse_whitespace(el.attr("value").unwrap_or(""))
                    }
                    _ => continue,
                },
                _ => continue,
            };
            if text.is_empty() || text.chars().count() >= self.rules.max_button_len {
                continue;
            }
            if !seen.insert(text.clone()) {
                continue;
            }
            out.push(ModalButton {
                text,
                tag: el.tag.clone(),
                kind: el.attr("type").unwrap_or("").to_string(),
                href: el.attr("href").map(String::from),
            });
        }
        out
    }

    fn has_action(&self, buttons: &[ModalButton]) -> bool {
        let joined = buttons
            .iter()
            .map(|b| b.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        self.rules
            .action_keywords
            .iter()
            .any(|k| contains_at_word_start(&joined, &k.to_lowercase()))
    }

    fn title(&self, doc: &Document, container: NodeId, buttons: &[ModalButton]) -> String {
        let max = self.rules.title_max_len;
        let chain = FirstMatch::<NodeId, String>::new()
            .then("heading", |&c| {
                HEADINGS.iter().find_map(|h| {
                    doc.descendants(c)
                        .find(|(_, e)| e.is(h))
                        .map(|(id, _)| doc.text(id))
                        .filter(|t| !t.is_empty())
                })
            })
            .then("emphasis", |&c| {
                doc.descendants(c)
                    .filter(|(_, e)| e.is("strong") || e.is("b"))
                    .map(|(id, _)| doc.text(id))
                    .find(|t| !t.is_empty())
            })
            .then("short_child", |&c| {
                doc.children(c)
                    .filter(|&id| !matches!(doc.get(id).tag.as_str(), "button" | "a" | "input"))
                    .map(|id| doc.text(id))
                    .find(|t| (2..=200).contains(&t.chars().count()))
            })
            .then("stripped_text", |&c| {
                let mut text = doc.text(c);
                for b in buttons {
                    text = text.replace(&b.text, "");
                }
                let text = collapse_whitespace(&text);
                (!text.is_empty()).then(|| truncate(&text, max))
            });

        chain.evaluate(&container).map(|(_, t)| t).unwrap_or_default()
    }
}

/// Whether `needle` occurs in `haystack` starting at a word start, so "ok"
/// is found in "okay" but not in "book".
fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack
        .match_indices(needle)
        .any(|(i, _)| !haystack[..i].chars().next_back().is_some_and(char::is_alphanumeric))
}

/// Cap at `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<main><h1>Settings</h1><button>Delete Account</button></main>"#;

    fn detect(before: &str, after: &str) -> Option<ModalFinding> {
        let rules = ModalRules::default();
        ModalDetector::new(&rules).detect(&PageSnapshot::new(before), &PageSnapshot::new(after))
    }

    fn with_dialog(dialog: &str) -> String {
        PAGE.replace("</main>", &format!("</main>{dialog}"))
    }

    #[test]
    fn test_confirm_dialog_detected() {
        let after = with_dialog(
            r#"<div role="dialog"><h2>Are you sure?</h2><button>Cancel</button><button>Confirm</button></div>"#,
        );
        let modal = detect(PAGE, &after).expect("dialog");
        assert_eq!(modal.title(), "Are you sure?");
        assert_eq!(modal.button_texts(), vec!["Cancel", "Confirm"]);
        assert_eq!(modal.full_text(), "Are you sure? Cancel Confirm");
    }

    #[test]
    fn test_identical_snapshots_never_modal() {
        let page = with_dialog(
            r#"<div role="dialog"><h2>Are you sure?</h2><button>Cancel</button></div>"#,
        );
        assert_eq!(detect(&page, &page), None);
    }

    #[test]
    fn test_existing_container_is_not_new() {
        // Same dialog already on the page, with unrelated markup churn.
        let dialog = r#"<div class="modal"><p>Leave this page now?</p><button>Leave</button></div>"#;
        let before = with_dialog(dialog);
        let after = format!("{before}<span class='x'></span>");
        assert_eq!(detect(&before, &after), None);
    }

    #[test]
    fn test_video_container_rejected() {
        let after = with_dialog(
            r#"<div class="overlay"><p>Video unavailable in your region</p><button>Close</button></div>"#,
        );
        assert_eq!(detect(PAGE, &after), None);
    }

    #[test]
    fn test_short_text_rejected() {
        let after = with_dialog(r#"<div role="dialog"><button>OK</button></div>"#);
        assert_eq!(detect(PAGE, &after), None);
    }

    #[test]
    fn test_requires_action_keyword() {
        let after = with_dialog(
            r#"<div class="popup"><p>Subscribe to our newsletter</p><button>Subscribe</button></div>"#,
        );
        assert_eq!(detect(PAGE, &after), None);
    }

    #[test]
    fn test_action_keyword_inside_word_ignored() {
        // "ok" inside "Book" must not count.
        let after = with_dialog(
            r#"<div class="popup"><p>Reserve your table today</p><button>Book</button></div>"#,
        );
        assert_eq!(detect(PAGE, &after), None);
    }

    #[test]
    fn test_action_keyword_prefix_accepted() {
        let after = with_dialog(
            r#"<div role="dialog"><h2>Your changes were saved</h2><button>Okay</button></div>"#,
        );
        let modal = detect(PAGE, &after).expect("dialog");
        assert_eq!(modal.title(), "Your changes were saved");
        assert_eq!(modal.button_texts(), vec!["Okay"]);
    }

    #[test]
    fn test_title_from_emphasis() {
        let after = with_dialog(
            r#"<div class="modal-wrap"><p><strong>Unsaved changes</strong> will be lost.</p><button>Stay</button><button>Leave</button></div>"#,
        );
        let modal = detect(PAGE, &after).unwrap();
        assert_eq!(modal.title(), "Unsaved changes");
    }

    #[test]
    fn test_title_from_short_child() {
        let after = with_dialog(
            r#"<div role="alertdialog"><p>Session expired, sign in again</p><a href="/login">Continue</a></div>"#,
        );
        let modal = detect(PAGE, &after).unwrap();
        assert_eq!(modal.title(), "Session expired, sign in again");
        assert_eq!(modal.buttons()[0].href.as_deref(), Some("/login"));
    }

    #[test]
    fn test_title_from_stripped_text() {
        let long = "word ".repeat(50);
        let after = with_dialog(&format!(
            r#"<div role="dialog">{long}<button>Close</button></div>"#
        ));
        let modal = detect(PAGE, &after).unwrap();
        assert!(modal.title().ends_with("..."));
        assert!(modal.title().chars().count() <= 80);
        assert!(!modal.title().contains("Close"));
    }

    #[test]
    fn test_buttons_deduplicated_and_inputs_included() {
        let after = with_dialog(
            r#"<div role="dialog"><h3>Confirm order</h3><button>OK</button><a href="/">OK</a><input type="button" value="Cancel"></div>"#,
        );
        let modal = detect(PAGE, &after).unwrap();
        assert_eq!(modal.button_texts(), vec!["OK", "Cancel"]);
        assert_eq!(modal.buttons()[1].kind, "button");
    }

    #[test]
    fn test_role_outranks_class_in_priority() {
        let after = with_dialog(
            r#"<div class="popup"><p>Would you like cookies?</p><button>Yes</button></div>
               <div role="dialog"><h2>Discard draft?</h2><button>No</button></div>"#,
        );
        let modal = detect(PAGE, &after).unwrap();
        assert_eq!(modal.title(), "Discard draft?");
    }

    #[test]
    fn test_fallback_containers_when_no_selector_matches() {
        let after = with_dialog(
            r#"<section><h2>Leaving our site</h2><button>Stay</button><button>Continue</button></section>"#,
        );
        let modal = detect(PAGE, &after).unwrap();
        assert_eq!(modal.title(), "Leaving our site");
    }

    #[test]
    fn test_contains_at_word_start() {
        assert!(contains_at_word_start("cancel confirm", "cancel"));
        assert!(contains_at_word_start("no, thanks", "no"));
        assert!(contains_at_word_start("okay", "ok"));
        assert!(contains_at_word_start("stay here", "stay"));
        assert!(!contains_at_word_start("book", "ok"));
        assert!(!contains_at_word_start("unknown", "no"));
        assert!(!contains_at_word_start("anything", ""));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 80), "short");
        let t = truncate(&"a".repeat(100), 10);
        assert_eq!(t, "aaaaaaa...");
    }
}
