//! Keyword and selector lists behind the detectors.
//!
//! Every list is plain data so behavior can be tuned from YAML without
//! touching detector code. Keywords are matched case-insensitively.

use crate::{Error, Result};
use serde::Deserialize;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// All detector heuristics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub candidates: CandidateRules,
    pub diff: DiffRules,
    pub modal: ModalRules,
}

impl Heuristics {
    pub(crate) fn validate(&self) -> Result<()> {
        let c = &self.candidates;
        if c.nav_item_tags.is_empty() {
            return Err(Error::Config(
                "heuristics.candidates.nav_item_tags must not be empty".into(),
            ));
        }
        if c.max_trigger_len == 0 || c.max_nav_len == 0 {
            return Err(Error::Config(
                "heuristics.candidates text limits must be non-zero".into(),
            ));
        }
        if self.modal.title_max_len < 4 {
            return Err(Error::Config(
                "heuristics.modal.title_max_len must be at least 4".into(),
            ));
        }
        Ok(())
    }
}

/// Rules for enumerating hover and click candidates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CandidateRules {
    /// Container tags whose descendants are nav candidates.
    pub nav_container_tags: Vec<String>,
    /// Class substrings that mark an element as a nav container.
    pub nav_class_keywords: Vec<String>,
    /// Descendant tags that become nav candidates.
    pub nav_item_tags: Vec<String>,
    pub min_nav_len: usize,
    pub max_nav_len: usize,
    pub max_trigger_len: usize,
    /// Trigger texts containing any of these are skipped.
    pub trigger_noise: Vec<String>,
    /// Anchors whose href starts with one of these are never click targets.
    pub skip_href_prefixes: Vec<String>,
}

impl Default for CandidateRules {
    fn default() -> Self {
        Self {
            nav_container_tags: strings(&["nav", "header"]),
            nav_class_keywords: strings(&["menu", "nav"]),
            nav_item_tags: strings(&["a", "span", "li", "button"]),
            min_nav_len: 2,
            max_nav_len: 200,
            max_trigger_len: 60,
            trigger_noise: strings(&["skip to", "video unavailable", "loading", "advertisement"]),
            skip_href_prefixes: strings(&["mailto:", "tel:", "javascript:"]),
        }
    }
}

/// Rules for the snapshot differ.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiffRules {
    /// Revealed link texts containing any of these are ignored.
    pub noise_keywords: Vec<String>,
    /// Fall back to new (tag, classes) signatures when no new text appeared.
    pub structural_fallback: bool,
    pub structural_limit: usize,
}

impl Default for DiffRules {
    fn default() -> Self {
        Self {
            noise_keywords: strings(&["video", "supported", "unavailable", "loading", "advertisement"]),
            structural_fallback: false,
            structural_limit: 10,
        }
    }
}

/// Rules for modal detection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModalRules {
    /// `role` attribute values that mark a dialog.
    pub roles: Vec<String>,
    /// Class substrings that mark a dialog-like container.
    pub class_keywords: Vec<String>,
    /// Inline `style` substrings that mark an overlay.
    pub style_keywords: Vec<String>,
    /// Tags scanned when no selector matched.
    pub fallback_tags: Vec<String>,
    pub min_text_len: usize,
    /// Containers whose text contains any of these are rejected.
    pub reject_keywords: Vec<String>,
    /// At least one button text must contain one of these words.
    pub action_keywords: Vec<String>,
    pub title_max_len: usize,
    pub max_button_len: usize,
}

impl Default for ModalRules {
    fn default() -> Self {
        Self {
            roles: strings(&["dialog", "alertdialog"]),
            class_keywords: strings(&["modal", "popup", "dialog", "overlay"]),
            style_keywords: strings(&["fixed", "absolute"]),
            fallback_tags: strings(&["div", "section", "aside", "dialog"]),
            min_text_len: 15,
            reject_keywords: strings(&["video"]),
            action_keywords: strings(&[
                "cancel", "close", "ok", "continue", "stay", "leave", "yes", "no",
            ]),
            title_max_len: 80,
            max_button_len: 80,
        }
    }
}

/// Case-insensitive "contains any of" check.
pub(crate) fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    let lower = haystack.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
}
