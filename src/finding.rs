//! Candidates and the findings produced by probing them.

use serde::Serialize;
use std::fmt;

/// Which probe a candidate is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    /// Navigation item, probed by hovering.
    Nav,
    /// Link or button, probed by clicking.
    Trigger,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKind::Nav => write!(f, "nav"),
            CandidateKind::Trigger => write!(f, "trigger"),
        }
    }
}

/// A page element worth probing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CandidateElement {
    /// Trimmed, whitespace-collapsed text.
    pub text: String,
    /// Lowercase tag name.
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub href: Option<String>,
}

impl CandidateElement {
    pub fn new(text: impl Into<String>, tag: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
            kind,
            href: None,
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        let href = href.into();
        self.href = if href.is_empty() { None } else { Some(href) };
        self
    }

    /// De-duplication identity.
    pub fn key(&self) -> (&str, Option<&str>) {
        (&self.text, self.href.as_deref())
    }

    /// Whether the click pass should consider this candidate.
    pub fn is_clickable(&self) -> bool {
        self.kind == CandidateKind::Trigger || self.tag == "button"
    }
}

impl fmt::Display for CandidateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> \"{}\"", self.tag, self.text)?;
        if let Some(ref h) = self.href {
            write!(f, " href=\"{}\"", h)?;
        }
        Ok(())
    }
}

/// Content present after a probe that was not there before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealedItem {
    /// Empty for structural reveals.
    pub text: String,
    pub tag: String,
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

/// An actionable control inside a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalButton {
    pub text: String,
    pub tag: String,
    /// The `type` attribute, empty when absent.
    #[serde(rename = "type")]
    pub kind: String,
    pub href: Option<String>,
}

/// A detected dialog. Always has at least one button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalFinding {
    title: String,
    full_text: String,
    buttons: Vec<ModalButton>,
}

impl ModalFinding {
    /// Returns `None` when `buttons` is empty: a dialog with nothing to act
    /// on cannot be described as a test.
    pub fn new(
        title: impl Into<String>,
        full_text: impl Into<String>,
        buttons: Vec<ModalButton>,
    ) -> Option<Self> {
        if buttons.is_empty() {
            return None;
        }
        Some(Self {
            title: title.into(),
            full_text: full_text.into(),
            buttons,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn buttons(&self) -> &[ModalButton] {
        &self.buttons
    }

    pub fn button_texts(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.text.as_str()).collect()
    }
}

/// Hovering `hover_element` revealed `revealed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverFinding {
    pub hover_element: CandidateElement,
    pub revealed: Vec<RevealedItem>,
}

/// Clicking `click_element` opened `modal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupFinding {
    pub click_element: CandidateElement,
    pub modal: ModalFinding,
}

/// Result of one accepted probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InteractionFinding {
    Hover(HoverFinding),
    Popup(PopupFinding),
}
