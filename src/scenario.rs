//! Turning findings into Gherkin scenarios.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::finding::{CandidateElement, HoverFinding, ModalFinding, PopupFinding, RevealedItem};
use crate::probe::Discovery;

/// Which kind of finding a scenario or feature file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hover,
    Popup,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hover => "hover",
            Category::Popup => "popup",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a [`ScenarioWriter`] is asked to describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioRequest {
    Hover {
        url: String,
        hover_element: CandidateElement,
        revealed_target: RevealedItem,
    },
    Popup {
        url: String,
        click_element: CandidateElement,
        modal: ModalFinding,
    },
}

impl ScenarioRequest {
    /// Describes the first revealed item. `None` for a finding that revealed nothing.
    pub fn from_hover(url: &str, finding: &HoverFinding) -> Option<Self> {
        finding.revealed.first().map(|target| ScenarioRequest::Hover {
            url: url.to_string(),
            hover_element: finding.hover_element.clone(),
            revealed_target: target.clone(),
        })
    }

    pub fn from_popup(url: &str, finding: &PopupFinding) -> Self {
        ScenarioRequest::Popup {
            url: url.to_string(),
            click_element: finding.click_element.clone(),
            modal: finding.modal.clone(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ScenarioRequest::Hover { .. } => Category::Hover,
            ScenarioRequest::Popup { .. } => Category::Popup,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ScenarioRequest::Hover { url, .. } | ScenarioRequest::Popup { url, .. } => url,
        }
    }

    /// Instructions for a language-model writer.
    pub fn prompt(&self) -> String {
        match self {
            ScenarioRequest::Hover {
                url,
                hover_element,
                revealed_target,
            } => {
                let target = target_label(revealed_target);
                format!(
                    "Write one Gherkin scenario for this interaction.\n\
                     Page: {url}\n\
                     The user hovers over the \"{}\" {} element, which reveals the \"{}\" {} element.\n\
                     The user then clicks \"{}\" and the page navigates{}.\n\
                     Use Given/When/Then steps. Output only the scenario, starting with \"Scenario:\".",
                    hover_element.text,
                    hover_element.tag,
                    target,
                    revealed_target.tag,
                    target,
                    revealed_target
                        .href
                        .as_deref()
                        .map(|h| format!(" to {h}"))
                        .unwrap_or_default(),
                )
            }
            ScenarioRequest::Popup {
                url,
                click_element,
                modal,
            } => format!(
                "Write Gherkin scenarios for this popup.\n\
                 Page: {url}\n\
                 Clicking \"{}\" opens a dialog titled \"{}\".\n\
                 Dialog text: {}\n\
                 Buttons: {}\n\
                 Write one scenario per button outcome. Output only scenarios, each starting with \"Scenario:\".",
                click_element.text,
                modal.title(),
                modal.full_text(),
                modal
                    .button_texts()
                    .iter()
                    .map(|b| format!("\"{b}\""))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}

fn target_label(item: &RevealedItem) -> &str {
    if item.text.is_empty() {
        "revealed element"
    } else {
        &item.text
    }
}

/// Produces scenario text for a request. Returns an empty string on failure.
#[async_trait]
pub trait ScenarioWriter: Send + Sync {
    async fn write(&self, request: &ScenarioRequest) -> String;
}

/// Deterministic writer that fills fixed Gherkin templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateWriter;

impl TemplateWriter {
    pub fn render(request: &ScenarioRequest) -> String {
        match request {
            ScenarioRequest::Hover {
                url,
                hover_element,
                revealed_target,
            } => {
                let target = target_label(revealed_target);
                let then = match revealed_target.href {
                    Some(ref href) => format!("    Then the page should navigate to \"{href}\""),
                    None => "    Then the page should navigate to a new URL".to_string(),
                };
                [
                    "  Scenario: Hover reveals a new clickable item".to_string(),
                    format!("    Given the user is on the \"{url}\" page"),
                    format!("    When the user hovers over the \"{}\" element", hover_element.text),
                    format!("    And the user clicks the \"{target}\" link"),
                    then,
                ]
                .join("\n")
            }
            ScenarioRequest::Popup {
                url,
                click_element,
                modal,
            } => {
                let buttons = modal.button_texts();
                let cancel = buttons.first().copied().unwrap_or("Cancel");
                let proceed = buttons.get(1).copied().unwrap_or("Continue");
                let title = modal.title();
                let scenario = |label: &str, button: &str, outcome: &str| {
                    [
                        format!("  Scenario: Popup \"{title}\" {label}"),
                        format!("    Given the user is on the \"{url}\" page"),
                        format!("    When the user clicks the \"{}\" element", click_element.text),
                        format!("    Then a popup titled \"{title}\" should appear"),
                        format!("    When the user clicks the \"{button}\" button"),
                        format!("    Then {outcome}"),
                    ]
                    .join("\n")
                };
                [
                    scenario("cancel action", cancel, "the popup should close"),
                    scenario(
                        "continue action",
                        proceed,
                        "the action confirmed by the popup should proceed",
                    ),
                ]
                .join("\n\n")
            }
        }
    }
}

#[async_trait]
impl ScenarioWriter for TemplateWriter {
    async fn write(&self, request: &ScenarioRequest) -> String {
        Self::render(request)
    }
}

/// Validated scenario texts, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioGroups {
    pub hover: Vec<String>,
    pub popup: Vec<String>,
}

impl ScenarioGroups {
    pub fn is_empty(&self) -> bool {
        self.hover.is_empty() && self.popup.is_empty()
    }

    /// Non-empty groups, hover first.
    pub fn non_empty(&self) -> impl Iterator<Item = (Category, &[String])> {
        [
            (Category::Hover, self.hover.as_slice()),
            (Category::Popup, self.popup.as_slice()),
        ]
        .into_iter()
        .filter(|(_, s)| !s.is_empty())
    }
}

/// Feeds findings to a writer and keeps the outputs that look like scenarios.
pub struct ScenarioAdapter<'a, W: ?Sized> {
    writer: &'a W,
    marker: &'a str,
}

impl<'a, W: ScenarioWriter + ?Sized> ScenarioAdapter<'a, W> {
    pub fn new(writer: &'a W, marker: &'a str) -> Self {
        Self { writer, marker }
    }

    /// Write scenarios for every finding in `discovery`. Outputs without the
    /// marker are dropped; this never fails.
    pub async fn adapt(&self, url: &str, discovery: &Discovery) -> ScenarioGroups {
        let mut groups = ScenarioGroups::default();
        for finding in &discovery.hover {
            if let Some(request) = ScenarioRequest::from_hover(url, finding) {
                if let Some(text) = self.write(&request).await {
                    groups.hover.push(text);
                }
            }
        }
        for finding in &discovery.popup {
            let request = ScenarioRequest::from_popup(url, finding);
            if let Some(text) = self.write(&request).await {
                groups.popup.push(text);
            }
        }
        debug!(
            "{} hover and {} popup scenarios kept",
            groups.hover.len(),
            groups.popup.len()
        );
        groups
    }

    async fn write(&self, request: &ScenarioRequest) -> Option<String> {
        let text = self.writer.write(request).await;
        if text.contains(self.marker) {
            Some(text.trim().to_string())
        } else {
            warn!(
                "dropping {} scenario without '{}' marker ({} chars)",
                request.category(),
                self.marker,
                text.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{CandidateKind, ModalButton};
    use pretty_assertions::assert_eq;

    fn button(text: &str) -> ModalButton {
        ModalButton {
            text: text.into(),
            tag: "button".into(),
            kind: String::new(),
            href: None,
        }
    }

    fn hover_finding() -> HoverFinding {
        HoverFinding {
            hover_element: CandidateElement::new("About", "a", CandidateKind::Nav)
                .with_href("/about"),
            revealed: vec![RevealedItem {
                text: "Team".into(),
                tag: "a".into(),
                href: Some("https://example.com/about/team".into()),
                classes: vec![],
            }],
        }
    }

    fn popup_finding(buttons: &[&str]) -> PopupFinding {
        PopupFinding {
            click_element: CandidateElement::new("Delete Account", "button", CandidateKind::Trigger),
            modal: ModalFinding::new(
                "Are you sure?",
                "Are you sure? Cancel Confirm",
                buttons.iter().map(|b| button(b)).collect(),
            )
            .unwrap(),
        }
    }

    struct FixedWriter(&'static str);

    #[async_trait]
    impl ScenarioWriter for FixedWriter {
        async fn write(&self, _request: &ScenarioRequest) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_hover_template() {
        let request = ScenarioRequest::from_hover("https://example.com", &hover_finding()).unwrap();
        assert_eq!(
            TemplateWriter::render(&request),
            "  Scenario: Hover reveals a new clickable item\n\
             \x20   Given the user is on the \"https://example.com\" page\n\
             \x20   When the user hovers over the \"About\" element\n\
             \x20   And the user clicks the \"Team\" link\n\
             \x20   Then the page should navigate to \"https://example.com/about/team\""
        );
    }

    #[test]
    fn test_popup_template_has_cancel_and_continue() {
        let request = ScenarioRequest::from_popup("https://example.com", &popup_finding(&["Cancel", "Confirm"]));
        let text = TemplateWriter::render(&request);
        assert_eq!(text.matches("Scenario:").count(), 2);
        assert!(text.contains("When the user clicks the \"Cancel\" button"));
        assert!(text.contains("When the user clicks the \"Confirm\" button"));
        assert!(text.contains("a popup titled \"Are you sure?\""));
    }

    #[test]
    fn test_popup_template_single_button_defaults_continue() {
        let request = ScenarioRequest::from_popup("https://example.com", &popup_finding(&["Close"]));
        let text = TemplateWriter::render(&request);
        assert!(text.contains("\"Close\" button"));
        assert!(text.contains("\"Continue\" button"));
    }

    #[test]
    fn test_hover_without_reveals_has_no_request() {
        let mut finding = hover_finding();
        finding.revealed.clear();
        assert_eq!(ScenarioRequest::from_hover("https://example.com", &finding), None);
    }

    #[test]
    fn test_prompt_mentions_elements() {
        let hover = ScenarioRequest::from_hover("https://example.com", &hover_finding()).unwrap();
        let prompt = hover.prompt();
        assert!(prompt.contains("\"About\""));
        assert!(prompt.contains("\"Team\""));
        assert!(prompt.contains("to https://example.com/about/team"));

        let popup = ScenarioRequest::from_popup("https://example.com", &popup_finding(&["Cancel", "Confirm"]));
        let prompt = popup.prompt();
        assert!(prompt.contains("titled \"Are you sure?\""));
        assert!(prompt.contains("\"Cancel\", \"Confirm\""));
    }

    #[test]
    fn test_request_serializes_with_type_tag() {
        let request = ScenarioRequest::from_hover("https://example.com", &hover_finding()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "hover");
        assert_eq!(json["hover_element"]["type"], "nav");
        assert_eq!(json["revealed_target"]["text"], "Team");
    }

    #[tokio::test]
    async fn test_adapter_groups_template_output() {
        let discovery = Discovery {
            hover: vec![hover_finding()],
            popup: vec![popup_finding(&["Cancel", "Confirm"])],
            ..Default::default()
        };
        let groups = ScenarioAdapter::new(&TemplateWriter, "Scenario:")
            .adapt("https://example.com", &discovery)
            .await;
        assert_eq!(groups.hover.len(), 1);
        assert_eq!(groups.popup.len(), 1);
        let categories: Vec<Category> = groups.non_empty().map(|(c, _)| c).collect();
        assert_eq!(categories, vec![Category::Hover, Category::Popup]);
    }

    #[tokio::test]
    async fn test_adapter_drops_text_without_marker() {
        let discovery = Discovery {
            hover: vec![hover_finding()],
            ..Default::default()
        };
        let groups = ScenarioAdapter::new(&FixedWriter("I cannot help with that."), "Scenario:")
            .adapt("https://example.com", &discovery)
            .await;
        assert!(groups.is_empty());

        let groups = ScenarioAdapter::new(&FixedWriter(""), "Scenario:")
            .adapt("https://example.com", &discovery)
            .await;
        assert!(groups.is_empty());
    }
}
