//! The browser capability the prober drives.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;

use crate::finding::CandidateElement;
use crate::Result;

/// Result of clicking a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    /// The page URL changed.
    pub navigated: bool,
    /// URL after the click settled.
    pub final_url: String,
}

/// A live browser page.
///
/// Every method is one awaited interaction; implementations must not start
/// a second interaction before the previous one returns. Locating a
/// candidate follows [`Locator::chain`].
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Launch the browser. Calling it on a started session is a no-op.
    async fn start(&mut self) -> Result<()>;

    /// Release the browser. Idempotent and safe after a failed `start`.
    async fn close(&mut self) -> Result<()>;

    /// Navigate. Unreachable pages and timeouts fail with `Error::Navigation`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current page markup. Retries internally while a navigation is in flight.
    async fn content(&self) -> Result<String>;

    /// Non-empty trimmed lines of text currently rendered visible.
    async fn visible_text(&self) -> Result<HashSet<String>>;

    async fn current_url(&self) -> Result<String>;

    async fn is_visible(&self, candidate: &CandidateElement) -> Result<bool>;

    async fn hover(&self, candidate: &CandidateElement) -> Result<()>;

    async fn click(&self, candidate: &CandidateElement) -> Result<ClickOutcome>;
}

/// One way of finding a candidate on the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// `a[href="..."]`, exact attribute match.
    Href(String),
    /// Interactive element whose trimmed text equals the value.
    ExactText(String),
    /// Interactive element whose text contains the value (case-insensitive).
    PartialText(String),
    /// Element with the given ARIA role (or native equivalent) and accessible name.
    Role { role: &'static str, name: String },
}

impl Locator {
    /// Ordered fallback chain for a candidate: href, exact text, partial
    /// text, then link and button roles. First locator that resolves wins.
    pub fn chain(candidate: &CandidateElement) -> Vec<Locator> {
        let mut chain = Vec::with_capacity(5);
        if let Some(ref href) = candidate.href {
            chain.push(Locator::Href(href.clone()));
        }
        if !candidate.text.is_empty() {
            chain.push(Locator::ExactText(candidate.text.clone()));
            chain.push(Locator::PartialText(candidate.text.clone()));
            let roles: &[&'static str] = if candidate.tag == "a" {
                &["link", "button"]
            } else {
                &["button", "link"]
            };
            for &role in roles {
                chain.push(Locator::Role {
                    role,
                    name: candidate.text.clone(),
                });
            }
        }
        chain
    }

    /// Strategy name and value, as passed to the page-side resolver.
    pub fn as_js_args(&self) -> (&'static str, &str, &str) {
        match self {
            Locator::Href(v) => ("href", v, ""),
            Locator::ExactText(v) => ("exact", v, ""),
            Locator::PartialText(v) => ("partial", v, ""),
            Locator::Role { role, name } => ("role", name, role),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Href(v) => write!(f, "href '{}'", v),
            Locator::ExactText(v) => write!(f, "text '{}'", v),
            Locator::PartialText(v) => write!(f, "partial text '{}'", v),
            Locator::Role { role, name } => write!(f, "role {} '{}'", role, name),
        }
    }
}
