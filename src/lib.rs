//! # eoka-probe
//!
//! Discovers hover menus and popup dialogs on a live page and turns each one
//! into Gherkin scenarios.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eoka_probe::{run_discovery, EokaSession, ProbeConfig, ScenarioAdapter, TemplateWriter};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka_probe::Result<()> {
//! let config = ProbeConfig::load("probe.yaml")?;
//! let mut session = EokaSession::new(&config);
//! let discovery = run_discovery("https://example.com", &mut session, &config).await?;
//! let groups = ScenarioAdapter::new(&TemplateWriter, &config.output.scenario_marker)
//!     .adapt("https://example.com", &discovery)
//!     .await;
//! println!("{} hover, {} popup scenarios", groups.hover.len(), groups.popup.len());
//! # Ok(())
//! # }
//! ```

pub mod candidates;
pub mod config;
pub mod diff;
pub mod dom;
mod eoka_session;
pub mod feature;
pub mod finding;
pub mod modal;
pub mod probe;
pub mod report;
pub mod scenario;
pub mod session;
pub mod snapshot;
pub mod strategy;

pub use candidates::{CandidateFinder, CandidateSet};
pub use config::{
    BrowserConfig, CandidateRules, CookieConfig, DiffRules, Heuristics, Limits, ModalRules,
    OutputConfig, ProbeConfig, StopPolicy, Timing, Viewport,
};
pub use eoka_session::EokaSession;
pub use feature::{assemble_feature, FeaturePersister, FsPersister};
pub use finding::{
    CandidateElement, CandidateKind, HoverFinding, InteractionFinding, ModalButton, ModalFinding,
    PopupFinding, RevealedItem,
};
pub use modal::ModalDetector;
pub use probe::{discover, run_discovery, Discovery, PassStats, ProbeStats};
pub use report::{Report, ReportFile};
pub use scenario::{Category, ScenarioAdapter, ScenarioGroups, ScenarioRequest, ScenarioWriter, TemplateWriter};
pub use session::{BrowserSession, ClickOutcome, Locator};
pub use snapshot::PageSnapshot;

/// Result type for eoka-probe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading config, probing or writing output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("element not found: {0}")]
    CandidateNotFound(String),

    #[error("probe of '{what}' timed out after {ms}ms")]
    ProbeTimeout { what: String, ms: u64 },

    #[error("could not read page: {0}")]
    SnapshotRead(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser session unusable: {0}")]
    SessionFatal(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Errors that end a discovery run. Everything else is scoped to a
    /// single candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Navigation(_) | Error::SessionFatal(_) | Error::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = ProbeConfig::parse("").unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.limits.max_hover_candidates, 20);
        assert_eq!(config.limits.stop_policy, StopPolicy::Accumulate);
        assert_eq!(config.output.scenario_marker, "Scenario:");
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
browser:
  headless: false
  proxy: "http://localhost:8080"
limits:
  max_click_candidates: 3
  stop_policy: first_match
timing:
  settle_after_hover_ms: 250
output:
  dir: "out"
"#;
        let config = ProbeConfig::parse(yaml).unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.browser.proxy.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.limits.max_click_candidates, 3);
        assert_eq!(config.limits.max_hover_candidates, 20);
        assert_eq!(config.limits.stop_policy, StopPolicy::FirstMatch);
        assert_eq!(config.limits.popup_findings_cap(), 1);
        assert_eq!(config.timing.settle_after_hover_ms, 250);
        assert_eq!(config.timing.settle_after_click_ms, 2000);
        assert_eq!(config.output.dir, "out");
    }

    #[test]
    fn test_parse_heuristics_override() {
        let yaml = r#"
heuristics:
  diff:
    noise_keywords: ["sponsored"]
    structural_fallback: true
  modal:
    action_keywords: ["proceed"]
"#;
        let config = ProbeConfig::parse(yaml).unwrap();
        assert_eq!(config.heuristics.diff.noise_keywords, vec!["sponsored"]);
        assert!(config.heuristics.diff.structural_fallback);
        assert_eq!(config.heuristics.modal.action_keywords, vec!["proceed"]);
        assert_eq!(config.heuristics.modal.min_text_len, 15);
    }

    #[test]
    fn test_validate_rejects_zero_probe_timeout() {
        let yaml = r#"
timing:
  probe_timeout_ms: 0
"#;
        let err = ProbeConfig::parse(yaml).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_marker() {
        let yaml = r#"
output:
  scenario_marker: "  "
"#;
        assert!(ProbeConfig::parse(yaml).is_err());
    }

    #[test]
    fn test_unknown_stop_policy_is_yaml_error() {
        let yaml = r#"
limits:
  stop_policy: whenever
"#;
        assert!(matches!(ProbeConfig::parse(yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Navigation("down".into()).is_fatal());
        assert!(Error::SessionFatal("crashed".into()).is_fatal());
        assert!(Error::Timeout("budget".into()).is_fatal());
        assert!(!Error::CandidateNotFound("About".into()).is_fatal());
        assert!(!Error::SnapshotRead("detached".into()).is_fatal());
        assert!(!Error::ProbeTimeout { what: "About".into(), ms: 10 }.is_fatal());
    }
}
