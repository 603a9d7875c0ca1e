//! Probe orchestration: load the page, enumerate candidates, then hover and
//! click them one at a time against a fresh navigation.

mod hover;
mod popup;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::candidates::CandidateFinder;
use crate::config::ProbeConfig;
use crate::finding::{CandidateElement, HoverFinding, InteractionFinding, PopupFinding};
use crate::session::BrowserSession;
use crate::snapshot::PageSnapshot;
use crate::{Error, Result};

/// Everything one discovery run found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub hover: Vec<HoverFinding>,
    pub popup: Vec<PopupFinding>,
    pub stats: ProbeStats,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.hover.is_empty() && self.popup.is_empty()
    }

    /// Hover findings followed by popup findings.
    pub fn findings(&self) -> Vec<InteractionFinding> {
        self.hover
            .iter()
            .cloned()
            .map(InteractionFinding::Hover)
            .chain(self.popup.iter().cloned().map(InteractionFinding::Popup))
            .collect()
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeStats {
    /// Candidates found on the initial load.
    pub candidates: usize,
    pub hover: PassStats,
    pub click: PassStats,
}

/// Counters for one probe pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Candidates the pass attempted.
    pub probed: usize,
    /// Invisible or not locatable.
    pub skipped: usize,
    /// Click left the base domain.
    pub navigated: usize,
    /// Probed without any change, including unreadable pages.
    pub unchanged: usize,
    /// Timed out or errored.
    pub failed: usize,
    /// Produced a finding.
    pub accepted: usize,
}

/// What probing one candidate produced.
#[derive(Debug)]
pub(crate) enum ProbeOutcome<T> {
    Finding(T),
    NoChange,
    Skipped,
    Navigated,
}

/// Discover hover reveals and popups on `url`.
///
/// The session must already be started. Per-candidate failures, including a
/// base page that fails to reload between candidates, are logged and counted.
/// A failed initial load or a dead session aborts.
pub async fn discover<S>(url: &str, session: &S, config: &ProbeConfig) -> Result<Discovery>
where
    S: BrowserSession + ?Sized,
{
    let prober = Prober {
        url,
        base: Url::parse(url)?,
        session,
        config,
    };

    prober.reload().await?;
    let initial = match session.content().await {
        Ok(markup) => PageSnapshot::new(markup),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("could not read {}: {}", url, e);
            PageSnapshot::new(String::new())
        }
    };
    let candidates =
        CandidateFinder::new(&config.heuristics.candidates).find(&initial, Some(url));
    info!(
        "{}: {} candidates ({} hover, {} click)",
        url,
        candidates.len(),
        candidates.hover_targets().count(),
        candidates.click_targets().count()
    );

    let mut stats = ProbeStats {
        candidates: candidates.len(),
        ..Default::default()
    };

    let limits = &config.limits;
    let hover = prober
        .pass(
            "hover",
            candidates.hover_targets().take(limits.max_hover_candidates),
            limits.hover_findings_cap(),
            &mut stats.hover,
            |c| prober.probe_hover(c),
        )
        .await?;
    let popup = prober
        .pass(
            "click",
            candidates.click_targets().take(limits.max_click_candidates),
            limits.popup_findings_cap(),
            &mut stats.click,
            |c| prober.probe_click(c),
        )
        .await?;

    info!(
        "{}: {} hover findings, {} popup findings",
        url,
        hover.len(),
        popup.len()
    );
    Ok(Discovery { hover, popup, stats })
}

/// Start `session`, run [`discover`] under the end-to-end budget, and close
/// the session whatever the outcome.
pub async fn run_discovery<S>(url: &str, session: &mut S, config: &ProbeConfig) -> Result<Discovery>
where
    S: BrowserSession + ?Sized,
{
    let result = match session.start().await {
        Ok(()) => {
            let budget = config.timing.discover_timeout_ms;
            let run = discover(url, &*session, config);
            if budget == 0 {
                run.await
            } else {
                tokio::time::timeout(Duration::from_millis(budget), run)
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::Timeout(format!(
                            "discovery of {} exceeded {}ms",
                            url, budget
                        )))
                    })
            }
        }
        Err(e @ Error::SessionFatal(_)) => Err(e),
        Err(e) => Err(Error::SessionFatal(e.to_string())),
    };

    if let Err(e) = session.close().await {
        warn!("failed to close browser session: {}", e);
    }
    result
}

/// Shared state for one discovery run.
pub(crate) struct Prober<'a, S: ?Sized> {
    url: &'a str,
    base: Url,
    session: &'a S,
    config: &'a ProbeConfig,
}

impl<'a, S: BrowserSession + ?Sized> Prober<'a, S> {
    /// Probe candidates in order until the finding cap is reached.
    async fn pass<'c, T, F, Fut>(
        &self,
        name: &str,
        candidates: impl Iterator<Item = &'c CandidateElement>,
        cap: usize,
        stats: &mut PassStats,
        probe: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&'c CandidateElement) -> Fut,
        Fut: Future<Output = Result<ProbeOutcome<T>>>,
    {
        let mut found = Vec::new();
        for candidate in candidates {
            if found.len() >= cap {
                debug!("{} pass reached {} findings", name, cap);
                break;
            }
            stats.probed += 1;
            // Only a dead session ends the pass; a page that fails to come
            // back costs this candidate alone.
            match self.reload().await {
                Ok(()) => {}
                Err(e @ Error::SessionFatal(_)) => return Err(e),
                Err(e) => {
                    warn!("{} '{}' skipped: {}", name, candidate.text, e);
                    stats.failed += 1;
                    continue;
                }
            }

            match self.bounded(candidate, probe(candidate)).await {
                Ok(ProbeOutcome::Finding(finding)) => {
                    info!("{} {} produced a finding", name, candidate);
                    stats.accepted += 1;
                    found.push(finding);
                }
                Ok(ProbeOutcome::NoChange) => {
                    debug!("{} {}: no change", name, candidate);
                    stats.unchanged += 1;
                }
                Ok(ProbeOutcome::Skipped) => {
                    debug!("{} {}: not visible", name, candidate);
                    stats.skipped += 1;
                }
                Ok(ProbeOutcome::Navigated) => {
                    debug!("{} {}: left the site", name, candidate);
                    stats.navigated += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(Error::CandidateNotFound(_)) => {
                    debug!("{} {}: could not be located", name, candidate);
                    stats.skipped += 1;
                }
                Err(Error::SnapshotRead(msg)) => {
                    debug!("{} {}: page unreadable ({}), no change", name, candidate, msg);
                    stats.unchanged += 1;
                }
                Err(e) => {
                    warn!("{} '{}' failed: {}", name, candidate.text, e);
                    stats.failed += 1;
                }
            }
        }
        Ok(found)
    }

    /// Run one probe's interaction phase under the probe timeout.
    async fn bounded<T>(
        &self,
        candidate: &CandidateElement,
        probe: impl Future<Output = Result<ProbeOutcome<T>>>,
    ) -> Result<ProbeOutcome<T>> {
        let ms = self.config.timing.probe_timeout_ms;
        tokio::time::timeout(Duration::from_millis(ms), probe)
            .await
            .unwrap_or_else(|_| {
                Err(Error::ProbeTimeout {
                    what: candidate.text.clone(),
                    ms,
                })
            })
    }

    /// Navigate back to the base URL and let it settle.
    async fn reload(&self) -> Result<()> {
        let ms = self.config.timing.navigation_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(ms), self.session.goto(self.url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_fatal() => return Err(e),
            Ok(Err(e)) => return Err(Error::Navigation(format!("{}: {}", self.url, e))),
            Err(_) => {
                return Err(Error::Navigation(format!(
                    "{} did not load within {}ms",
                    self.url, ms
                )))
            }
        }
        settle(self.config.timing.settle_after_nav_ms).await;
        Ok(())
    }

    /// Whether the candidate can be probed right now.
    async fn visible(&self, candidate: &CandidateElement) -> Result<bool> {
        match self.session.is_visible(candidate).await {
            Err(Error::CandidateNotFound(_)) => Ok(false),
            other => other,
        }
    }

    async fn capture(&self) -> Result<PageSnapshot> {
        Ok(PageSnapshot::new(self.session.content().await?))
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
