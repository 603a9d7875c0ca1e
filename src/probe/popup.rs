use tracing::debug;
use url::Url;

use super::{settle, ProbeOutcome, Prober};
use crate::finding::{CandidateElement, PopupFinding};
use crate::modal::ModalDetector;
use crate::session::BrowserSession;
use crate::Result;

impl<'a, S: BrowserSession + ?Sized> Prober<'a, S> {
    /// Click one candidate and report the dialog it opened, if any.
    pub(crate) async fn probe_click(
        &self,
        candidate: &CandidateElement,
    ) -> Result<ProbeOutcome<PopupFinding>> {
        if !self.visible(candidate).await? {
            return Ok(ProbeOutcome::Skipped);
        }

        let initial = self.capture().await?;
        let initial_url = self.session.current_url().await?;

        let outcome = self.session.click(candidate).await?;
        settle(self.config.timing.settle_after_click_ms).await;

        // The click's own report is only trusted when the URL cannot be re-read.
        let left = match self.session.current_url().await {
            Ok(url) => leaves_site(&initial_url, &url),
            Err(e) => {
                debug!("{}: URL unreadable after click ({})", candidate, e);
                outcome.navigated && leaves_site(&initial_url, &outcome.final_url)
            }
        };
        if left {
            return Ok(ProbeOutcome::Navigated);
        }

        let after = self.capture().await?;
        let detector = ModalDetector::new(&self.config.heuristics.modal);
        Ok(match detector.detect(&initial, &after) {
            Some(modal) => ProbeOutcome::Finding(PopupFinding {
                click_element: candidate.clone(),
                modal,
            }),
            None => ProbeOutcome::NoChange,
        })
    }
}

/// Whether going from `from` to `to` changed host or port. URLs without a
/// host, such as `about:blank`, count as leaving.
fn leaves_site(from: &str, to: &str) -> bool {
    origin(from) != origin(to)
}

fn origin(url: &str) -> Option<(String, Option<u16>)> {
    let u = Url::parse(url).ok()?;
    let host = u.host_str()?.to_ascii_lowercase();
    Some((host, u.port_or_known_default()))
}
