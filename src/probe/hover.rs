use tracing::debug;

use super::{settle, ProbeOutcome, Prober};
use crate::diff;
use crate::finding::{CandidateElement, HoverFinding, RevealedItem};
use crate::session::BrowserSession;
use crate::snapshot::PageSnapshot;
use crate::Result;

impl<'a, S: BrowserSession + ?Sized> Prober<'a, S> {
    /// Hover one nav candidate and report the links it revealed.
    pub(crate) async fn probe_hover(
        &self,
        candidate: &CandidateElement,
    ) -> Result<ProbeOutcome<HoverFinding>> {
        if !self.visible(candidate).await? {
            return Ok(ProbeOutcome::Skipped);
        }

        let visible = self.session.visible_text().await?;
        let initial = PageSnapshot::new(self.session.content().await?).with_visible_text(visible);

        self.session.hover(candidate).await?;
        settle(self.config.timing.settle_after_hover_ms).await;

        let rules = &self.config.heuristics.diff;
        let baseline = initial.text_baseline();
        let mut after = self.capture().await?;
        let mut revealed = diff::new_textual_elements(&baseline, &after, rules);

        if revealed.is_empty() && self.config.timing.recheck_ms > 0 {
            settle(self.config.timing.recheck_ms).await;
            after = self.capture().await?;
            revealed = diff::new_textual_elements(&baseline, &after, rules);
        }
        if revealed.is_empty() && rules.structural_fallback {
            revealed = diff::new_structures(&initial, &after, rules.structural_limit);
            if !revealed.is_empty() {
                debug!("{}: {} new structures", candidate, revealed.len());
            }
        }
        if revealed.is_empty() {
            return Ok(ProbeOutcome::NoChange);
        }

        for item in &mut revealed {
            self.absolutize(item);
        }
        Ok(ProbeOutcome::Finding(HoverFinding {
            hover_element: candidate.clone(),
            revealed,
        }))
    }

    /// Resolve a revealed href against the base URL. Unresolvable hrefs are
    /// kept as written.
    fn absolutize(&self, item: &mut RevealedItem) {
        if let Some(href) = item.href.as_mut() {
            if let Ok(abs) = self.base.join(href) {
                *href = abs.to_string();
            }
        }
    }
}
