//! [`BrowserSession`] backed by an eoka CDP browser.

use std::collections::HashSet;

use async_trait::async_trait;
use eoka::{Browser, Page};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{BrowserConfig, CookieConfig, ProbeConfig};
use crate::finding::CandidateElement;
use crate::session::{BrowserSession, ClickOutcome, Locator};
use crate::{Error, Result};

const CONTENT_JS: &str =
    "document.documentElement ? document.documentElement.outerHTML : ''";

const VISIBLE_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

/// Resolve one locator to a unique selector, visibility and centre point.
const RESOLVE_JS: &str = r#"((kind, value, role) => {
    const norm = s => (s || '').replace(/\s+/g, ' ').trim();
    const want = norm(value).toLowerCase();
    const label = el => norm(el.innerText || el.textContent || el.value || el.getAttribute('aria-label'));
    const interactive = 'a, button, input, select, li, span, [role="button"], [role="link"], [role="menuitem"], [onclick]';
    const pick = (sel, test) => Array.from(document.querySelectorAll(sel)).find(test);

    let el = null;
    if (kind === 'href') {
        el = pick('a[href]', a => a.getAttribute('href') === value);
    } else if (kind === 'exact') {
        el = pick(interactive, e => label(e).toLowerCase() === want);
    } else if (kind === 'partial') {
        el = pick(interactive, e => label(e).toLowerCase().includes(want));
    } else if (kind === 'role') {
        const native = role === 'link'
            ? 'a[href]'
            : 'button, input[type="button"], input[type="submit"]';
        el = pick(native + ', [role="' + role + '"]', e =>
            norm(e.getAttribute('aria-label') || label(e)).toLowerCase() === want);
    }
    if (!el) return null;

    const path = [];
    let node = el;
    while (node && node !== document.body && node.nodeType === 1) {
        if (node.id) {
            path.unshift('#' + CSS.escape(node.id));
            break;
        }
        let part = node.tagName.toLowerCase();
        const siblings = Array.from(node.parentNode?.children || []);
        if (siblings.length > 1) part += ':nth-child(' + (siblings.indexOf(node) + 1) + ')';
        path.unshift(part);
        node = node.parentNode;
    }
    if (node === document.body) path.unshift('body');

    const rect = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    const visible = rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none'
        && parseFloat(style.opacity || '1') > 0;
    return {
        selector: path.join(' > '),
        visible,
        x: rect.x + rect.width / 2,
        y: rect.y + rect.height / 2,
    };
})"#;

/// Click the first visible consent button matching a selector or text.
const COOKIE_JS: &str = r#"((selectors, texts) => {
    const shown = el => {
        const r = el.getBoundingClientRect();
        return r.width > 0 && r.height > 0 && getComputedStyle(el).visibility !== 'hidden';
    };
    for (const sel of selectors) {
        let el = null;
        try { el = Array.from(document.querySelectorAll(sel)).find(shown); } catch (e) { continue; }
        if (el) { el.click(); return sel; }
    }
    const buttons = Array.from(document.querySelectorAll('button, a, [role="button"]'));
    for (const text of texts) {
        const want = text.toLowerCase();
        const el = buttons.find(b => shown(b) && (b.innerText || '').trim().toLowerCase() === want);
        if (el) { el.click(); return text; }
    }
    return null;
})"#;

#[derive(Debug, Deserialize)]
struct Resolved {
    selector: String,
    visible: bool,
    x: f64,
    y: f64,
}

/// Drives one eoka browser tab.
pub struct EokaSession {
    browser_config: BrowserConfig,
    cookies: CookieConfig,
    content_retries: u32,
    browser: Option<Browser>,
    page: Option<Page>,
}

impl EokaSession {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            browser_config: config.browser.clone(),
            cookies: config.cookies.clone(),
            content_retries: config.timing.content_retries.max(1),
            browser: None,
            page: None,
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::SessionFatal("browser session not started".into()))
    }

    async fn resolve(&self, page: &Page, locator: &Locator) -> Result<Option<Resolved>> {
        let (kind, value, role) = locator.as_js_args();
        let js = format!(
            "{}({}, {}, {})",
            RESOLVE_JS,
            serde_json::to_string(kind)?,
            serde_json::to_string(value)?,
            serde_json::to_string(role)?
        );
        let found: Option<serde_json::Value> = page.evaluate(&js).await?;
        match found {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    /// Walk the locator chain; first locator that resolves wins.
    async fn locate(&self, candidate: &CandidateElement) -> Result<Resolved> {
        let page = self.page()?;
        for locator in Locator::chain(candidate) {
            match self.resolve(page, &locator).await {
                Ok(Some(found)) => {
                    debug!("located {} via {}", candidate, locator);
                    return Ok(found);
                }
                Ok(None) => {}
                Err(e) => debug!("locator {} failed: {}", locator, e),
            }
        }
        Err(Error::CandidateNotFound(candidate.to_string()))
    }

    /// Scroll the element to the middle of the viewport and re-read its position.
    async fn bring_into_view(&self, candidate: &CandidateElement) -> Result<Resolved> {
        let page = self.page()?;
        let found = self.locate(candidate).await?;
        let js = format!(
            "document.querySelector({})?.scrollIntoView({{block:'center'}})",
            serde_json::to_string(&found.selector)?
        );
        page.execute(&js).await?;
        page.wait(100).await;
        self.locate(candidate).await
    }

    async fn dismiss_cookies(&self, page: &Page) -> Result<()> {
        let js = format!(
            "{}({}, {})",
            COOKIE_JS,
            serde_json::to_string(&self.cookies.selectors)?,
            serde_json::to_string(&self.cookies.texts)?
        );
        let clicked: Option<String> = page.evaluate(&js).await?;
        if let Some(what) = clicked {
            debug!("dismissed cookie banner via '{}'", what);
            page.wait(self.cookies.settle_ms).await;
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for EokaSession {
    async fn start(&mut self) -> Result<()> {
        if self.browser.is_some() {
            return Ok(());
        }
        let config = &self.browser_config;
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1920),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(1080),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth)
            .await
            .map_err(|e| Error::SessionFatal(format!("launch failed: {}", e)))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::SessionFatal(format!("could not open a tab: {}", e)))?;

        self.browser = Some(browser);
        self.page = Some(page);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        if let Some(browser) = self.browser.take() {
            debug!("Closing browser");
            browser.close().await?;
        }
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        page.goto(url)
            .await
            .map_err(|e| Error::Navigation(format!("{}: {}", url, e)))?;
        if self.cookies.enabled {
            if let Err(e) = self.dismiss_cookies(page).await {
                debug!("cookie dismissal skipped: {}", e);
            }
        }
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let page = self.page()?;
        let mut last = String::new();
        for attempt in 1..=self.content_retries {
            let read: std::result::Result<String, eoka::Error> = page.evaluate(CONTENT_JS).await;
            match read {
                Ok(html) => return Ok(html),
                Err(e) => {
                    debug!(
                        "content read {}/{} failed: {}",
                        attempt, self.content_retries, e
                    );
                    last = e.to_string();
                    page.wait(500).await;
                }
            }
        }
        warn!("page content unreadable after {} attempts", self.content_retries);
        Err(Error::SnapshotRead(last))
    }

    async fn visible_text(&self) -> Result<HashSet<String>> {
        let page = self.page()?;
        let text: String = page
            .evaluate(VISIBLE_TEXT_JS)
            .await
            .map_err(|e| Error::SnapshotRead(e.to_string()))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page()?.url().await?)
    }

    async fn is_visible(&self, candidate: &CandidateElement) -> Result<bool> {
        Ok(self.locate(candidate).await?.visible)
    }

    async fn hover(&self, candidate: &CandidateElement) -> Result<()> {
        let page = self.page()?;
        let found = self.bring_into_view(candidate).await?;
        page.session()
            .dispatch_mouse_event(
                eoka::cdp::MouseEventType::MouseMoved,
                found.x,
                found.y,
                None,
                None,
            )
            .await?;
        Ok(())
    }

    async fn click(&self, candidate: &CandidateElement) -> Result<ClickOutcome> {
        let page = self.page()?;
        let before = page.url().await?;
        let found = self.bring_into_view(candidate).await?;
        page.click(&found.selector).await?;
        let final_url = page.url().await?;
        Ok(ClickOutcome {
            navigated: final_url != before,
            final_url,
        })
    }
}
