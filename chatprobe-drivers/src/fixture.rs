//! HTML-backed [`ChatPage`] for exercising the extraction pipeline without a
//! browser.
//!
//! The page parses its current HTML with `scraper` on every probe, so CSS
//! selectors behave as they would in the browser (`:last-child`,
//! `:nth-last-child(n)`, attribute selectors). Interactions are recorded in a
//! shared [`FixtureLog`]. A submit (click or Enter) can swap in the next
//! scripted DOM, and the thinking indicator can follow a scripted sequence.
use crate::chat_browser::page::{ChatPage, ElementSnapshot, IndicatorState, PageLauncher};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Eight-byte PNG signature returned as the "screenshot".
pub const FIXTURE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureAction {
    Fill { selector: String, text: String },
    Click { selector: String, index: usize },
    Enter,
    Close,
}

/// Interactions shared between a launcher, its pages and the test.
#[derive(Debug, Clone, Default)]
pub struct FixtureLog {
    inner: Arc<Mutex<Vec<FixtureAction>>>,
}

impl FixtureLog {
    fn push(&self, action: FixtureAction) {
        if let Ok(mut actions) = self.inner.lock() {
            actions.push(action);
        }
    }

    pub fn actions(&self) -> Vec<FixtureAction> {
        self.inner.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn closes(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, FixtureAction::Close))
            .count()
    }
}

/// Static description of a fixture page; cheap to clone into many pages.
#[derive(Debug, Clone, Default)]
pub struct FixtureScript {
    pub html: String,
    /// DOMs swapped in, one per submit (click or Enter).
    pub after_submit: Vec<String>,
    /// Indicator states returned by successive polls; the last one sticks.
    /// Empty means "derive from the DOM".
    pub indicator: Vec<IndicatorState>,
}

impl FixtureScript {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn then_on_submit(mut self, html: impl Into<String>) -> Self {
        self.after_submit.push(html.into());
        self
    }

    pub fn with_indicator(mut self, states: impl IntoIterator<Item = IndicatorState>) -> Self {
        self.indicator = states.into_iter().collect();
        self
    }
}

pub struct FixturePage {
    html: Mutex<String>,
    after_submit: Mutex<VecDeque<String>>,
    indicator: Mutex<VecDeque<IndicatorState>>,
    last_indicator: Mutex<Option<IndicatorState>>,
    indicator_polls: AtomicUsize,
    log: FixtureLog,
}

impl FixturePage {
    pub fn new(html: impl Into<String>) -> Self {
        Self::from_script(FixtureScript::new(html), FixtureLog::default())
    }

    pub fn from_script(script: FixtureScript, log: FixtureLog) -> Self {
        Self {
            html: Mutex::new(script.html),
            after_submit: Mutex::new(script.after_submit.into()),
            indicator: Mutex::new(script.indicator.into()),
            last_indicator: Mutex::new(None),
            indicator_polls: AtomicUsize::new(0),
            log,
        }
    }

    pub fn log(&self) -> FixtureLog {
        self.log.clone()
    }

    /// Number of `indicator_state` calls so far.
    pub fn indicator_polls(&self) -> usize {
        self.indicator_polls.load(Ordering::SeqCst)
    }

    fn current_html(&self) -> Result<String> {
        self.html
            .lock()
            .map(|h| h.clone())
            .map_err(|_| anyhow!("fixture html lock poisoned"))
    }

    fn advance_dom(&self) {
        let next = self.after_submit.lock().ok().and_then(|mut q| q.pop_front());
        if let (Some(next), Ok(mut html)) = (next, self.html.lock()) {
            *html = next;
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid selector {selector:?}: {e:?}"))
}

fn snapshot(el: ElementRef<'_>, interactive: Option<&Selector>) -> ElementSnapshot {
    let has_interactive = interactive
        .map(|sel| el.select(sel).any(|d| d.id() != el.id()))
        .unwrap_or(false);
    ElementSnapshot {
        id: el.value().id().map(str::to_string),
        text: el.text().collect(),
        html: el.inner_html(),
        has_interactive,
    }
}

fn display_none() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)display\s*:\s*none").expect("valid regex"))
}

fn select_all(html: &str, selector: &str, interactive: &str) -> Result<Vec<ElementSnapshot>> {
    let sel = parse_selector(selector)?;
    let inter = if interactive.trim().is_empty() {
        None
    } else {
        Some(parse_selector(interactive)?)
    };
    let doc = Html::parse_document(html);
    Ok(doc
        .select(&sel)
        .map(|el| snapshot(el, inter.as_ref()))
        .collect())
}

fn select_scoped(html: &str, outer: &str, inner: &str) -> Result<Vec<ElementSnapshot>> {
    let outer_sel = parse_selector(outer)?;
    let inner_sel = parse_selector(inner)?;
    let doc = Html::parse_document(html);
    Ok(doc
        .select(&outer_sel)
        .map(|el| {
            let child = el.select(&inner_sel).find(|d| d.id() != el.id());
            ElementSnapshot {
                id: el.value().id().map(str::to_string),
                text: child.map(|c| c.text().collect()).unwrap_or_default(),
                html: child.map(|c| c.inner_html()).unwrap_or_default(),
                has_interactive: false,
            }
        })
        .collect())
}

/// Mirrors the browser's refusal to fill non-editable or click disabled elements.
fn check_target(html: &str, selector: &str, index: usize, editable: bool) -> Result<()> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let Some(el) = doc.select(&sel).nth(index) else {
        bail!("no element #{index} matches {selector:?}");
    };
    let node = el.value();
    if node.attr("disabled").is_some() {
        bail!("element matching {selector:?} is disabled");
    }
    if editable && !matches!(node.name(), "textarea" | "input") {
        bail!("element matching {selector:?} is a <{}>, not an input", node.name());
    }
    Ok(())
}

fn dom_indicator_state(html: &str, selector: &str) -> Result<IndicatorState> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let Some(el) = doc.select(&sel).next() else {
        return Ok(IndicatorState::Absent);
    };
    let node = el.value();
    let hidden = node.attr("hidden").is_some()
        || node
            .attr("style")
            .map(|s| display_none().is_match(s))
            .unwrap_or(false);
    Ok(if hidden {
        IndicatorState::Hidden
    } else {
        IndicatorState::Visible
    })
}

#[async_trait]
impl ChatPage for FixturePage {
    async fn query_first(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        Ok(select_all(&self.current_html()?, selector, "")?
            .into_iter()
            .next())
    }

    async fn query_all(&self, selector: &str, interactive: &str) -> Result<Vec<ElementSnapshot>> {
        select_all(&self.current_html()?, selector, interactive)
    }

    async fn query_scoped(&self, outer: &str, inner: &str) -> Result<Vec<ElementSnapshot>> {
        select_scoped(&self.current_html()?, outer, inner)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        check_target(&self.current_html()?, selector, 0, true)?;
        self.log.push(FixtureAction::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        check_target(&self.current_html()?, selector, index, false)?;
        self.log.push(FixtureAction::Click {
            selector: selector.to_string(),
            index,
        });
        self.advance_dom();
        Ok(())
    }

    async fn press_enter(&self) -> Result<()> {
        self.log.push(FixtureAction::Enter);
        self.advance_dom();
        Ok(())
    }

    async fn indicator_state(&self, selector: &str) -> Result<IndicatorState> {
        self.indicator_polls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.indicator.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = self
            .last_indicator
            .lock()
            .map_err(|_| anyhow!("fixture indicator lock poisoned"))?;
        if let Some(state) = scripted {
            *last = Some(state);
            return Ok(state);
        }
        if let Some(state) = *last {
            return Ok(state);
        }
        drop(last);
        dom_indicator_state(&self.current_html()?, selector)
    }

    async fn content(&self) -> Result<String> {
        self.current_html()
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(FIXTURE_PNG.to_vec())
    }

    async fn close(&self) -> Result<()> {
        self.log.push(FixtureAction::Close);
        Ok(())
    }
}

/// Launches [`FixturePage`]s from one script, or fails every launch.
pub struct FixtureLauncher {
    script: FixtureScript,
    log: FixtureLog,
    launches: AtomicUsize,
    fail_with: Option<String>,
}

impl FixtureLauncher {
    pub fn new(script: FixtureScript) -> Self {
        Self {
            script,
            log: FixtureLog::default(),
            launches: AtomicUsize::new(0),
            fail_with: None,
        }
    }

    /// A launcher whose every launch fails, like an unreachable WebDriver.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new(FixtureScript::default())
        }
    }

    pub fn log(&self) -> FixtureLog {
        self.log.clone()
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageLauncher for FixtureLauncher {
    async fn launch(&self) -> Result<Box<dyn ChatPage>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fail_with {
            bail!("{msg}");
        }
        Ok(Box::new(FixturePage::from_script(
            self.script.clone(),
            self.log.clone(),
        )))
    }
}
