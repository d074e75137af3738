use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Owned view of one DOM element, read in a single round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    /// `textContent`, untrimmed.
    #[serde(default)]
    pub text: String,
    /// `innerHTML`.
    #[serde(default)]
    pub html: String,
    /// Whether the element contains any of the interactive elements asked about.
    #[serde(default)]
    pub has_interactive: bool,
}

impl ElementSnapshot {
    /// Length of the trimmed text in characters.
    pub fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}

/// Observed state of the "thinking" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorState {
    /// No element matches the selector.
    Absent,
    /// Inline or computed `display: none`.
    Hidden,
    /// Present but out of layout (`offsetParent === null`) or zero-sized.
    Collapsed,
    Visible,
}

impl IndicatorState {
    /// The assistant is done generating.
    pub fn is_settled(self) -> bool {
        !matches!(self, IndicatorState::Visible)
    }
}

/// The page surface the extraction pipeline relies on.
///
/// Implementations own one live tab. Every method is a single probe; waiting
/// and fallback policy live with the callers.
#[async_trait]
pub trait ChatPage: Send + Sync {
    /// First element matching `selector`, if any.
    async fn query_first(&self, selector: &str) -> Result<Option<ElementSnapshot>>;

    /// Every element matching `selector`, in document order. `interactive`
    /// fills [`ElementSnapshot::has_interactive`]; pass `""` to skip it.
    async fn query_all(&self, selector: &str, interactive: &str) -> Result<Vec<ElementSnapshot>>;

    /// For every element matching `outer`, the snapshot of its first
    /// descendant matching `inner`, carrying the id of the outer element.
    /// Outer elements without such a descendant yield an empty snapshot.
    async fn query_scoped(&self, outer: &str, inner: &str) -> Result<Vec<ElementSnapshot>>;

    /// Replace the value of the first element matching `selector`.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Click the `index`th element matching `selector`.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()> {
        self.click_nth(selector, 0).await
    }

    /// Send Enter to the focused element.
    async fn press_enter(&self) -> Result<()>;

    async fn indicator_state(&self, selector: &str) -> Result<IndicatorState>;

    /// Full page HTML.
    async fn content(&self) -> Result<String>;

    /// PNG screenshot of the viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Release the underlying browser session.
    async fn close(&self) -> Result<()>;
}

/// Opens a fresh page on the chat target, one per question.
#[async_trait]
pub trait PageLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn ChatPage>>;
}
