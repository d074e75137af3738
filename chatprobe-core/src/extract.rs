//! Selector-fallback answer extraction.
use crate::fallback::try_in_order;
use crate::types::{ResponseResult, SelectorCandidate};
use chatprobe_config::SelectorConfig;
use chatprobe_drivers::{ChatPage, ElementSnapshot};
use tracing::{debug, info, warn};

/// `selector_used` label for answers found by the block-element scan.
pub const BLOCK_SCAN_LABEL: &str = "generic:block-scan";

/// Drop every line whose trimmed content starts with `token`, then trim.
///
/// ```
/// use chatprobe_core::extract::strip_thinking_lines;
///
/// let raw = "考え中...\n  考え中.\nThe M5Stack Core2 has 16MB flash.\n";
/// assert_eq!(strip_thinking_lines(raw, "考え中"), "The M5Stack Core2 has 16MB flash.");
/// ```
pub fn strip_thinking_lines(raw: &str, token: &str) -> String {
    if token.is_empty() {
        return raw.trim().to_string();
    }
    raw.lines()
        .filter(|line| !line.trim().starts_with(token))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Reads the assistant's latest answer from the page.
#[derive(Debug, Clone)]
pub struct ResponseExtractor {
    candidates: Vec<SelectorCandidate>,
    generic_containers: Vec<String>,
    block_elements: String,
    interactive_elements: String,
    block_min_chars: usize,
    thinking_token: String,
}

impl ResponseExtractor {
    pub fn from_config(cfg: &SelectorConfig) -> Self {
        Self {
            candidates: cfg.candidates.iter().map(SelectorCandidate::from).collect(),
            generic_containers: cfg.generic_containers.clone(),
            block_elements: cfg.block_elements.clone(),
            interactive_elements: cfg.interactive_elements.clone(),
            block_min_chars: cfg.block_min_chars,
            thinking_token: cfg.thinking_token.clone(),
        }
    }

    /// Default fallbacks and thinking token with a custom candidate list.
    pub fn with_candidates(candidates: Vec<SelectorCandidate>) -> Self {
        Self {
            candidates,
            ..Self::from_config(&SelectorConfig::default())
        }
    }

    pub fn candidates(&self) -> &[SelectorCandidate] {
        &self.candidates
    }

    pub fn thinking_token(&self) -> &str {
        &self.thinking_token
    }

    /// Extract the answer. Never fails: an unreadable page gives
    /// [`ResponseResult::empty`].
    pub async fn extract(&self, page: &dyn ChatPage) -> ResponseResult {
        let hit = try_in_order("extract", &self.candidates, |c| self.probe(page, c)).await;
        if let Some(hit) = hit {
            info!(
                target: "chatprobe.extract",
                selector = %hit.candidate.selector,
                priority = hit.index,
                "answer found"
            );
            return self.build(hit.value, hit.candidate.selector.clone());
        }

        if let Some((label, snap)) = self.generic_container(page).await {
            info!(target: "chatprobe.extract", selector = %label, "answer found by container scan");
            return self.build(snap, label);
        }
        if let Some(snap) = self.block_scan(page).await {
            info!(target: "chatprobe.extract", "answer found by block scan");
            return self.build(snap, BLOCK_SCAN_LABEL.to_string());
        }

        warn!(
            target: "chatprobe.extract",
            candidates = self.candidates.len(),
            "no answer text found"
        );
        ResponseResult::empty()
    }

    async fn probe(
        &self,
        page: &dyn ChatPage,
        candidate: &SelectorCandidate,
    ) -> anyhow::Result<Option<ElementSnapshot>> {
        let Some(snap) = page.query_first(&candidate.selector).await? else {
            return Ok(None);
        };
        let len = snap.trimmed_len();
        if len > candidate.min_chars {
            Ok(Some(snap))
        } else {
            debug!(
                target: "chatprobe.extract",
                selector = %candidate.selector,
                len,
                min_chars = candidate.min_chars,
                "text too short"
            );
            Ok(None)
        }
    }

    /// Longest non-empty text across the generic bot-message containers.
    async fn generic_container(&self, page: &dyn ChatPage) -> Option<(String, ElementSnapshot)> {
        let mut best: Option<(String, ElementSnapshot)> = None;
        for selector in &self.generic_containers {
            let found = match page.query_all(selector, "").await {
                Ok(found) => found,
                Err(e) => {
                    debug!(target: "chatprobe.extract", %selector, error = %e, "container query failed");
                    continue;
                }
            };
            for snap in found {
                let len = snap.trimmed_len();
                if len > 0 && best.as_ref().map_or(true, |(_, b)| len > b.trimmed_len()) {
                    best = Some((format!("generic:{selector}"), snap));
                }
            }
        }
        best
    }

    /// Longest block without interactive descendants above `block_min_chars`.
    async fn block_scan(&self, page: &dyn ChatPage) -> Option<ElementSnapshot> {
        let blocks = match page
            .query_all(&self.block_elements, &self.interactive_elements)
            .await
        {
            Ok(blocks) => blocks,
            Err(e) => {
                debug!(target: "chatprobe.extract", error = %e, "block scan failed");
                return None;
            }
        };
        let mut best: Option<ElementSnapshot> = None;
        for snap in blocks {
            if snap.has_interactive {
                continue;
            }
            let len = snap.trimmed_len();
            if len > self.block_min_chars && best.as_ref().map_or(true, |b| len > b.trimmed_len()) {
                best = Some(snap);
            }
        }
        best
    }

    fn build(&self, snap: ElementSnapshot, selector: String) -> ResponseResult {
        let original_text = snap.text.trim().to_string();
        ResponseResult {
            text: strip_thinking_lines(&original_text, &self.thinking_token),
            original_text,
            html: snap.html,
            selector_used: Some(selector),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_keeps_indented_content_lines() {
        let raw = "  考え中\nline one\n  line two  \n";
        assert_eq!(strip_thinking_lines(raw, "考え中"), "line one\n  line two");
    }

    #[test]
    fn empty_token_strips_nothing() {
        assert_eq!(strip_thinking_lines(" a\nb ", ""), "a\nb");
    }

    #[test]
    fn token_mid_line_is_kept() {
        let raw = "答え: 考え中ではない";
        assert_eq!(strip_thinking_lines(raw, "考え中"), raw);
    }

    #[test]
    fn config_candidates_keep_order_and_thresholds() {
        let ex = ResponseExtractor::from_config(&SelectorConfig::default());
        assert_eq!(
            ex.candidates()[0].selector,
            ".message.bot-message:last-child .message-text"
        );
        assert!(ex.candidates().iter().all(|c| c.min_chars == 100));
    }
}
