//! Selector diagnostics: report how each candidate selector fares on a page.
use chatprobe_drivers::ChatPage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub selector: String,
    pub exists: bool,
    /// Trimmed text length in characters.
    pub length: usize,
    pub preview: Option<String>,
    /// `length > min_chars`.
    pub valid: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorReport {
    pub min_chars: usize,
    pub results: Vec<ProbeResult>,
}

impl SelectorReport {
    pub fn valid(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.valid)
    }

    /// The valid selector with the longest text; the earlier one on ties.
    pub fn best(&self) -> Option<&ProbeResult> {
        self.valid()
            .fold(None, |best: Option<&ProbeResult>, r| match best {
                Some(b) if b.length >= r.length => Some(b),
                _ => Some(r),
            })
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Query each selector once and record what it finds.
pub async fn probe_selectors(
    page: &dyn ChatPage,
    selectors: &[String],
    min_chars: usize,
) -> SelectorReport {
    let mut results = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let result = match page.query_first(selector).await {
            Ok(Some(snap)) => {
                let text = snap.text.trim();
                let length = text.chars().count();
                ProbeResult {
                    selector: selector.clone(),
                    exists: true,
                    length,
                    preview: Some(preview(text)),
                    valid: length > min_chars,
                    error: None,
                }
            }
            Ok(None) => ProbeResult {
                selector: selector.clone(),
                ..ProbeResult::default()
            },
            Err(e) => ProbeResult {
                selector: selector.clone(),
                error: Some(e.to_string()),
                ..ProbeResult::default()
            },
        };
        debug!(
            target: "chatprobe.probe",
            selector = %result.selector,
            exists = result.exists,
            length = result.length,
            valid = result.valid,
            "selector probed"
        );
        results.push(result);
    }

    let report = SelectorReport { min_chars, results };
    info!(
        target: "chatprobe.probe",
        tested = report.results.len(),
        valid = report.valid().count(),
        best = report.best().map(|b| b.selector.as_str()).unwrap_or("none"),
        "selector probe finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_marks_truncation() {
        assert_eq!(preview("short"), "short");
        let long = "あ".repeat(150);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn best_prefers_longest_then_earliest() {
        let r = |selector: &str, length, valid| ProbeResult {
            selector: selector.into(),
            exists: true,
            length,
            valid,
            ..ProbeResult::default()
        };
        let report = SelectorReport {
            min_chars: 50,
            results: vec![r("a", 80, true), r("b", 300, false), r("c", 120, true), r("d", 120, true)],
        };
        assert_eq!(report.best().map(|b| b.selector.as_str()), Some("c"));
        assert_eq!(report.valid().count(), 3);
    }
}
