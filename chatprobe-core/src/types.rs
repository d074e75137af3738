use chatprobe_config::CandidateConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One extraction attempt's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseResult {
    /// Answer text with thinking-token lines removed.
    pub text: String,
    /// Trimmed raw text of the matched element.
    pub original_text: String,
    pub html: String,
    /// Selector (or `generic:` label) that produced the answer; `None` when
    /// nothing matched.
    pub selector_used: Option<String>,
}

impl ResponseResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selector_used.is_none() && self.text.is_empty()
    }
}

/// A CSS selector and the trimmed length its text must exceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCandidate {
    pub selector: String,
    pub min_chars: usize,
}

impl SelectorCandidate {
    pub fn new(selector: impl Into<String>, min_chars: usize) -> Self {
        Self {
            selector: selector.into(),
            min_chars,
        }
    }
}

impl From<&CandidateConfig> for SelectorCandidate {
    fn from(c: &CandidateConfig) -> Self {
        Self::new(c.selector.clone(), c.min_chars)
    }
}

impl fmt::Display for SelectorCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (>{} chars)", self.selector, self.min_chars)
    }
}

/// One rendered bot bubble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMessage {
    pub id: Option<String>,
    pub text: String,
    pub html: String,
    pub original_text: String,
}
