//! Question entry and submission.
use crate::fallback::try_in_order;
use chatprobe_common::{ChatprobeError, Result};
use chatprobe_config::SelectorConfig;
use chatprobe_drivers::ChatPage;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// A way of sending the filled-in question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "selector")]
pub enum SubmitControl {
    Click(String),
    /// Enter keypress on the focused element.
    Enter,
}

impl fmt::Display for SubmitControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitControl::Click(selector) => write!(f, "click {selector}"),
            SubmitControl::Enter => f.write_str("enter key"),
        }
    }
}

/// Which input took the question and which control sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submitted {
    pub input: String,
    pub control: SubmitControl,
}

#[derive(Debug, Clone)]
pub struct QuestionSubmitter {
    inputs: Vec<String>,
    controls: Vec<SubmitControl>,
}

impl QuestionSubmitter {
    pub fn new(inputs: Vec<String>, controls: Vec<SubmitControl>) -> Self {
        Self { inputs, controls }
    }

    pub fn from_config(cfg: &SelectorConfig) -> Self {
        let mut controls: Vec<SubmitControl> = cfg
            .submit_buttons
            .iter()
            .cloned()
            .map(SubmitControl::Click)
            .collect();
        if cfg.enter_fallback {
            controls.push(SubmitControl::Enter);
        }
        Self::new(cfg.inputs.clone(), controls)
    }

    pub fn controls(&self) -> &[SubmitControl] {
        &self.controls
    }

    /// Fill the question into the first input that accepts it, then send it.
    pub async fn submit_question(&self, page: &dyn ChatPage, text: &str) -> Result<Submitted> {
        let input = self.enter_question(page, text).await?;
        let control = self.send(page).await?;
        Ok(Submitted { input, control })
    }

    /// Phase one: returns the input selector that accepted `text`.
    pub async fn enter_question(&self, page: &dyn ChatPage, text: &str) -> Result<String> {
        let hit = try_in_order("input", &self.inputs, |selector| async move {
            page.fill(selector, text).await.map(Some)
        })
        .await
        .ok_or_else(|| ChatprobeError::InputFailed {
            tried: self.inputs.clone(),
        })?;
        info!(target: "chatprobe.submit", input = %hit.candidate, "question entered");
        Ok(hit.candidate.clone())
    }

    /// Phase two: returns the control that sent the question.
    pub async fn send(&self, page: &dyn ChatPage) -> Result<SubmitControl> {
        let hit = try_in_order("submit", &self.controls, |control| async move {
            match control {
                SubmitControl::Click(selector) => page.click(selector).await,
                SubmitControl::Enter => page.press_enter().await,
            }
            .map(Some)
        })
        .await
        .ok_or_else(|| ChatprobeError::SubmitFailed {
            tried: self.controls.iter().map(ToString::to_string).collect(),
        })?;
        info!(target: "chatprobe.submit", control = %hit.candidate, "question sent");
        Ok(hit.candidate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_fallback_is_last() {
        let s = QuestionSubmitter::from_config(&SelectorConfig::default());
        assert_eq!(s.controls().last(), Some(&SubmitControl::Enter));
        assert!(matches!(s.controls()[0], SubmitControl::Click(_)));
    }

    #[test]
    fn disabling_enter_fallback_drops_it() {
        let cfg = SelectorConfig {
            enter_fallback: false,
            ..SelectorConfig::default()
        };
        let s = QuestionSubmitter::from_config(&cfg);
        assert!(!s.controls().contains(&SubmitControl::Enter));
    }
}
