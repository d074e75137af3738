//! Bounded wait for the assistant to finish generating.
//!
//! The chat page shows a "thinking" indicator while an answer streams in.
//! Completion is detected in two phases: wait for the indicator to appear,
//! then wait for it to settle (see [`IndicatorState::is_settled`]), then let
//! the final render land during a fixed grace delay. Both phases are bounded
//! and neither is fatal.
use chatprobe_config::{SelectorConfig, TimingConfig};
use chatprobe_drivers::{ChatPage, IndicatorState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    /// The indicator was seen visible during the appear phase.
    pub appeared: bool,
    /// The indicator settled before the disappear deadline.
    pub settled: bool,
    /// Total time spent, grace delay included.
    pub waited_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CompletionDetector {
    indicator: String,
    appear_timeout: Duration,
    disappear_timeout: Duration,
    grace: Duration,
    poll_interval: Duration,
}

impl CompletionDetector {
    pub fn new(indicator: impl Into<String>, timing: &TimingConfig) -> Self {
        Self {
            indicator: indicator.into(),
            appear_timeout: timing.appear_timeout(),
            disappear_timeout: timing.disappear_timeout(),
            grace: timing.grace(),
            poll_interval: timing.poll_interval(),
        }
    }

    pub fn from_config(selectors: &SelectorConfig, timing: &TimingConfig) -> Self {
        Self::new(selectors.thinking_indicator.clone(), timing)
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    /// Wait for the answer to finish rendering. Always returns.
    pub async fn await_completion(&self, page: &dyn ChatPage) -> CompletionReport {
        let started = Instant::now();

        let appeared = self
            .poll_until(page, self.appear_timeout, |s| s == IndicatorState::Visible)
            .await;
        if appeared {
            debug!(target: "chatprobe.completion", indicator = %self.indicator, "thinking indicator appeared");
        } else {
            info!(
                target: "chatprobe.completion",
                indicator = %self.indicator,
                timeout_ms = self.appear_timeout.as_millis() as u64,
                "thinking indicator not detected"
            );
        }

        let settled = self
            .poll_until(page, self.disappear_timeout, IndicatorState::is_settled)
            .await;
        if !settled {
            warn!(
                target: "chatprobe.completion",
                indicator = %self.indicator,
                timeout_ms = self.disappear_timeout.as_millis() as u64,
                "thinking indicator still visible; reading the page anyway"
            );
        }

        if !self.grace.is_zero() {
            sleep(self.grace).await;
        }

        let report = CompletionReport {
            appeared,
            settled,
            waited_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            target: "chatprobe.completion",
            appeared,
            settled,
            waited_ms = report.waited_ms,
            "completion wait finished"
        );
        report
    }

    /// Poll until `done` holds for the observed state or `timeout` elapses.
    /// Probe errors count as "not yet".
    async fn poll_until(
        &self,
        page: &dyn ChatPage,
        timeout: Duration,
        done: impl Fn(IndicatorState) -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match page.indicator_state(&self.indicator).await {
                Ok(state) if done(state) => return true,
                Ok(state) => trace!(target: "chatprobe.completion", ?state, "indicator poll"),
                Err(e) => debug!(target: "chatprobe.completion", error = %e, "indicator poll failed"),
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}
