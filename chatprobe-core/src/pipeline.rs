//! End-to-end question flow over one page.
use crate::completion::{CompletionDetector, CompletionReport};
use crate::extract::ResponseExtractor;
use crate::messages::BotMessageReader;
use crate::probe::{probe_selectors, SelectorReport};
use crate::sink::ArtifactSink;
use crate::submit::QuestionSubmitter;
use crate::types::{BotMessage, ResponseResult};
use chatprobe_common::Result;
use chatprobe_config::ChatprobeConfig;
use chatprobe_drivers::{ChatPage, PageLauncher};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub question: String,
    /// Zero-based index of a suggested follow-up question to ask afterwards.
    #[serde(default)]
    pub follow_up: Option<usize>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            follow_up: None,
        }
    }

    pub fn with_follow_up(mut self, index: usize) -> Self {
        self.follow_up = Some(index);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpOutcome {
    pub question: String,
    pub response: ResponseResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskOutcome {
    pub question: String,
    pub response: ResponseResult,
    pub bot_messages: Vec<BotMessage>,
    pub completion: CompletionReport,
    pub follow_up: Option<FollowUpOutcome>,
}

/// Submit, wait, extract; configured once and shared across runs.
#[derive(Debug, Clone)]
pub struct AskPipeline {
    submitter: QuestionSubmitter,
    detector: CompletionDetector,
    extractor: ResponseExtractor,
    messages: BotMessageReader,
    suggested_question: String,
    probe: Vec<String>,
    probe_min_chars: usize,
}

impl AskPipeline {
    pub fn from_config(cfg: &ChatprobeConfig) -> Self {
        let selectors = &cfg.selectors;
        Self {
            submitter: QuestionSubmitter::from_config(selectors),
            detector: CompletionDetector::from_config(selectors, &cfg.timing),
            extractor: ResponseExtractor::from_config(selectors),
            messages: BotMessageReader::from_config(selectors),
            suggested_question: selectors.suggested_question.clone(),
            probe: selectors.probe.clone(),
            probe_min_chars: selectors.probe_min_chars,
        }
    }

    pub fn extractor(&self) -> &ResponseExtractor {
        &self.extractor
    }

    pub fn detector(&self) -> &CompletionDetector {
        &self.detector
    }

    pub fn submitter(&self) -> &QuestionSubmitter {
        &self.submitter
    }

    /// Number of extraction candidates, as reported by the HTTP surface.
    pub fn candidate_count(&self) -> usize {
        self.extractor.candidates().len()
    }

    /// Launch a page, ask `request` on it and close it again.
    pub async fn ask(
        &self,
        launcher: &dyn PageLauncher,
        request: &AskRequest,
        sink: Option<&ArtifactSink>,
    ) -> Result<AskOutcome> {
        let page = launcher.launch().await?;
        let outcome = self.ask_on(page.as_ref(), request, sink).await;
        close(page.as_ref()).await;
        outcome
    }

    /// Ask on an already open page. The page is left open.
    pub async fn ask_on(
        &self,
        page: &dyn ChatPage,
        request: &AskRequest,
        sink: Option<&ArtifactSink>,
    ) -> Result<AskOutcome> {
        info!(target: "chatprobe.pipeline", question = %request.question, "asking");
        let completion = self.submit_and_wait(page, &request.question, sink).await?;

        let response = self.extractor.extract(page).await;
        let bot_messages = self.messages.list_bot_messages(page).await;
        let follow_up = match request.follow_up {
            Some(index) => self.ask_follow_up(page, index).await,
            None => None,
        };

        if let Some(sink) = sink {
            record("response", sink.save_text("response", &response.text));
            record("response_html", sink.save_html("response_html", &response.html));
            record("q_and_a", sink.save_q_and_a(&request.question, &response.text));
            record("bot_messages", sink.save_json("bot_messages", &bot_messages));
            if let Some(f) = &follow_up {
                record("followup_response", sink.save_text("followup_response", &f.response.text));
                record(
                    "followup_response_html",
                    sink.save_html("followup_response_html", &f.response.html),
                );
                record(
                    "followup_q_and_a",
                    sink.save_q_and_a_as("followup_q_and_a", &f.question, &f.response.text),
                );
            }
            save_page(sink, page).await;
        }

        info!(
            target: "chatprobe.pipeline",
            selector = response.selector_used.as_deref().unwrap_or("none"),
            chars = response.text.chars().count(),
            bot_messages = bot_messages.len(),
            "answer extracted"
        );
        Ok(AskOutcome {
            question: request.question.clone(),
            response,
            bot_messages,
            completion,
            follow_up,
        })
    }

    /// Click the `index`th suggested question and read its answer.
    pub async fn ask_follow_up(&self, page: &dyn ChatPage, index: usize) -> Option<FollowUpOutcome> {
        let suggestions = match page.query_all(&self.suggested_question, "").await {
            Ok(found) => found,
            Err(e) => {
                warn!(target: "chatprobe.pipeline", error = %e, "failed to list suggested questions");
                return None;
            }
        };
        let Some(suggestion) = suggestions.get(index) else {
            info!(
                target: "chatprobe.pipeline",
                index,
                available = suggestions.len(),
                "no suggested question at index"
            );
            return None;
        };
        let question = suggestion.text.trim().to_string();
        if let Err(e) = page.click_nth(&self.suggested_question, index).await {
            warn!(target: "chatprobe.pipeline", index, error = %e, "failed to click suggested question");
            return None;
        }
        info!(target: "chatprobe.pipeline", %question, "follow-up question sent");
        self.detector.await_completion(page).await;
        let response = self.extractor.extract(page).await;
        Some(FollowUpOutcome { question, response })
    }

    /// Run the selector diagnostics, optionally after asking `question`.
    pub async fn probe(
        &self,
        launcher: &dyn PageLauncher,
        question: Option<&str>,
        sink: Option<&ArtifactSink>,
    ) -> Result<SelectorReport> {
        let page = launcher.launch().await?;
        let report = self.probe_on(page.as_ref(), question, sink).await;
        close(page.as_ref()).await;
        report
    }

    pub async fn probe_on(
        &self,
        page: &dyn ChatPage,
        question: Option<&str>,
        sink: Option<&ArtifactSink>,
    ) -> Result<SelectorReport> {
        if let Some(question) = question {
            self.submit_and_wait(page, question, sink).await?;
        }
        let report = probe_selectors(page, &self.probe, self.probe_min_chars).await;
        if let Some(sink) = sink {
            record("selector_results", sink.save_json("selector_results", &report));
            save_page(sink, page).await;
        }
        Ok(report)
    }

    async fn submit_and_wait(
        &self,
        page: &dyn ChatPage,
        question: &str,
        sink: Option<&ArtifactSink>,
    ) -> Result<CompletionReport> {
        screenshot(sink, page, "initial").await;
        self.submitter.enter_question(page, question).await?;
        screenshot(sink, page, "question").await;
        self.submitter.send(page).await?;
        let completion = self.detector.await_completion(page).await;
        screenshot(sink, page, "response").await;
        Ok(completion)
    }
}

async fn close(page: &dyn ChatPage) {
    if let Err(e) = page.close().await {
        warn!(target: "chatprobe.pipeline", error = %e, "failed to close page");
    }
}

fn record(kind: &str, saved: Result<PathBuf>) {
    match saved {
        Ok(path) => info!(target: "chatprobe.sink", kind, path = %path.display(), "artifact saved"),
        Err(e) => warn!(target: "chatprobe.sink", kind, error = %e, "failed to save artifact"),
    }
}

async fn screenshot(sink: Option<&ArtifactSink>, page: &dyn ChatPage, kind: &str) {
    let Some(sink) = sink else { return };
    match page.screenshot().await {
        Ok(png) => record(kind, sink.save_png(kind, &png)),
        Err(e) => warn!(target: "chatprobe.sink", kind, error = %e, "screenshot failed"),
    }
}

async fn save_page(sink: &ArtifactSink, page: &dyn ChatPage) {
    match page.content().await {
        Ok(html) => record("page", sink.save_html("page", &html)),
        Err(e) => warn!(target: "chatprobe.sink", error = %e, "failed to read page html"),
    }
}
