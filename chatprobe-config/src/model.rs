use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Effective configuration after every source has been merged.
///
/// Every section falls back to its compiled default, so an empty YAML file
/// (or no file at all) yields a working configuration for the M5Stack chat
/// assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatprobeConfig {
    pub version: Option<String>,
    pub target: TargetConfig,
    pub selectors: SelectorConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl ChatprobeConfig {
    /// Render the configuration as YAML, e.g. for `chatprobe config`.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.target.url.trim().is_empty() {
            return Err("target.url must not be empty".into());
        }
        if self.selectors.inputs.is_empty() {
            return Err("selectors.inputs must list at least one selector".into());
        }
        if self.selectors.submit_buttons.is_empty() && !self.selectors.enter_fallback {
            return Err(
                "selectors.submit_buttons is empty and enter_fallback is disabled".into(),
            );
        }
        if self.selectors.candidates.is_empty() {
            return Err("selectors.candidates must list at least one selector".into());
        }
        if let Some(bad) = self
            .selectors
            .candidates
            .iter()
            .find(|c| c.selector.trim().is_empty())
        {
            return Err(format!(
                "selectors.candidates contains an empty selector (min_chars={})",
                bad.min_chars
            ));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err("timing.poll_interval_ms must be greater than zero".into());
        }
        Ok(())
    }
}

/// Where and how the browser session is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Chat page to open.
    pub url: String,
    /// WebDriver endpoint (Chromedriver by default).
    pub webdriver_url: String,
    pub headless: bool,
    /// Browser UI language, e.g. `ja-JP`.
    pub locale: String,
    pub user_agent: String,
    pub viewport: Viewport,
    /// Apply the `navigator.webdriver` evasion after navigation.
    pub stealth: bool,
    /// Upper bound for `document.readyState == "complete"` after navigation.
    pub page_ready_timeout_ms: u64,
    /// Upper bound for a single fill/click to find its element.
    pub action_timeout_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: "https://chat.m5stack.com/".into(),
            webdriver_url: "http://localhost:9515".into(),
            headless: true,
            locale: "ja-JP".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into(),
            viewport: Viewport::default(),
            stealth: true,
            page_ready_timeout_ms: 30_000,
            action_timeout_ms: 5_000,
        }
    }
}

impl TargetConfig {
    pub fn page_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.page_ready_timeout_ms)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// One extraction candidate: a CSS selector and the text length it must
/// exceed to count as an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateConfig {
    pub selector: String,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

impl CandidateConfig {
    pub fn new(selector: impl Into<String>, min_chars: usize) -> Self {
        Self {
            selector: selector.into(),
            min_chars,
        }
    }
}

fn default_min_chars() -> usize {
    DEFAULT_ANSWER_MIN_CHARS
}

/// Minimum answer length used by the extractor candidates.
pub const DEFAULT_ANSWER_MIN_CHARS: usize = 100;
/// Minimum answer length used by the selector probe.
pub const DEFAULT_PROBE_MIN_CHARS: usize = 50;

/// Selector lists describing the (undocumented) chat page markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Question input fields, most specific first.
    pub inputs: Vec<String>,
    /// Submit buttons, most specific first.
    pub submit_buttons: Vec<String>,
    /// Send an Enter keypress when no submit button could be clicked.
    pub enter_fallback: bool,
    /// Element shown while the assistant is generating.
    pub thinking_indicator: String,
    /// Placeholder text the assistant renders while thinking.
    pub thinking_token: String,
    /// Ordered extraction candidates.
    pub candidates: Vec<CandidateConfig>,
    /// Bot-message containers tried when every candidate misses.
    pub generic_containers: Vec<String>,
    /// Block elements scanned as the last resort.
    pub block_elements: String,
    /// Elements that disqualify a block from the last-resort scan.
    pub interactive_elements: String,
    pub block_min_chars: usize,
    /// One element per assistant chat bubble.
    pub bot_message: String,
    /// Text element inside a bot message bubble.
    pub bot_message_text: String,
    pub suggested_question: String,
    /// Selectors reported on by `chatprobe probe`.
    pub probe: Vec<String>,
    pub probe_min_chars: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let candidates = [
            ".message.bot-message:last-child .message-text",
            ".message.bot-message:nth-last-child(1) .message-text",
            ".message.bot-message:nth-last-child(2) .message-text",
            ".message.bot-message .message-text",
            ".message-text",
            ".message",
            ".chat-message",
            ".chat-message-content",
            ".response",
            ".ai-response",
            ".chat-response",
            "div[role=\"presentation\"]",
            ".message-list .message:last-child",
            ".message-list .message:nth-last-child(1)",
            ".message-list .message:nth-last-child(2)",
        ]
        .into_iter()
        .map(|s| CandidateConfig::new(s, DEFAULT_ANSWER_MIN_CHARS))
        .collect();

        let probe = [
            ".message.bot-message:last-child .message-text",
            ".message.bot-message:nth-last-child(1) .message-text",
            ".message.bot-message:nth-last-child(2) .message-text",
            ".chat-message-bot:last-child .chat-message-content",
            ".chat-message-bot:last-child",
            ".bot-message:last-child",
            ".ai-message:last-child",
            ".message.bot-message .message-text",
            ".message-text",
            ".message",
            ".chat-message",
            ".chat-message-content",
            ".response",
            ".ai-response",
            ".chat-response",
            "div[role=\"presentation\"]",
            ".message-list .message:last-child",
            ".message-list .message:nth-last-child(1)",
            ".message-list .message:nth-last-child(2)",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            inputs: strings(&[
                "textarea[placeholder=\"Enterキーで送信（Shift+Enterで改行）\"]",
                "textarea[placeholder=\"Send a message\"]",
                ".chat-input textarea",
                "textarea",
            ]),
            // known send buttons only; Enter covers the rest
            submit_buttons: strings(&[
                "textarea[placeholder=\"Enterキーで送信（Shift+Enterで改行）\"] + button",
                "button[aria-label=\"Send message\"]",
            ]),
            enter_fallback: true,
            thinking_indicator: ".thinking-bar".into(),
            thinking_token: "考え中".into(),
            candidates,
            generic_containers: strings(&[
                ".message.bot-message .message-text",
                ".bot-message",
                ".ai-message",
                ".chat-message-bot",
                "[data-message-author-role=\"assistant\"]",
            ]),
            block_elements: "div, p, section, article, li".into(),
            interactive_elements: "button, input, textarea, select, a[href]".into(),
            block_min_chars: DEFAULT_ANSWER_MIN_CHARS,
            bot_message: ".message.bot-message".into(),
            bot_message_text: ".message-text".into(),
            suggested_question: ".suggested-question".into(),
            probe,
            probe_min_chars: DEFAULT_PROBE_MIN_CHARS,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Completion-detector bounds, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub appear_timeout_ms: u64,
    pub disappear_timeout_ms: u64,
    pub grace_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            appear_timeout_ms: 10_000,
            disappear_timeout_ms: 90_000,
            grace_ms: 5_000,
            poll_interval_ms: 250,
        }
    }
}

impl TimingConfig {
    pub fn appear_timeout(&self) -> Duration {
        Duration::from_millis(self.appear_timeout_ms)
    }

    pub fn disappear_timeout(&self) -> Duration {
        Duration::from_millis(self.disappear_timeout_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Artifact output (screenshots, extracted text, HTML and JSON dumps).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Write artifacts for CLI runs.
    pub artifacts: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            artifacts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// Encoding of log events, in the file and on stderr alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory; `None` defers to `CHATPROBE_LOG_DIR` and then the
    /// per-user data directory. A leading `~` is expanded.
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    /// Duplicate events to stderr.
    pub stderr: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: true,
            filter: "info".into(),
        }
    }
}
