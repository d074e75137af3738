use chatprobe_config::TargetConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Snapshot of user agent, viewport, and locale characteristics for a session.
pub struct BrowserProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    /// Most preferred first, e.g. `["ja-JP", "ja"]`.
    pub languages: Vec<String>,
}

impl BrowserProfile {
    pub fn from_target(target: &TargetConfig) -> Self {
        let mut languages = vec![target.locale.clone()];
        if let Some((base, _)) = target.locale.split_once('-') {
            languages.push(base.to_string());
        }
        Self {
            user_agent: target.user_agent.clone(),
            viewport: (target.viewport.width, target.viewport.height),
            languages,
        }
    }
}

/// Construct Chrome command‑line arguments for a session profile.
pub fn build_browser_arguments(profile: &BrowserProfile, headless: bool) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!("--window-size={},{}", profile.viewport.0, profile.viewport.1),
        format!("--lang={}", profile.languages.join(",")),
    ];
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions applied after navigation to reduce automation signals.
pub struct StealthScripts;

impl StealthScripts {
    /// Hide `navigator.webdriver` and pin `navigator.languages`.
    pub fn core_evasions(languages: &[String]) -> String {
        let langs = serde_json::to_string(languages).unwrap_or_else(|_| "[]".to_string());
        format!(
            r#"
            Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
            Object.defineProperty(navigator, 'languages', {{ get: () => {langs} }});
            if (!window.chrome) window.chrome = {{ runtime: {{}} }};
        "#
        )
    }
}
