use crate::chat_browser::{
    page::{ChatPage, PageLauncher},
    stealth::{build_browser_arguments, BrowserProfile, StealthScripts},
    WebDriverPage,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chatprobe_config::TargetConfig;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use url::Url;
use webdriver::capabilities::Capabilities;

const READY_POLL: Duration = Duration::from_millis(200);

/// Thin wrapper around a `fantoccini` WebDriver client configured from
/// [`TargetConfig`].
pub struct ChatDriver {
    pub client: Client,
    pub profile: BrowserProfile,
    target: TargetConfig,
}

impl ChatDriver {
    /// Create a new driver connected to the configured WebDriver service
    /// (Chromedriver at `http://localhost:9515` by default).
    pub async fn connect(target: &TargetConfig) -> Result<Self> {
        let profile = BrowserProfile::from_target(target);

        let mut chrome_opts = HashMap::new();
        chrome_opts.insert(
            "args".to_string(),
            json!(build_browser_arguments(&profile, target.headless)),
        );
        chrome_opts.insert(
            "prefs".to_string(),
            json!({ "intl.accept_languages": profile.languages.join(",") }),
        );

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        info!(
            target: "chatprobe.driver",
            webdriver = %target.webdriver_url,
            headless = target.headless,
            "connecting to WebDriver"
        );
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&target.webdriver_url)
            .await
            .with_context(|| format!("failed to connect to WebDriver at {}", target.webdriver_url))?;

        Ok(Self {
            client,
            profile,
            target: target.clone(),
        })
    }

    /// Navigate to `url`, wait for the document to finish loading and apply
    /// the evasion script.
    pub async fn goto(&self, url: &Url) -> Result<()> {
        self.client
            .goto(url.as_str())
            .await
            .with_context(|| format!("navigation to {url} failed"))?;

        self.wait_until_ready(self.target.page_ready_timeout()).await;

        if self.target.stealth {
            self.client
                .execute(&StealthScripts::core_evasions(&self.profile.languages), vec![])
                .await?;
        }
        Ok(())
    }

    /// Poll `document.readyState` until `complete`; a timeout is logged, not fatal.
    async fn wait_until_ready(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .client
                .execute("return document.readyState;", vec![])
                .await
            {
                Ok(state) if state.as_str() == Some("complete") => return,
                Ok(state) => debug!(target: "chatprobe.driver", ?state, "document not ready"),
                Err(e) => debug!(target: "chatprobe.driver", error = %e, "readyState probe failed"),
            }
            if Instant::now() >= deadline {
                warn!(
                    target: "chatprobe.driver",
                    timeout_ms = timeout.as_millis() as u64,
                    "document did not reach readyState=complete; continuing"
                );
                return;
            }
            sleep(READY_POLL).await;
        }
    }

    /// Wrap the session as a [`ChatPage`].
    pub fn into_page(self) -> WebDriverPage {
        WebDriverPage::new(self.client, self.target.action_timeout())
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Launches one WebDriver session per question on the configured chat page.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    target: TargetConfig,
    url: Url,
}

impl WebDriverLauncher {
    pub fn new(target: TargetConfig) -> Result<Self> {
        let url = Url::parse(&target.url)
            .map_err(|e| anyhow!("invalid target url {:?}: {e}", target.url))?;
        Ok(Self { target, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl PageLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn ChatPage>> {
        let driver = ChatDriver::connect(&self.target).await?;
        info!(target: "chatprobe.driver", url = %self.url, "opening chat page");
        if let Err(e) = driver.goto(&self.url).await {
            // the session is ours until the page is handed out
            if let Err(close_err) = driver.close().await {
                warn!(target: "chatprobe.driver", error = %close_err, "failed to close session after navigation error");
            }
            return Err(e);
        }
        Ok(Box::new(driver.into_page()))
    }
}
