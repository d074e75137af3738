use crate::chat_browser::page::{ChatPage, ElementSnapshot, IndicatorState};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use fantoccini::{Client, Locator};
use serde_json::{json, Value};
use std::time::Duration;

/// WebDriver `Enter` key code point.
const ENTER_KEY: &str = "\u{E007}";

const SNAPSHOT_FN: &str = r#"
    const snap = (el, interactive) => ({
        id: el.id || null,
        text: el.textContent || '',
        html: el.innerHTML || '',
        has_interactive: interactive ? el.querySelector(interactive) !== null : false,
    });
"#;

/// [`ChatPage`] over a live `fantoccini` session.
pub struct WebDriverPage {
    client: Client,
    action_timeout: Duration,
}

impl WebDriverPage {
    pub fn new(client: Client, action_timeout: Duration) -> Self {
        Self {
            client,
            action_timeout,
        }
    }

    async fn run(&self, body: &str, args: Vec<Value>) -> Result<Value> {
        let script = format!("{SNAPSHOT_FN}\n{body}");
        self.client
            .execute(&script, args)
            .await
            .map_err(anyhow::Error::from)
    }
}

#[async_trait]
impl ChatPage for WebDriverPage {
    async fn query_first(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        let v = self
            .run(
                "const el = document.querySelector(arguments[0]);
                 return el ? snap(el, '') : null;",
                vec![json!(selector)],
            )
            .await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn query_all(&self, selector: &str, interactive: &str) -> Result<Vec<ElementSnapshot>> {
        let v = self
            .run(
                "return Array.from(document.querySelectorAll(arguments[0]))
                     .map(el => snap(el, arguments[1]));",
                vec![json!(selector), json!(interactive)],
            )
            .await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn query_scoped(&self, outer: &str, inner: &str) -> Result<Vec<ElementSnapshot>> {
        let v = self
            .run(
                "return Array.from(document.querySelectorAll(arguments[0])).map(el => {
                     const child = el.querySelector(arguments[1]);
                     return {
                         id: el.id || null,
                         text: child ? (child.textContent || '') : '',
                         html: child ? (child.innerHTML || '') : '',
                         has_interactive: false,
                     };
                 });",
                vec![json!(outer), json!(inner)],
            )
            .await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .client
            .wait()
            .at_most(self.action_timeout)
            .for_element(Locator::Css(selector))
            .await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<()> {
        // wait for the first match so freshly rendered controls are found
        self.client
            .wait()
            .at_most(self.action_timeout)
            .for_element(Locator::Css(selector))
            .await?;
        let mut elements = self.client.find_all(Locator::Css(selector)).await?;
        if index >= elements.len() {
            return Err(anyhow!(
                "selector {selector:?} matched {} elements, index {index} requested",
                elements.len()
            ));
        }
        elements.swap_remove(index).click().await?;
        Ok(())
    }

    async fn press_enter(&self) -> Result<()> {
        let focused = self.client.active_element().await?;
        focused.send_keys(ENTER_KEY).await?;
        Ok(())
    }

    async fn indicator_state(&self, selector: &str) -> Result<IndicatorState> {
        let v = self
            .client
            .execute(
                "const el = document.querySelector(arguments[0]);
                 if (!el) return 'absent';
                 const style = getComputedStyle(el);
                 if (el.style.display === 'none' || style.display === 'none') return 'hidden';
                 const r = el.getBoundingClientRect();
                 // fixed elements have no offsetParent while still on screen
                 const detached = el.offsetParent === null && style.position !== 'fixed';
                 if (detached || (r.width === 0 && r.height === 0)) return 'collapsed';
                 return 'visible';",
                vec![json!(selector)],
            )
            .await?;
        Ok(serde_json::from_value(v)?)
    }

    async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::from)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await.map_err(anyhow::Error::from)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().close().await?;
        Ok(())
    }
}
