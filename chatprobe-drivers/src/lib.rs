//! Driver layer for browser automation.
//!
//! This crate exposes the page abstraction the extraction pipeline talks to,
//! and the WebDriver-backed implementation used against the real chat page.
//!
//! - [`chat_browser::page::ChatPage`]: the narrow page surface (query, fill, click, indicator state)
//! - [`chat_browser::page::PageLauncher`]: opens one page per question
//! - [`chat_browser::driver::WebDriverLauncher`]: `fantoccini` client wrapper
//! - [`chat_browser::stealth`]: browser profile arguments and JS evasions
//! - `fixture` (feature `fixture`): an HTML-backed page for tests
pub mod chat_browser;

#[cfg(feature = "fixture")]
pub mod fixture;

pub use chat_browser::driver::WebDriverLauncher;
pub use chat_browser::page::{ChatPage, ElementSnapshot, IndicatorState, PageLauncher};
