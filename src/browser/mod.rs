//! Browser automation seam.
//!
//! The crawler only needs a handful of page operations: open a page, navigate,
//! wait for a selector, click a toggle and read back the rendered markup.
//! Field extraction itself always runs on the markup with `scraper`, so every
//! backend only has to deliver HTML.

mod http;
mod snapshot;

#[cfg(feature = "chromium")]
mod chromium;

use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use url::Url;

#[cfg(feature = "chromium")]
pub use chromium::{ChromiumBrowser, ChromiumPage};
pub use http::{HttpBrowser, HttpPage};
pub use snapshot::Snapshot;

/// Timeout used by waits that do not specify their own bound.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether rendered `text` contains `label`, ignoring case.
///
/// ```rust
/// use catalog_crawler::browser::has_text;
///
/// assert!(has_text("  ATTRIBUTES ", "Attributes"));
/// assert!(!has_text("Documents", "Attributes"));
/// ```
pub fn has_text(text: &str, label: &str) -> bool {
    text.to_lowercase().contains(&label.to_lowercase())
}

/// A browser session able to hand out fresh pages.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Page type produced by this browser.
    type Page: Page;

    /// Opens a fresh, blank page.
    async fn new_page(&self) -> Result<Self::Page>;

    /// Shuts the session down.
    async fn close(self) -> Result<()>;
}

/// A single page (tab) of a browser session.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates to `url` and waits for the document to load.
    async fn goto(&mut self, url: &Url) -> Result<()>;

    /// URL of the currently loaded document.
    async fn url(&self) -> Result<Url>;

    /// Waits until an element matching the CSS `selector` exists, failing
    /// once `timeout` has elapsed.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Clicks the first `target` inside the first `container` whose text
    /// contains `label` in any case. Returns `false` when no such element exists.
    async fn click_within(&self, container: &str, label: &str, target: &str) -> Result<bool>;

    /// Current markup of the document.
    async fn content(&self) -> Result<String>;

    /// Releases the page.
    async fn close(self) -> Result<()>;
}
