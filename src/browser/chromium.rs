use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use eyre::{bail, eyre, Result, WrapErr};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use super::{has_text, Browser, Page};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Headless Chromium driven over the DevTools protocol.
pub struct ChromiumBrowser {
    browser: Mutex<CdpBrowser>,
    handler: JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Starts a Chromium process; `headless = false` opens a visible window.
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(|e| eyre!(e))?;
        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .wrap_err("Failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {e}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
        })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn new_page(&self) -> Result<ChromiumPage> {
        let page = self.browser.lock().await.new_page("about:blank").await?;
        Ok(ChromiumPage { page })
    }

    async fn close(self) -> Result<()> {
        let mut browser = self.browser.into_inner();
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            warn!("Chromium did not exit cleanly: {e}");
        }
        self.handler.abort();
        Ok(())
    }
}

/// A Chromium tab.
pub struct ChromiumPage {
    page: chromiumoxide::Page,
}

#[async_trait]
impl Page for ChromiumPage {
    async fn goto(&mut self, url: &Url) -> Result<()> {
        self.page
            .goto(url.as_str())
            .await
            .wrap_err_with(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn url(&self) -> Result<Url> {
        let current = self
            .page
            .url()
            .await?
            .ok_or_else(|| eyre!("Page has no URL"))?;
        Ok(Url::parse(&current)?)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let found = tokio::time::timeout(timeout, async {
            loop {
                if !self.page.find_elements(selector).await?.is_empty() {
                    return Ok::<_, eyre::Report>(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        match found {
            Ok(result) => result,
            Err(_) => bail!("Timed out after {timeout:?} waiting for `{selector}`"),
        }
    }

    async fn click_within(&self, container: &str, label: &str, target: &str) -> Result<bool> {
        for elem in self.page.find_elements(container).await? {
            let text = elem.inner_text().await?.unwrap_or_default();
            if !has_text(&text, label) {
                continue;
            }
            let Some(button) = elem.find_elements(target).await?.into_iter().next() else {
                return Ok(false);
            };
            button.click().await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
