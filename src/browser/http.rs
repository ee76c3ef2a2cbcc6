use std::time::Duration;

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::{Browser, Page, Snapshot};

/// Plain HTTP backend: pages are fetched with `reqwest` and never rendered.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    /// Builds a client carrying the crate's browser-like default headers.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .default_headers(crate::build_headers())
            .timeout(super::DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    type Page = HttpPage;

    async fn new_page(&self) -> Result<HttpPage> {
        Ok(HttpPage {
            client: self.client.clone(),
            document: None,
        })
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}

/// A page of [`HttpBrowser`]; holds the last fetched document.
#[derive(Debug)]
pub struct HttpPage {
    client: Client,
    document: Option<Snapshot>,
}

impl HttpPage {
    fn document(&self) -> Result<&Snapshot> {
        self.document
            .as_ref()
            .ok_or_else(|| eyre!("No document loaded"))
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&mut self, url: &Url) -> Result<()> {
        let response = self
            .client
            .get(url.to_owned())
            .send()
            .await
            .wrap_err_with(|| format!("Failed to fetch {url}"))?
            .error_for_status()?;
        // Redirects decide which origin relative links resolve against.
        let final_url = response.url().to_owned();
        let body = response.text().await?;
        debug!(url = %final_url, bytes = body.len(), "fetched page");
        self.document = Some(Snapshot::new(final_url, body));
        Ok(())
    }

    async fn url(&self) -> Result<Url> {
        Ok(self.document()?.url().to_owned())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.document()?.require(selector)
    }

    async fn click_within(&self, container: &str, label: &str, target: &str) -> Result<bool> {
        self.document()?.has_toggle(container, label, target)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.document()?.html().to_owned())
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }
}
