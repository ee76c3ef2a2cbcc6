use eyre::{bail, eyre, Result};
use scraper::{Html, Selector};
use url::Url;

use super::has_text;

/// A loaded document that is not rendered by a browser engine.
///
/// Selector checks run against the markup as delivered; there is nothing to
/// wait for, so a selector is either present right away or never.
#[derive(Debug, Clone)]
pub struct Snapshot {
    url: Url,
    html: String,
}

impl Snapshot {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Whether any element matches `selector`.
    pub fn contains(&self, selector: &str) -> Result<bool> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    /// Fails unless `selector` matches.
    pub fn require(&self, selector: &str) -> Result<()> {
        if !self.contains(selector)? {
            bail!("Selector `{selector}` not found on {}", self.url);
        }
        Ok(())
    }

    /// Whether a `target` exists inside a `container` carrying `label`.
    ///
    /// Static markup already holds collapsed panels, so "clicking" only has
    /// to confirm the toggle is there.
    pub fn has_toggle(&self, container: &str, label: &str, target: &str) -> Result<bool> {
        let container = parse_selector(container)?;
        let target = parse_selector(target)?;
        let document = Html::parse_document(&self.html);
        let found = document
            .select(&container)
            .find(|elem| has_text(&elem.text().collect::<String>(), label))
            .and_then(|elem| elem.select(&target).next())
            .is_some();
        Ok(found)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| eyre!("Invalid selector `{selector}`: {e:?}"))
}
