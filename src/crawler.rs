//! Breadth-first crawl over listing and product pages.

use eyre::Result;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{Browser, Page};
use crate::listing::ProductListing;
use crate::product_details::ProductRecord;
use crate::queue::{PageKind, WorkItem, WorkQueue};

/// Outcome of visiting one queued page.
#[derive(Debug)]
pub enum Visit {
    /// A listing page and the product pages it links to.
    Listed(ProductListing),
    /// A product page and its scraped details.
    Scraped(ProductRecord),
    /// A listing page beyond the depth limit; not opened.
    Skipped,
}

/// What a finished crawl produced.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Scraped products, in visiting order.
    pub records: Vec<ProductRecord>,
    /// Pages opened.
    pub visited: usize,
    /// Product pages queued from listings.
    pub discovered: usize,
    /// Pages whose processing failed.
    pub failed: usize,
}

/// Drives one browser session through the work queue, one page at a time.
pub struct Crawler<B: Browser> {
    browser: B,
    queue: WorkQueue,
    max_depth: u32,
}

impl<B: Browser> Crawler<B> {
    /// Listing pages at `max_depth` or deeper are not expanded.
    pub fn new(browser: B, max_depth: u32) -> Self {
        Self {
            browser,
            queue: WorkQueue::new(),
            max_depth,
        }
    }

    /// Queues start pages as listings.
    pub fn seed(&mut self, urls: impl IntoIterator<Item = Url>) {
        self.queue.seed(urls);
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Visits queued pages until none are left, then closes the browser.
    ///
    /// A failing page is logged and skipped; it never stops the crawl.
    pub async fn run(mut self) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();

        while let Some(item) = self.queue.pop() {
            match self.visit(&item).await {
                Ok(Visit::Listed(listing)) => {
                    report.visited += 1;
                    let urls = listing.product_urls;
                    info!(url = %listing.page_url, count = urls.len(), "Queued product pages");
                    report.discovered += urls.len();
                    for url in urls {
                        self.queue.push(WorkItem::detail(url, item.depth));
                    }
                }
                Ok(Visit::Scraped(record)) => {
                    report.visited += 1;
                    report.records.push(record);
                }
                Ok(Visit::Skipped) => {
                    debug!(url = %item.url, depth = item.depth, "Depth limit reached");
                }
                Err(e) => {
                    report.visited += 1;
                    report.failed += 1;
                    error!(url = %item.url, "Error processing page: {e:#}");
                }
            }
        }

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {e:#}");
        }

        info!(
            visited = report.visited,
            scraped = report.records.len(),
            failed = report.failed,
            "Crawl finished"
        );
        Ok(report)
    }

    /// Opens a fresh page for `item`; the page is closed whatever happens.
    async fn visit(&self, item: &WorkItem) -> Result<Visit> {
        if item.kind == PageKind::Listing && item.depth >= self.max_depth {
            return Ok(Visit::Skipped);
        }

        let mut page = self.browser.new_page().await?;
        let visit = process(&mut page, item).await;
        if let Err(e) = page.close().await {
            warn!(url = %item.url, "Failed to close page: {e:#}");
        }
        visit
    }
}

async fn process<P: Page>(page: &mut P, item: &WorkItem) -> Result<Visit> {
    page.goto(&item.url).await?;
    match item.kind {
        PageKind::Listing => {
            let listing = ProductListing::scrape(&*page).await?;
            Ok(Visit::Listed(listing))
        }
        PageKind::Detail => {
            let record = ProductRecord::scrape(&*page, &item.url).await?;
            Ok(Visit::Scraped(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use eyre::{eyre, Result};

    use super::*;
    use crate::browser::{Snapshot, DEFAULT_TIMEOUT};
    use crate::listing::PRODUCT_CARD_MARKER;
    use crate::product_details::DETAIL_TIMEOUT;

    #[derive(Default)]
    struct Fixtures {
        pages: HashMap<String, String>,
        opened: AtomicUsize,
        closed: AtomicUsize,
        waits: Mutex<Vec<(String, Duration)>>,
    }

    struct FixtureBrowser(Arc<Fixtures>);

    struct FixturePage {
        fixtures: Arc<Fixtures>,
        current: Option<Snapshot>,
    }

    impl FixturePage {
        fn current(&self) -> Result<&Snapshot> {
            self.current.as_ref().ok_or_else(|| eyre!("nothing loaded"))
        }
    }

    #[async_trait]
    impl Browser for FixtureBrowser {
        type Page = FixturePage;

        async fn new_page(&self) -> Result<FixturePage> {
            self.0.opened.fetch_add(1, Ordering::SeqCst);
            Ok(FixturePage {
                fixtures: Arc::clone(&self.0),
                current: None,
            })
        }

        async fn close(self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Page for FixturePage {
        async fn goto(&mut self, url: &Url) -> Result<()> {
            let html = self
                .fixtures
                .pages
                .get(url.as_str())
                .ok_or_else(|| eyre!("404 {url}"))?;
            self.current = Some(Snapshot::new(url.clone(), html.clone()));
            Ok(())
        }

        async fn url(&self) -> Result<Url> {
            Ok(self.current()?.url().clone())
        }

        async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
            self.fixtures
                .waits
                .lock()
                .unwrap()
                .push((selector.to_string(), timeout));
            self.current()?.require(selector)
        }

        async fn click_within(&self, container: &str, label: &str, target: &str) -> Result<bool> {
            self.current()?.has_toggle(container, label, target)
        }

        async fn content(&self) -> Result<String> {
            Ok(self.current()?.html().to_string())
        }

        async fn close(self) -> Result<()> {
            self.fixtures.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const LISTING: &str = r#"
        <div data-test-selector="productListProductCard"><a href="/p/ok">ok</a></div>
        <div data-test-selector="productListProductCard"><a href="/p/missing">missing</a></div>
        <div data-test-selector="productListProductCard"><a href="/p/broken">broken</a></div>
    "#;

    fn fixtures() -> Arc<Fixtures> {
        let mut pages = HashMap::new();
        pages.insert("https://shop.example.com/list".to_string(), LISTING.to_string());
        pages.insert(
            "https://shop.example.com/p/ok".to_string(),
            r#"<main><h2 data-test-selector="productDetails_productDescription">Drill</h2></main>"#
                .to_string(),
        );
        pages.insert(
            "https://shop.example.com/p/broken".to_string(),
            "<div>no main container</div>".to_string(),
        );
        Arc::new(Fixtures {
            pages,
            ..Default::default()
        })
    }

    fn seed() -> Url {
        Url::parse("https://shop.example.com/list").unwrap()
    }

    #[tokio::test]
    async fn failing_pages_do_not_stop_the_crawl() {
        let fixtures = fixtures();
        let mut crawler = Crawler::new(FixtureBrowser(Arc::clone(&fixtures)), 1);
        crawler.seed([seed()]);

        let report = crawler.run().await.unwrap();

        assert_eq!(report.discovered, 3);
        assert_eq!(report.visited, 4);
        assert_eq!(report.failed, 2);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].name.as_deref(), Some("Drill"));
    }

    #[tokio::test]
    async fn every_opened_page_is_closed() {
        let fixtures = fixtures();
        let mut crawler = Crawler::new(FixtureBrowser(Arc::clone(&fixtures)), 1);
        crawler.seed([seed()]);
        crawler.run().await.unwrap();

        assert_eq!(fixtures.opened.load(Ordering::SeqCst), 4);
        assert_eq!(fixtures.closed.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn listings_at_depth_limit_are_not_opened() {
        let fixtures = fixtures();
        let mut crawler = Crawler::new(FixtureBrowser(Arc::clone(&fixtures)), 0);
        crawler.seed([seed()]);
        assert_eq!(crawler.queue().len(), 1);

        let report = crawler.run().await.unwrap();

        assert_eq!(report.visited, 0);
        assert!(report.records.is_empty());
        assert_eq!(fixtures.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listing_and_detail_waits_use_their_timeouts() {
        let fixtures = fixtures();
        let mut crawler = Crawler::new(FixtureBrowser(Arc::clone(&fixtures)), 1);
        crawler.seed([seed()]);
        crawler.run().await.unwrap();

        let waits = fixtures.waits.lock().unwrap();
        assert_eq!(waits[0], (PRODUCT_CARD_MARKER.to_string(), DEFAULT_TIMEOUT));
        assert_eq!(waits[1], ("main".to_string(), DETAIL_TIMEOUT));
        // ok: root and attributes toggle; missing: never loads; broken: root only.
        assert_eq!(waits.len(), 4);
        assert!(waits[1..].iter().all(|(_, timeout)| *timeout == DETAIL_TIMEOUT));
    }
}
