//! Crawl product listing pages and append the products to an import sheet.
//!
//! Start pages are treated as listings: their product cards are followed to
//! product pages, whose details are scraped into [`ProductRecord`]s. After
//! the crawl the records are appended below the last used row of an xlsx
//! [`Workbook`], matched to its header row by column name.
//!
//! Pages are loaded through the [`browser::Browser`] trait. [`HttpBrowser`]
//! fetches plain markup; with the `chromium` feature `ChromiumBrowser`
//! drives a headless Chromium.
//!
//! Feature Flags:
//! - `chromium`: Enables the Chromium backend.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod listing;
pub mod logging;
pub mod product_details;
pub mod queue;
pub mod sheet;

pub use browser::HttpBrowser;
#[cfg(feature = "chromium")]
pub use browser::ChromiumBrowser;
pub use crawler::{CrawlReport, Crawler, Visit};
use header::{HeaderMap, HeaderValue};
pub use listing::ProductListing;
pub use product_details::ProductRecord;
pub use queue::{PageKind, WorkItem, WorkQueue};
use reqwest::header;
pub use sheet::{SheetTarget, Workbook};
pub use url::Url;

/// Builds the default headers for the client.
fn build_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/118.0",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers
}
