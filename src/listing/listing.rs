use std::sync::LazyLock;

use eyre::{bail, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::browser::{Page, DEFAULT_TIMEOUT};

/// Present on every product card of a listing page.
pub const PRODUCT_CARD_MARKER: &str = r#"[data-test-selector*="productListProductCard"]"#;

/// Layout variant that repeats the cards of the main grid.
const NARROW_CARD_LIST: &str = "cardListProductsNarrow";

static CARD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[data-test-selector^="productListProductCard"]"#)
        .expect("static selector")
});
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("static selector"));

#[derive(Debug)]
/// Product links found on one listing page.
///
/// Use `ProductListing::scrape` on a navigated page to build it.
pub struct ProductListing {
    /// URL of the listing page.
    pub page_url: Url,
    /// Absolute product page URLs, in document order.
    pub product_urls: Vec<Url>,
}

impl ProductListing {
    /// Waits for the product cards of `page` and collects their links.
    pub async fn scrape<P: Page>(page: &P) -> Result<Self> {
        page.wait_for(PRODUCT_CARD_MARKER, DEFAULT_TIMEOUT).await?;
        let page_url = page.url().await?;
        let body = page.content().await?;
        Self::parse(&body, page_url)
    }

    /// Collects card links from listing markup, resolved against the
    /// scheme and host of `page_url`.
    pub fn parse(html: &str, page_url: Url) -> Result<Self> {
        let origin = page_url.origin();
        if !origin.is_tuple() {
            bail!("{page_url} has no host to resolve product links against");
        }
        let base = Url::parse(&origin.ascii_serialization())?;

        let document = Html::parse_document(html);
        let product_urls = document
            .select(&CARD)
            .filter(|card| !in_narrow_list(*card))
            .filter_map(|card| {
                let Some(href) = card
                    .select(&LINK)
                    .next()
                    .and_then(|link| link.value().attr("href"))
                else {
                    warn!(page = %page_url, "Product card without a link");
                    return None;
                };
                match base.join(href) {
                    Ok(url) if url.origin() == base.origin() => Some(url),
                    Ok(url) => {
                        warn!(page = %page_url, %url, "Skipping product link to another site");
                        None
                    }
                    Err(e) => {
                        warn!(page = %page_url, href, "Unresolvable product link: {e}");
                        None
                    }
                }
            })
            .collect();

        Ok(ProductListing {
            page_url,
            product_urls,
        })
    }
}

/// Whether the card or one of its ancestors is the narrow card list.
fn in_narrow_list(card: ElementRef) -> bool {
    std::iter::once(card)
        .chain(card.ancestors().filter_map(ElementRef::wrap))
        .any(|elem| elem.value().attr("data-test-selector") == Some(NARROW_CARD_LIST))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://shop.example.com:8443/catalog/tools?page=2").unwrap()
    }

    #[test]
    fn resolves_links_against_page_origin() {
        let html = r#"
            <div data-test-selector="productListProductCard_1"><a href="/product/drill">Drill</a></div>
            <div data-test-selector="productListProductCard_2"><a href="product/saw">Saw</a></div>
        "#;
        let listing = ProductListing::parse(html, page_url()).unwrap();
        let urls: Vec<_> = listing.product_urls.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            [
                "https://shop.example.com:8443/product/drill",
                "https://shop.example.com:8443/product/saw",
            ]
        );
    }

    #[test]
    fn skips_cards_inside_narrow_list() {
        let html = r#"
            <div data-test-selector="productListProductCard_1"><a href="/product/1">One</a></div>
            <section data-test-selector="cardListProductsNarrow">
                <div><div data-test-selector="productListProductCard_1"><a href="/product/1">One</a></div></div>
            </section>
            <div data-test-selector="productListProductCard_2"><a href="/product/2">Two</a></div>
        "#;
        let listing = ProductListing::parse(html, page_url()).unwrap();
        let paths: Vec<_> = listing.product_urls.iter().map(Url::path).collect();
        assert_eq!(paths, ["/product/1", "/product/2"]);
        assert!(listing
            .product_urls
            .iter()
            .all(|url| url.host_str() == Some("shop.example.com")));
    }

    #[test]
    fn keeps_duplicates_and_document_order() {
        let html = r#"
            <div data-test-selector="productListProductCard"><a href="/b">B</a></div>
            <div data-test-selector="productListProductCard"><a href="/a">A</a></div>
            <div data-test-selector="productListProductCard"><a href="/b">B</a></div>
        "#;
        let listing = ProductListing::parse(html, page_url()).unwrap();
        let paths: Vec<_> = listing.product_urls.iter().map(Url::path).collect();
        assert_eq!(paths, ["/b", "/a", "/b"]);
    }

    #[test]
    fn drops_cards_without_links_or_foreign_hosts() {
        let html = r#"
            <div data-test-selector="productListProductCard"><span>No link</span></div>
            <div data-test-selector="productListProductCard"><a>No href</a></div>
            <div data-test-selector="productListProductCard"><a href="https://elsewhere.example.org/p">Ad</a></div>
            <div data-test-selector="productListProductCard"><a href="/kept">Kept</a></div>
        "#;
        let listing = ProductListing::parse(html, page_url()).unwrap();
        let paths: Vec<_> = listing.product_urls.iter().map(Url::path).collect();
        assert_eq!(paths, ["/kept"]);
    }

    #[test]
    fn rejects_pages_without_host() {
        let url = Url::parse("data:text/html,<p>hi</p>").unwrap();
        assert!(ProductListing::parse("", url).is_err());
    }
}
