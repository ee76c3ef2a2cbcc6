use std::sync::LazyLock;
use std::time::Duration;

use eyre::{eyre, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use super::attributes::{Attributes, ATTRIBUTES_LABEL, ATTRIBUTES_TOGGLE, SECTION_HEADER};
use crate::browser::{has_text, Page};

/// Bound for the waits on a product detail page.
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Import sheet columns, in the order a fresh sheet lists them.
pub const COLUMNS: [&str; 8] = [
    "ProductImageLink",
    "ProductName",
    "Manufacturer ArticleNumber",
    "Supplier ArticleNumber",
    "Originaldata 1",
    "ProductDescription",
    "Manufacturer",
    "Originaldata 2",
];

const ROOT: &str = "main";

static MAIN: LazyLock<Selector> = LazyLock::new(|| Selector::parse(ROOT).expect("static selector"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"img[data-test-selector="productDetails_mainImage"]"#)
        .expect("static selector")
});
static NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"h2[data-test-selector^="productDetails_productDescription"]"#)
        .expect("static selector")
});
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[data-test-selector="productDetails_htmlContent"]"#)
        .expect("static selector")
});
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));
static SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("static selector"));

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
/// The details scraped from one product page.
///
/// Every field is optional: a field the page does not carry stays `None`
/// without affecting the others.
pub struct ProductRecord {
    /// URL of the main product image.
    pub image_url: Option<String>,
    /// Product name.
    pub name: Option<String>,
    /// Manufacturer article number (`MFG #`).
    pub mfg_number: Option<String>,
    /// Supplier SKU (`SKU #`).
    pub sku: Option<String>,
    /// Universal product code (`UPC #`).
    pub upc: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Brand, from the attributes panel.
    pub manufacturer: Option<String>,
    /// Product type, from the attributes panel.
    pub product_type: Option<String>,
}

impl ProductRecord {
    /// Scrapes the product shown on an already navigated `page`.
    ///
    /// Fails when the page never renders its main container. A missing
    /// attributes toggle only leaves brand and type empty.
    pub async fn scrape<P: Page>(page: &P, url: &Url) -> Result<Self> {
        info!(%url, "Scraping product details");
        page.wait_for(ROOT, DETAIL_TIMEOUT).await?;

        let expanded = match page.wait_for(ATTRIBUTES_TOGGLE, DETAIL_TIMEOUT).await {
            Ok(()) => {
                page.click_within(SECTION_HEADER, ATTRIBUTES_LABEL, "button")
                    .await?
            }
            Err(_) => false,
        };
        if !expanded {
            warn!(%url, "Attributes section not available; brand and type left empty");
        }

        let html = page.content().await?;
        Self::parse(&html, expanded)
    }

    /// Extracts the record from product page markup.
    ///
    /// `attributes_expanded` tells whether the attributes panel was opened;
    /// its fields are only read when it was.
    pub fn parse(html: &str, attributes_expanded: bool) -> Result<Self> {
        let document = Html::parse_document(html);
        let main = document
            .select(&MAIN)
            .next()
            .ok_or_else(|| eyre!("Product container `{ROOT}` not found"))?;

        let mut details = ProductRecord {
            image_url: main
                .select(&IMAGE)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(String::from),
            name: main.select(&NAME).next().and_then(element_text),
            mfg_number: labelled(main, "MFG #"),
            sku: labelled(main, "SKU #"),
            upc: labelled(main, "UPC #"),
            description: main.select(&DESCRIPTION).next().and_then(element_text),
            ..Default::default()
        };

        if attributes_expanded {
            let attributes = Attributes::parse(main);
            details.manufacturer = attributes.manufacturer;
            details.product_type = attributes.product_type;
        }

        Ok(details)
    }

    /// The record as `(column, value)` pairs of the import sheet.
    pub fn columns(&self) -> [(&'static str, Option<&str>); 8] {
        [
            (COLUMNS[0], self.image_url.as_deref()),
            (COLUMNS[1], self.name.as_deref()),
            (COLUMNS[2], self.mfg_number.as_deref()),
            (COLUMNS[3], self.sku.as_deref()),
            (COLUMNS[4], self.upc.as_deref()),
            (COLUMNS[5], self.description.as_deref()),
            (COLUMNS[6], self.manufacturer.as_deref()),
            (COLUMNS[7], self.product_type.as_deref()),
        ]
    }
}

/// Removes the literal `label` and the surrounding whitespace.
///
/// ```rust
/// use catalog_crawler::product_details::strip_label;
///
/// assert_eq!(strip_label("MFG # 12345 ", "MFG #"), "12345");
/// ```
pub fn strip_label(text: &str, label: &str) -> String {
    text.replace(label, "").trim().to_string()
}

/// Elements rendered on lines of their own.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4", "h5",
    "h6", "li", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Text as a browser renders it: whitespace runs collapse to one space and
/// block elements start new lines. `None` when blank.
pub(crate) fn element_text(elem: ElementRef) -> Option<String> {
    let mut raw = String::new();
    push_rendered(elem, &mut raw);
    let text = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

fn push_rendered(elem: ElementRef, out: &mut String) {
    for child in elem.children() {
        if let Some(text) = child.value().as_text() {
            out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
        } else if let Some(child) = ElementRef::wrap(child) {
            match child.value().name() {
                "script" | "style" => {}
                "br" => out.push('\n'),
                name if BLOCK_ELEMENTS.contains(&name) => {
                    out.push('\n');
                    push_rendered(child, out);
                    out.push('\n');
                }
                _ => push_rendered(child, out),
            }
        }
    }
}

/// Value of the first paragraph carrying a `span` with `label`.
fn labelled(root: ElementRef, label: &str) -> Option<String> {
    root.select(&PARAGRAPH)
        .find(|p| {
            p.select(&SPAN)
                .any(|span| has_text(&span.text().collect::<String>(), label))
        })
        .map(|p| strip_label(&p.text().collect::<String>(), label))
        .filter(|value| !value.is_empty())
}
