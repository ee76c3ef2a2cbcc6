use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::browser::has_text;

pub(crate) const SECTION_HEADER: &str = r#"dt[data-test-selector="sectionHeader"]"#;
pub(crate) const ATTRIBUTES_TOGGLE: &str = r#"dt[data-test-selector="sectionHeader"] > button"#;
pub(crate) const ATTRIBUTES_LABEL: &str = "Attributes";

static HEADER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(SECTION_HEADER).expect("static selector"));
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").expect("static selector"));
static SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("static selector"));

/// Values read from the expanded "Attributes" panel.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Attributes {
    pub manufacturer: Option<String>,
    pub product_type: Option<String>,
}

impl Attributes {
    /// Reads the panel that follows the "Attributes" section header.
    pub(crate) fn parse(root: ElementRef) -> Self {
        let Some(panel) = panel(root) else {
            return Self::default();
        };
        Self {
            manufacturer: labelled_value(panel, |label| has_text(label, "Brand")),
            product_type: labelled_value(panel, |label| {
                label.trim().eq_ignore_ascii_case("Type:")
            }),
        }
    }
}

fn panel(root: ElementRef) -> Option<ElementRef> {
    let header = root
        .select(&HEADER)
        .find(|dt| has_text(&dt.text().collect::<String>(), ATTRIBUTES_LABEL))?;
    header.next_siblings().filter_map(ElementRef::wrap).find(|e| {
        e.value().name() == "dd" && e.value().attr("data-test-selector") == Some("sectionPanel")
    })
}

/// Second child `span` of the first `div` that holds a `span` label
/// accepted by `is_label`.
fn labelled_value(panel: ElementRef, is_label: impl Fn(&str) -> bool) -> Option<String> {
    panel
        .select(&DIV)
        .filter(|div| {
            div.select(&SPAN)
                .any(|span| is_label(&span.text().collect::<String>()))
        })
        .find_map(|div| {
            let value = div.children().filter_map(ElementRef::wrap).nth(1)?;
            (value.value().name() == "span").then_some(value)
        })
        .and_then(super::product::element_text)
}
