//! Selector chains: comma-separated CSS selectors tried in order.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static SPEC_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td, dt, dd").expect("valid selector"));

/// Parses a chain into its selectors, trimming entries and skipping blank
/// or unparseable ones.
pub(crate) fn parse_chain(chain: &str) -> Vec<Selector> {
    chain
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match Selector::parse(entry) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::debug!(selector = entry, error = %e, "skipping invalid selector");
                None
            }
        })
        .collect()
}

/// Value of the first element matched by the first selector that yields a
/// non-empty value.
pub(crate) fn first_value(document: &Html, chain: Option<&str>) -> Option<String> {
    let selectors = parse_chain(chain?);
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .find_map(|element| element_value(&element))
    })
}

/// Image references from every element matched by every selector, in
/// document order per selector.
pub(crate) fn image_refs(document: &Html, chain: Option<&str>) -> Vec<String> {
    let Some(chain) = chain else {
        return Vec::new();
    };
    parse_chain(chain)
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|element| {
            let attrs = element.value();
            ["src", "data-src", "content", "href"]
                .iter()
                .filter_map(|name| attrs.attr(name))
                .map(str::trim)
                .find(|v| !v.is_empty())
                .map(str::to_owned)
        })
        .collect()
}

/// Key/value pairs from rows matched by the `specs` chain: first cell is the
/// key, second is the value.
pub(crate) fn spec_rows(document: &Html, chain: Option<&str>) -> Vec<(String, String)> {
    let Some(chain) = chain else {
        return Vec::new();
    };
    parse_chain(chain)
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|row| {
            let mut cells = row.select(&SPEC_CELLS).map(|cell| collapse_text(&cell));
            let key = cells.next()?;
            let value = cells.next()?;
            let key = key.trim_end_matches(':').trim().to_string();
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}

/// Page `<title>` with configured boilerplate suffixes removed.
pub(crate) fn title_text(document: &Html, suffixes: &[String]) -> Option<String> {
    let title = document
        .select(&TITLE)
        .next()
        .map(|element| collapse_text(&element))?;
    let stripped = suffixes
        .iter()
        .find_map(|suffix| title.strip_suffix(suffix.as_str()))
        .unwrap_or(title.as_str())
        .trim()
        .to_string();
    (!stripped.is_empty()).then_some(stripped)
}

/// Visible text of an element, or its `content`/`value` attribute for
/// `<meta>`- and `<input>`-style elements.
fn element_value(element: &ElementRef<'_>) -> Option<String> {
    let text = collapse_text(element);
    if !text.is_empty() {
        return Some(text);
    }
    ["content", "value"]
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_owned)
}

fn collapse_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
