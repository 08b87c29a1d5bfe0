//! Image reference extraction from HTML bodies.

use scraper::{Html, Selector};

/// Collect every `<img>` `src` attribute in document order.
///
/// Duplicates are preserved; elements without a `src` are ignored. The
/// lenient HTML5 parser accepts arbitrary input, so non-HTML bodies simply
/// yield an empty list.
#[must_use]
pub fn image_sources(html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img").unwrap();

    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_owned)
        .collect()
}
