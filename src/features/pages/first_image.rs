use scraper::{Html, Selector};

/// First non-empty `src` among the `<img>` tags, in document order.
///
/// The parser recovers from any markup, so broken HTML just yields fewer
/// elements. An unterminated tag such as `<img src=` is discarded, and images
/// without a usable `src` are skipped.
pub fn first_image(html: &str) -> Option<String> {
    // most pages have no images, skip building a DOM for them
    if !html
        .as_bytes()
        .windows(4)
        .any(|w| w.eq_ignore_ascii_case(b"<img"))
    {
        return None;
    }

    let selector = Selector::parse("img").ok()?;
    let fragment = Html::parse_fragment(html);

    fragment
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| !src.trim().is_empty())
        .map(str::to_string)
}
