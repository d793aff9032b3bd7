use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, LINK};

static NEXT_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).unwrap());

/// Extracts the `rel="next"` target from a `Link` response header.
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(parse_next)
}

fn parse_next(value: &str) -> Option<String> {
    value
        .split(',')
        .find_map(|part| NEXT_LINK_REGEX.captures(part.trim()))
        .map(|captures| captures[1].to_string())
}
