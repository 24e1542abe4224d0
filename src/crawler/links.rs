use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Host with a leading `www.` removed, lowercased.
pub fn site_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

pub fn same_site(url: &Url, domain: &str) -> bool {
    site_domain(url).is_some_and(|d| d == domain)
}

/// Canonical form used as the frontier key: fragment dropped, and only
/// http(s) URLs are accepted.
pub fn canonicalize(mut url: Url) -> Option<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Every same-site link on the page, resolved against `base`, in document
/// order without repeats.
pub fn extract(document: &Html, base: &Url, domain: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR_SEL) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Some(url) = base.join(href).ok().and_then(canonicalize) else {
            continue;
        };
        if !same_site(&url, domain) {
            continue;
        }
        if seen.insert(url.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}
