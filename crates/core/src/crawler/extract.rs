//! Pattern extraction from listing HTML.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::BTreeSet;
use url::Url;

use crate::catalog::ItemId;

use super::CrawlError;

/// Query key carrying the page number.
pub const PAGE_PARAM: &str = "p";

static ID_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"filedetails/\?id=(\d+)").expect("valid pattern"));
static ID_DATA_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-publishedfileid="(\d+)""#).expect("valid pattern"));
static ID_DATA_ATTR_ESCAPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-publishedfileid=\\"(\d+)\\""#).expect("valid pattern"));

static APPID_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[?&])appid=(\d+)\b").expect("valid pattern"));
static APPID_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-appid="(\d+)""#).expect("valid pattern"));
static APPID_ATTR_ESCAPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data-appid=\\"(\d+)\\""#).expect("valid pattern"));
static APPID_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:BrowseAppId|PublishedFileService\.m_appid)\s*[:=]\s*["']?(\d+)"#)
        .expect("valid pattern")
});

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("valid pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));
static STEAM_WORKSHOP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)steam\s*workshop\s*[:\-–]*\s*").expect("valid pattern"));
static WORKSHOP_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)workshop\s*[:\-–]*\s*").expect("valid pattern"));

/// Body text that means the listing has nothing (more) to show us.
const EXHAUSTED_MARKERS: &[&str] = &[
    "There are no items",
    "No items found",
    "This profile is private",
    "You must be logged in to view this content",
    "This item is private",
];

const INVALID_FS_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_NAME_CHARS: usize = 80;

/// Whether `url` points at a Steam Community Workshop listing.
pub fn is_listing_url(url: &str) -> bool {
    url.starts_with("https://steamcommunity.com/") && url.contains("workshop")
}

/// Set the page query parameter on a listing URL, keeping all other keys.
pub fn page_url(listing_url: &str, page: u32) -> Result<String, CrawlError> {
    let mut url =
        Url::parse(listing_url).map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", listing_url, e)))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != PAGE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(PAGE_PARAM, &page.to_string());

    Ok(url.into())
}

/// All item ids referenced on a page, from links and data attributes.
pub fn extract_item_ids(html: &str) -> BTreeSet<ItemId> {
    [&*ID_LINK, &*ID_DATA_ATTR, &*ID_DATA_ATTR_ESCAPED]
        .into_iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|caps| caps.get(1).and_then(|m| ItemId::parse(m.as_str())))
        .collect()
}

/// Whether the page body carries an empty/private/login-required marker.
pub fn looks_exhausted(html: &str) -> bool {
    EXHAUSTED_MARKERS.iter().any(|marker| html.contains(marker))
}

/// App id of the listing: the `appid` query parameter if present, otherwise
/// the most frequent candidate found in the first page's markup.
pub fn detect_app_id(listing_url: &str, first_page: Option<&str>) -> Option<String> {
    if let Ok(url) = Url::parse(listing_url) {
        let from_query = url
            .query_pairs()
            .find(|(k, _)| k == "appid")
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()));
        if from_query.is_some() {
            return from_query;
        }
    }

    let html = first_page?;
    let mut counts: Vec<(String, usize)> = Vec::new();
    let candidates = [
        &*APPID_QUERY,
        &*APPID_ATTR,
        &*APPID_ATTR_ESCAPED,
        &*APPID_SCRIPT,
    ]
    .into_iter()
    .flat_map(|re| re.captures_iter(html))
    .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()));

    for candidate in candidates {
        match counts.iter_mut().find(|(c, _)| *c == candidate) {
            Some((_, n)) => *n += 1,
            None => counts.push((candidate, 1)),
        }
    }

    // max_by_key keeps the last maximum; fold keeps the first one seen.
    counts
        .into_iter()
        .fold(None::<(String, usize)>, |best, (c, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((c, n)),
        })
        .map(|(c, _)| c)
}

/// Human-readable game name from the page `<title>`, safe for folder names.
pub fn detect_app_name(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = WHITESPACE.replace_all(raw, " ");
    let title = STEAM_WORKSHOP_PREFIX.replace_all(title.trim(), "");
    let title = WORKSHOP_PREFIX.replace_all(&title, "");
    let title: String = title
        .chars()
        .filter(|c| !matches!(c, '®' | '™' | '©'))
        .collect();

    let name: String = sanitize_name(&title).chars().take(MAX_NAME_CHARS).collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Replace characters that are invalid in Windows file names.
pub fn sanitize_name(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if INVALID_FS_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.trim().trim_end_matches('.').to_string()
}
