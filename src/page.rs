//! Page-global scraping.
//!
//! The caption track list and the innertube credentials live only in the
//! watch page's own script state. In a loaded document they surface as
//! inline script assignments (`var ytInitialPlayerResponse = {...};` and
//! `ytcfg.set({...})`), so a page snapshot is scraped with a balanced-brace
//! JSON extractor plus a couple of regexes.

use crate::types::PlayerResponse;
use scraper::{Html, Selector};
use tracing::debug;

/// Suffix the host site appends to document titles.
const TITLE_SUFFIX: &str = " - YouTube";

/// Fallback title when nothing on the page yields one.
pub const UNKNOWN_TITLE: &str = "Unknown Video";

/// Script-global state scraped from a loaded watch page.
#[derive(Debug, Clone, Default)]
pub struct PageGlobals {
    /// The embedded initial player response, when present and parseable.
    pub player_response: Option<PlayerResponse>,
    /// `INNERTUBE_API_KEY` from the page configuration object.
    pub api_key: Option<String>,
    /// `INNERTUBE_CLIENT_VERSION` from the page configuration object.
    pub client_version: Option<String>,
}

/// Scrape all page globals from a document.
pub fn scrape_globals(html: &str) -> PageGlobals {
    let player_response = extract_player_response(html);
    let api_key = capture(html, regex!(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#));
    let client_version = capture(html, regex!(r#""INNERTUBE_CLIENT_VERSION"\s*:\s*"([^"]+)""#));
    debug!(
        player_response = player_response.is_some(),
        api_key = api_key.is_some(),
        "scraped page globals"
    );
    PageGlobals {
        player_response,
        api_key,
        client_version,
    }
}

fn capture(html: &str, re: &regex::Regex) -> Option<String> {
    re.captures(html).map(|c| c[1].to_string())
}

/// Extract and parse the inline `ytInitialPlayerResponse` assignment.
pub fn extract_player_response(html: &str) -> Option<PlayerResponse> {
    let json = extract_assigned_object(html, "ytInitialPlayerResponse")?;
    match serde_json::from_str(json) {
        Ok(pr) => Some(pr),
        Err(e) => {
            debug!("player response did not parse: {}", e);
            None
        }
    }
}

/// Slice out the JSON object assigned to `name` in an inline script.
///
/// Walks from the first `{` after `name =` counting brace depth, skipping
/// string literals and escapes.
fn extract_assigned_object<'a>(html: &'a str, name: &str) -> Option<&'a str> {
    for (at, _) in html.match_indices(name) {
        let rest = &html[at + name.len()..];
        // Only accept an assignment directly after the name.
        let Some(eq) = rest.find('=') else { continue };
        if !rest[..eq].trim().is_empty() {
            continue;
        }
        let Some(open) = rest[eq..].find('{').map(|i| i + eq) else {
            continue;
        };
        if let Some(json) = balanced_object(&rest[open..]) {
            return Some(json);
        }
    }
    None
}

fn balanced_object(body: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&body[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Resolve a display title from page content.
///
/// Fallback order: primary heading selector, secondary heading selector, the
/// document title with the fixed suffix stripped.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for selector in [
        "h1.ytd-video-primary-info-renderer yt-formatted-string",
        "h1.ytd-watch-metadata yt-formatted-string",
        "title",
    ] {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&sel).next() {
            let text: String = element.text().collect();
            let text = text.trim();
            let text = if selector == "title" {
                text.strip_suffix(TITLE_SUFFIX).unwrap_or(text).trim()
            } else {
                text
            };
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Resolve a video id from a page location: the `v` query parameter, else
/// the last path component.
pub fn video_id_from_location(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    if let Some(query) = without_fragment.split('?').nth(1) {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("v=") {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let after_host = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let path = after_host.split_once('/').map(|(_, path)| path).unwrap_or("");
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    (!last.is_empty()).then(|| last.to_string())
}

/// Extract a video id from user input: a full URL in any of the usual
/// shapes, or a bare 11-character id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let url_re = regex!(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)([^&\n?#]+)"
    );
    if let Some(caps) = url_re.captures(input) {
        return Some(caps[1].to_string());
    }
    let bare_re = regex!(r"^[a-zA-Z0-9_-]{11}$");
    bare_re.is_match(input).then(|| input.to_string())
}
