//! On-demand extraction of the page the visitor is looking at

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Upper bound on extracted characters handed to the prompt
const MAX_PAGE_CHARS: usize = 4000;

/// Raw page as captured by the client
#[derive(Debug, Clone, Deserialize)]
pub struct PageSnapshot {
    pub path: String,
    pub html: String,
}

/// Flattened text of the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub path: String,
    pub title: String,
    pub extracted_text: String,
}

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").unwrap());
static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main[^>]*>(.*?)</main>").unwrap());
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").unwrap());
static NAV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<nav[^>]*>(.*?)</nav>").unwrap());
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a(?:\s[^>]*)?>(.*?)</a>").unwrap());
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

/// Extract path, title and a text blob made of headings, paragraphs inside
/// `<main>` (or the whole document when there is none) and navigation labels.
pub fn scan_page(snapshot: &PageSnapshot) -> PageContext {
    let html = SCRIPT_RE.replace_all(&snapshot.html, " ");

    let title = TITLE_RE
        .captures(&html)
        .map(|c| clean_text(&c[1]))
        .unwrap_or_default();

    let content_region = MAIN_RE
        .captures(&html)
        .and_then(|c| c.get(1))
        .map_or(&*html, |m| m.as_str());

    let headings = collect(&HEADING_RE, &html);
    let paragraphs = collect(&PARAGRAPH_RE, content_region);
    let nav_labels: Vec<String> = NAV_RE
        .captures_iter(&html)
        .flat_map(|c| collect(&LINK_RE, c.get(1).map_or("", |m| m.as_str())))
        .collect();

    let mut sections = Vec::new();
    if !headings.is_empty() {
        sections.push(format!("Headings: {}", headings.join(" | ")));
    }
    if !paragraphs.is_empty() {
        sections.push(format!("Content: {}", paragraphs.join(" ")));
    }
    if !nav_labels.is_empty() {
        sections.push(format!("Navigation: {}", nav_labels.join(", ")));
    }

    PageContext {
        path: snapshot.path.clone(),
        title,
        extracted_text: truncate_chars(&sections.join("\n"), MAX_PAGE_CHARS),
    }
}

fn collect(re: &Regex, haystack: &str) -> Vec<String> {
    re.captures_iter(haystack)
        .filter_map(|c| c.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, "");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text.get(..idx).unwrap_or(text).to_string(),
        None => text.to_string(),
    }
}
