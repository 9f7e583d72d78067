//! HTML page parser: given a fetched URL and its response body, extract the
//! fixed set of SEO-relevant facts that make up a `PageRecord`.
//!
//! Grounded in the teacher's `Parser`: same `scraper::Html`/`Selector` idiom,
//! same per-tag extraction helpers, narrowed to the spec's field set.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::PageRecord;
use crate::url_utils;

struct PageBuilder {
    title: String,
    h1: String,
    links: Vec<String>,
    hreflang_map: HashMap<String, String>,
    imgs: Vec<String>,
    canonical_url: String,
    no_index: bool,
}

impl PageBuilder {
    fn new() -> Self {
        PageBuilder {
            title: String::new(),
            h1: String::new(),
            links: Vec::new(),
            hreflang_map: HashMap::new(),
            imgs: Vec::new(),
            canonical_url: String::new(),
            no_index: false,
        }
    }

    fn build(self, url: String) -> PageRecord {
        PageRecord {
            url,
            title: self.title,
            h1: self.h1,
            links: self.links,
            hreflang_map: self.hreflang_map,
            imgs: self.imgs,
            canonical_url: self.canonical_url,
            no_index: self.no_index,
        }
    }
}

fn paginator_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^((https?://.*/))(page|p)/\d+/$").unwrap())
}

/// Parse a fetched page's HTML into a `PageRecord`. `fetched_url` is the
/// final (post-redirect) URL reported by the HTTP layer.
pub fn parse(html_content: &str, fetched_url: &str) -> PageRecord {
    let document = Html::parse_document(html_content);
    let mut page = PageBuilder::new();

    page.title = extract_first_text(&document, "title");
    page.h1 = extract_first_text(&document, "h1");

    extract_anchor_links(&document, fetched_url, &mut page.links);
    extract_hreflang(&document, fetched_url, &mut page.links, &mut page.hreflang_map);
    extract_canonical(&document, fetched_url, &mut page.links, &mut page.canonical_url);
    extract_images(&document, &mut page.imgs);
    page.no_index = has_noindex_meta(&document);

    add_synthetic_self_links(fetched_url, &mut page.links);

    let normalized_url = url_utils::add_trailing_slash(fetched_url);
    page.build(normalized_url)
}

fn extract_first_text(document: &Html, tag: &str) -> String {
    let sel = Selector::parse(tag).unwrap();
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_anchor_links(document: &Html, fetched_url: &str, links: &mut Vec<String>) {
    let sel = Selector::parse("a[href]").unwrap();
    for el in document.select(&sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }
        if let Ok(resolved) = url_utils::resolve(href, fetched_url) {
            links.push(resolved);
        }
    }
}

fn extract_hreflang(
    document: &Html,
    fetched_url: &str,
    links: &mut Vec<String>,
    hreflang_map: &mut HashMap<String, String>,
) {
    let sel = Selector::parse(r#"link[rel~="alternate"][hreflang][href]"#).unwrap();
    for el in document.select(&sel) {
        let (Some(lang), Some(href)) = (el.value().attr("hreflang"), el.value().attr("href"))
        else {
            continue;
        };
        let lang = lang.trim();
        let href = href.trim();
        match url_utils::resolve(href, fetched_url) {
            Ok(resolved) => {
                hreflang_map.insert(lang.to_string(), resolved.clone());
                links.push(resolved);
            }
            Err(e) => {
                // Historically this panicked; now it's dropped and logged (§9).
                tracing::warn!(href = %href, error = %e, "dropping unresolvable hreflang href");
            }
        }
    }
}

fn extract_canonical(
    document: &Html,
    fetched_url: &str,
    links: &mut Vec<String>,
    canonical_url: &mut String,
) {
    let sel = Selector::parse(r#"link[rel~="canonical"][href]"#).unwrap();
    if let Some(el) = document.select(&sel).next() {
        if let Some(href) = el.value().attr("href") {
            if let Ok(resolved) = url_utils::resolve(href.trim(), fetched_url) {
                *canonical_url = resolved.clone();
                links.push(resolved);
            }
        }
    }
}

fn extract_images(document: &Html, imgs: &mut Vec<String>) {
    let sel = Selector::parse("img[src]").unwrap();
    for el in document.select(&sel) {
        if let Some(src) = el.value().attr("src") {
            let src = src.trim();
            if !src.is_empty() {
                imgs.push(src.to_string());
            }
        }
    }
}

fn has_noindex_meta(document: &Html) -> bool {
    let sel = Selector::parse("meta[content]").unwrap();
    document.select(&sel).any(|el| {
        el.value()
            .attr("content")
            .map(|c| c.to_lowercase().contains("noindex"))
            .unwrap_or(false)
    })
}

/// Append the paginator-root and query-stripped synthetic self-links (§4.C).
fn add_synthetic_self_links(fetched_url: &str, links: &mut Vec<String>) {
    if let Some(caps) = paginator_re().captures(fetched_url) {
        let root = url_utils::add_trailing_slash(&caps[1]);
        links.push(root);
    }
    if fetched_url.contains('?') {
        let prefix = url_utils::strip_query(fetched_url);
        links.push(url_utils::add_trailing_slash(&prefix));
    }
}
