pub mod fetcher;
pub mod parser;
pub mod sitemap;

use regex::Regex;
use std::collections::HashSet;

use crate::models::{LevelRecord, PageRecordJson};
use crate::url_utils;
use crate::validator::UrlValidator;
use fetcher::{Fetcher, WorkerPool};

/// Tunables for one crawl run.
pub struct CrawlOptions {
    pub num_workers: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        CrawlOptions {
            num_workers: 4,
            user_agent: "sitecrawler/1.0".to_string(),
            timeout_secs: 30,
        }
    }
}

const IMAGE_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg"];

pub(crate) fn is_image_suffixed(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|ext| lower.ends_with(ext))
}

pub(crate) fn is_junk_link(link: &str) -> bool {
    link.is_empty()
        || link == "#"
        || link.starts_with("tel:")
        || link.starts_with("mailto:")
        || link.contains("javascript:void(0)")
        || link.contains("javascript:;")
}

/// The last two dot-separated components of a domain, e.g.
/// `blog.example.com` → `example.com`.
fn base_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() <= 2 {
        domain.to_string()
    } else {
        parts[parts.len() - 2..].join(".")
    }
}

/// Build the same-site scope regex against the registrable base domain:
/// `include_subdomains` widens the host match to any `*.base`, otherwise
/// only `base` and `www.base` qualify. Exact form per §6.
fn build_scope_regex(base: &str, include_subdomains: bool) -> Regex {
    let escaped = regex::escape(base);
    let pattern = if include_subdomains {
        format!(r"^https?://([-\w\d]+\.)*{escaped}/.*$")
    } else {
        format!(r"^https?://(www\.)?{escaped}/.*$")
    };
    Regex::new(&pattern).expect("scope regex is well-formed")
}

/// Breadth-first crawl of a single site starting from `seed_urls`.
///
/// Proceeds level by level: every URL in the current frontier is fetched
/// and parsed by the worker pool, the scope regex and validator gate which
/// discovered links join the next frontier, and the loop runs until a
/// level produces no new in-scope URLs. Implemented iteratively — not
/// recursively — so crawl depth is bounded only by memory, not stack (§9).
pub async fn crawl(
    seed_urls: &[String],
    include_subdomains: bool,
    validator: &UrlValidator,
    options: &CrawlOptions,
) -> Vec<LevelRecord> {
    let seed_urls: Vec<String> = seed_urls
        .iter()
        .map(|u| url_utils::add_trailing_slash(u))
        .collect();
    let Some(first_seed) = seed_urls.first() else {
        return Vec::new();
    };
    let Some(domain) = url_utils::extract_domain(first_seed) else {
        return Vec::new();
    };
    let scope_re = build_scope_regex(&base_domain(&domain), include_subdomains);

    let fetcher = Fetcher::new(options.timeout_secs, &options.user_agent);
    let pool = WorkerPool::new(fetcher, options.num_workers);

    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier: Vec<String> = Vec::new();
    for url in seed_urls {
        if visited.insert(url.clone()) {
            frontier.push(url);
        }
    }
    let mut levels: Vec<LevelRecord> = Vec::new();

    while !frontier.is_empty() {
        let pages = pool.crawl_level(frontier.clone()).await;

        for (dispatched, page) in frontier.iter().zip(pages.iter()) {
            visited.insert(dispatched.clone());
            if !page.is_empty() && &page.url != dispatched {
                visited.insert(page.url.clone());
            }
        }

        let mut seen_this_level: HashSet<String> = HashSet::new();
        let mut next_frontier: Vec<String> = Vec::new();
        for page in &pages {
            if page.is_empty() {
                continue;
            }
            for link in &page.links {
                if is_junk_link(link) {
                    continue;
                }
                let candidate = url_utils::add_trailing_slash(&url_utils::strip_fragment(link));
                if !seen_this_level.insert(candidate.clone()) {
                    continue;
                }
                if !scope_re.is_match(&candidate) {
                    continue;
                }
                if is_image_suffixed(&candidate) {
                    continue;
                }
                if !validator.is_valid(&candidate) {
                    continue;
                }
                if visited.insert(candidate.clone()) {
                    next_frontier.push(candidate);
                }
            }
        }

        // Next level number reads the tail of `levels`, not `levels[0]` —
        // the latter would re-stamp every level as 1 past the seed (§9).
        let level_num = levels.last().map(|l| l.level_num + 1).unwrap_or(0);
        let page_jsons: Vec<PageRecordJson> = pages
            .iter()
            .filter(|p| !p.is_empty())
            .map(PageRecordJson::from)
            .collect();
        levels.push(LevelRecord {
            level_num,
            pages: page_jsons,
        });

        frontier = next_frontier;
    }

    levels
}
