//! Sitemap reader: a deliberately naive, line-based `<loc>` extractor.
//!
//! Grounded in the teacher's `fetch_sitemap_urls`, stripped of sitemap-index
//! recursion. The spec treats a minified single-line sitemap as an accepted
//! miss rather than a bug to fix (§9): each line is inspected independently,
//! so a `<loc>` that shares a line with its neighbours is not found.

use regex::Regex;
use std::sync::OnceLock;

fn loc_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"<loc>\s*(.*?)\s*</loc>").unwrap())
}

/// Fetch `{site_root}/sitemap.xml` and return every `<loc>` value found, one
/// regex pass per line. Returns an empty vector on any fetch or status error.
pub async fn get_links_from_sitemap(site_root: &str) -> Vec<String> {
    let url = format!("{}sitemap.xml", crate::url_utils::add_trailing_slash(site_root));
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
    {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let xml = match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => body,
            Err(_) => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    extract_locs_by_line(&xml)
}

/// Extract `<loc>` contents, one line at a time.
fn extract_locs_by_line(xml: &str) -> Vec<String> {
    let re = loc_re();
    let mut out = Vec::new();
    for line in xml.lines() {
        if let Some(caps) = re.captures(line) {
            let url = caps[1].trim();
            if !url.is_empty() {
                out.push(url.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_one_loc_per_line() {
        let xml = "<urlset>\n<url><loc>https://example.com/</loc></url>\n<url><loc>https://example.com/about</loc></url>\n</urlset>";
        let urls = extract_locs_by_line(xml);
        assert_eq!(urls, vec!["https://example.com/", "https://example.com/about"]);
    }

    #[test]
    fn misses_locs_sharing_a_minified_line() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url><url><loc>https://example.com/b</loc></url></urlset>";
        let urls = extract_locs_by_line(xml);
        // Both locs share one line; the naive line-based scan only ever
        // captures the first match per line.
        assert_eq!(urls, vec!["https://example.com/a"]);
    }

    #[test]
    fn empty_sitemap_yields_no_urls() {
        assert!(extract_locs_by_line("<urlset></urlset>").is_empty());
    }

    #[test]
    fn trims_whitespace_around_loc_on_same_line() {
        let xml = "<url><loc>   https://example.com/page   </loc></url>";
        let urls = extract_locs_by_line(xml);
        assert_eq!(urls, vec!["https://example.com/page"]);
    }

    #[test]
    fn misses_loc_split_across_lines() {
        let xml = "<url><loc>\n  https://example.com/page  \n</loc></url>";
        // Naive: the regex never sees the open and close tag on one line.
        let urls = extract_locs_by_line(xml);
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn unreachable_site_root_yields_empty() {
        let urls = get_links_from_sitemap("http://127.0.0.1:1/").await;
        assert!(urls.is_empty());
    }
}
