//! Pure URL canonicalisation and relative-to-absolute resolution.
//!
//! None of these functions perform I/O; they operate on plain strings. The
//! `resolve` algorithm intentionally does not delegate to `url::Url::join` —
//! it has its own quirks (single-level `../` only, file-like trailing-slash
//! suppression) that a full RFC 3986 resolver does not reproduce.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const FILE_LIKE_EXTENSIONS: &[&str] = &[".htm", ".html", ".xml", ".jpg", ".jpeg", ".png", ".ico"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("empty relative link")]
    EmptyRelative,
    #[error("can't extract domain from base url")]
    NoBaseDomain,
    #[error("relative-to-parent link requires a base with at least one path segment")]
    NoParentSegment,
    #[error("can't parse relative link: {0}")]
    Unparseable(String),
}

/// True if `s`'s path ends (case-insensitively) in a recognised static-file extension.
pub fn is_file_like(s: &str) -> bool {
    let lower = s.to_lowercase();
    FILE_LIKE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Append a trailing slash unless already present or the URL is file-like.
pub fn add_trailing_slash(s: &str) -> String {
    if s.ends_with('/') || is_file_like(s) {
        s.to_string()
    } else {
        format!("{s}/")
    }
}

/// Extract the substring between `://` and the next `/`. Not a full authority parser.
pub fn extract_domain(url: &str) -> Option<String> {
    let after_scheme = url.split_once("://")?.1;
    let host = match after_scheme.find('/') {
        Some(idx) => &after_scheme[..idx],
        None => after_scheme,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

fn extract_scheme(url: &str) -> Option<&str> {
    url.split_once("://").map(|(scheme, _)| scheme)
}

/// Truncate `url` at its first `#`.
pub fn strip_fragment(url: &str) -> String {
    match url.find('#') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

/// Truncate `url` at its first `?`.
pub fn strip_query(url: &str) -> String {
    match url.find('?') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

fn regexes() -> &'static (Regex, Regex, Regex, Regex, Regex) {
    static CELL: OnceLock<(Regex, Regex, Regex, Regex, Regex)> = OnceLock::new();
    CELL.get_or_init(|| {
        (
            Regex::new(r"^https?://").unwrap(),
            Regex::new(r"^(\w[.\w-]*/?)+$").unwrap(),
            Regex::new(r"^/((\w[.\w-]*/?)+)$").unwrap(),
            Regex::new(r"^//(.*)$").unwrap(),
            Regex::new(r"^\.\./(.*)$").unwrap(),
        )
    })
}

/// Split `s` into a `(head, params)` pair where `params` is the concatenation
/// of the `?...` and `#...` suffixes in their original order.
fn split_params(s: &str) -> (&str, String) {
    let query_idx = s.find('?');
    let frag_idx = s.find('#');
    let split_at = match (query_idx, frag_idx) {
        (Some(q), Some(f)) => q.min(f),
        (Some(q), None) => q,
        (None, Some(f)) => f,
        (None, None) => s.len(),
    };
    (&s[..split_at], s[split_at..].to_string())
}

/// Resolve `relative` against `base` into an absolute URL, per the algorithm
/// in the specification: each step is tried in order, first match wins.
pub fn resolve(relative: &str, base: &str) -> Result<String, ResolveError> {
    if relative.is_empty() {
        return Err(ResolveError::EmptyRelative);
    }

    // add_trailing_slash only applies to the path portion: a bare query/fragment
    // relative (e.g. "#section") must reach step 6 unchanged, per the fragment
    // boundary case (§8).
    let relative = if relative.contains('#') || relative.contains('?') {
        relative.to_string()
    } else {
        add_trailing_slash(relative)
    };
    let base = add_trailing_slash(&strip_query(&strip_fragment(base)));

    let scheme = extract_scheme(&base).ok_or(ResolveError::NoBaseDomain)?;
    let protocol = format!("{scheme}://");
    let domain = extract_domain(&base).ok_or(ResolveError::NoBaseDomain)?;

    let (abs_re, rel_here_re, rel_rooted_re, protocol_rel_re, parent_re) = regexes();

    if abs_re.is_match(&relative) {
        return Ok(relative);
    }

    let (clean_rel, params) = split_params(&relative);

    if clean_rel.is_empty() {
        return Ok(format!("{base}{params}"));
    }

    if clean_rel == "/" {
        return Ok(format!("{protocol}{domain}/{params}"));
    }

    if rel_here_re.is_match(clean_rel) {
        let joined = if is_file_like(&base) {
            let basename_start = base.rfind('/').map(|i| i + 1).unwrap_or(0);
            format!("{}{}", &base[..basename_start], clean_rel)
        } else {
            format!("{base}{clean_rel}")
        };
        return Ok(format!("{joined}{params}"));
    }

    if let Some(caps) = rel_rooted_re.captures(clean_rel) {
        let matched = &caps[0];
        return Ok(format!("{protocol}{domain}{matched}{params}"));
    }

    if let Some(caps) = protocol_rel_re.captures(clean_rel) {
        return Ok(format!("{protocol}{}{params}", &caps[0][2..]));
    }

    if parent_re.is_match(clean_rel) {
        // base always ends in '/' at this point; strip it before counting
        // segments so a bare "scheme://host/" (no path segment) is correctly
        // rejected rather than silently eating the host.
        let trimmed = base.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() < 4 {
            return Err(ResolveError::NoParentSegment);
        }
        let kept = &segments[..segments.len() - 1];
        let parent_base = format!("{}/", kept.join("/"));
        let rest = &clean_rel[3..];
        return Ok(format!("{parent_base}{rest}{params}"));
    }

    Err(ResolveError::Unparseable(clean_rel.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_trailing_slash_appends() {
        assert_eq!(add_trailing_slash("https://d.com/a"), "https://d.com/a/");
    }

    #[test]
    fn add_trailing_slash_idempotent() {
        let once = add_trailing_slash("https://d.com/a");
        assert_eq!(add_trailing_slash(&once), once);
    }

    #[test]
    fn add_trailing_slash_preserves_file_like() {
        assert_eq!(
            add_trailing_slash("https://d.com/file.htm"),
            "https://d.com/file.htm"
        );
        assert_eq!(
            add_trailing_slash("https://d.com/icon.ICO"),
            "https://d.com/icon.ICO"
        );
    }

    #[test]
    fn extract_domain_basic() {
        assert_eq!(
            extract_domain("https://example.com/a/b"),
            Some("example.com".to_string())
        );
        assert_eq!(
            extract_domain("https://example.com"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn strip_fragment_and_query() {
        assert_eq!(strip_fragment("https://d.com/a#frag"), "https://d.com/a");
        assert_eq!(strip_query("https://d.com/a?x=1"), "https://d.com/a");
    }

    #[test]
    fn resolve_empty_is_error() {
        assert_eq!(resolve("", "https://d.com/"), Err(ResolveError::EmptyRelative));
    }

    #[test]
    fn resolve_already_absolute() {
        assert_eq!(
            resolve("https://other.com/x", "https://d.com/").unwrap(),
            "https://other.com/x/"
        );
    }

    #[test]
    fn resolve_fragment_only() {
        assert_eq!(
            resolve("#section", "https://d.com/a/").unwrap(),
            "https://d.com/a/#section"
        );
    }

    #[test]
    fn resolve_root_slash() {
        assert_eq!(
            resolve("/", "https://d.com/a/b/").unwrap(),
            "https://d.com/"
        );
    }

    #[test]
    fn resolve_relative_to_current_directory() {
        assert_eq!(
            resolve("about", "https://d.com/a/").unwrap(),
            "https://d.com/a/about/"
        );
    }

    #[test]
    fn resolve_relative_to_file_like_base_strips_basename() {
        assert_eq!(
            resolve("about/", "https://d.com/a/index.html").unwrap(),
            "https://d.com/a/about/"
        );
    }

    #[test]
    fn resolve_rooted_path() {
        assert_eq!(
            resolve("/a/b", "https://d.com/x/").unwrap(),
            "https://d.com/a/b/"
        );
    }

    #[test]
    fn resolve_protocol_relative() {
        assert_eq!(
            resolve("//cdn.d.com/y/", "http://d.com/a/").unwrap(),
            "http://cdn.d.com/y/"
        );
    }

    #[test]
    fn resolve_parent_segment() {
        assert_eq!(
            resolve("../x/", "https://d.com/a/b/").unwrap(),
            "https://d.com/a/x/"
        );
    }

    #[test]
    fn resolve_parent_from_two_segment_base_errors() {
        // "https://d.com/" has no path segment to drop below the host.
        assert_eq!(
            resolve("../x/", "https://d.com/"),
            Err(ResolveError::NoParentSegment)
        );
    }

    #[test]
    fn resolve_parent_from_single_path_segment_base() {
        assert_eq!(
            resolve("../x/", "https://d.com/a/").unwrap(),
            "https://d.com/x/"
        );
    }

    #[test]
    fn resolve_unparseable() {
        assert!(matches!(
            resolve("!!!not a path???", "https://d.com/a/"),
            Err(ResolveError::Unparseable(_))
        ));
    }

    #[test]
    fn resolve_is_idempotent_on_absolute() {
        let once = resolve("https://d.com/a", "https://base.com/").unwrap();
        let twice = resolve(&once, "https://base.com/").unwrap();
        assert_eq!(once, twice);
    }
}
