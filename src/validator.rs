//! Rule-based URL validator: compiled allow/deny regular expressions that
//! gate which URLs are admitted to the crawl frontier.
//!
//! Grounded in the teacher's `RobotsChecker` — construction from raw string
//! rules, a boolean predicate, graceful skip of unparseable input — but
//! re-purposed for exception/allowance regex semantics instead of
//! disallow-path-prefix semantics.

use regex::Regex;

/// Immutable once constructed: `{exceptions, allowances}`.
pub struct UrlValidator {
    exceptions: Vec<Regex>,
    allowances: Vec<Regex>,
}

impl UrlValidator {
    /// Compile two rule lists. Each element is trimmed; empty strings are
    /// dropped; a pattern that fails to compile is logged and silently
    /// omitted (§7: "Bad regex in validator rules: skip that rule").
    pub fn new(exceptions: &[String], allowances: &[String]) -> Self {
        UrlValidator {
            exceptions: compile_rules(exceptions),
            allowances: compile_rules(allowances),
        }
    }

    /// Build a validator from newline-separated rule strings, as stored on a
    /// crawling task (§3 "Crawling task").
    pub fn from_newline_separated(exceptions: Option<&str>, allowances: Option<&str>) -> Self {
        let split = |s: Option<&str>| -> Vec<String> {
            s.map(|s| s.lines().map(str::to_string).collect())
                .unwrap_or_default()
        };
        Self::new(&split(exceptions), &split(allowances))
    }

    /// An empty exceptions list admits everything. Otherwise, a matching
    /// exception is only overridden by a matching allowance.
    pub fn is_valid(&self, url: &str) -> bool {
        if self.exceptions.is_empty() {
            return true;
        }
        let hits_exception = self.exceptions.iter().any(|re| re.is_match(url));
        if !hits_exception {
            return true;
        }
        self.allowances.iter().any(|re| re.is_match(url))
    }
}

fn compile_rules(rules: &[String]) -> Vec<Regex> {
    rules
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Regex::new(s) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern = %s, error = %e, "dropping unparseable validator rule");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rules_always_valid() {
        let v = UrlValidator::new(&[], &[]);
        assert!(v.is_valid("https://anything.example/"));
    }

    #[test]
    fn exception_without_allowance_blocks() {
        let v = UrlValidator::new(&["^https://blocked\\.com.*$".to_string()], &[]);
        assert!(!v.is_valid("https://blocked.com/x"));
        assert!(v.is_valid("https://ok.com/x"));
    }

    #[test]
    fn allowance_overrides_exception() {
        let v = UrlValidator::new(
            &["^ftp://.*$".to_string()],
            &["ftp".to_string()],
        );
        assert!(v.is_valid("ftp://f.com"));
    }

    #[test]
    fn bad_regex_is_dropped_not_fatal() {
        let v = UrlValidator::new(&["[unterminated".to_string()], &[]);
        assert!(v.is_valid("https://anything.example/"));
    }

    #[test]
    fn trims_and_drops_empty_entries() {
        let v = UrlValidator::new(
            &["  ".to_string(), "^https://x\\.com.*$".to_string()],
            &[],
        );
        assert!(!v.is_valid("https://x.com/a"));
    }

    #[test]
    fn from_newline_separated_rules() {
        let v = UrlValidator::from_newline_separated(
            Some("^https://a\\.com.*$\n^https://b\\.com.*$"),
            Some("^https://b\\.com/allowed$"),
        );
        assert!(!v.is_valid("https://a.com/x"));
        assert!(!v.is_valid("https://b.com/blocked"));
        assert!(v.is_valid("https://b.com/allowed"));
    }
}
