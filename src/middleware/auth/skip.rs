//! Paths that bypass bearer authentication.
//!
//! Pattern forms:
//! - `/api/v1/ping`       exact match
//! - `/api/v1/public/**`  the prefix itself and anything below it

#[derive(Debug, Clone, Default)]
pub struct SkipMatcher {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl SkipMatcher {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            match pattern.strip_suffix("/**") {
                Some(prefix) => matcher.prefixes.push(prefix.to_string()),
                None => matcher.exact.push(pattern.to_string()),
            }
        }
        matcher
    }

    pub fn matches(&self, path: &str) -> bool {
        self.exact.iter().any(|p| p == path)
            || self.prefixes.iter().any(|prefix| {
                path.strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }
}
