//! Allow-list of selector tokens that survive purging.
//!
//! Tokens are stored in normalized prefixed form: `.name` for classes,
//! `#name` for ids, the bare name for tags.

use regex::Regex;
use std::collections::HashSet;

/// Tokens every allow-list accepts.
pub const GLOBAL_SAFELIST: [&str; 4] = [":root", "*", "html", "body"];

/// A single allow-list entry.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Matched by exact string equality.
    Literal(String),
    /// Matched anywhere in the candidate (use anchors for whole-token matches).
    Pattern(Regex),
}

impl Matcher {
    #[inline]
    pub fn literal(token: &str) -> Self {
        Self::Literal(token.to_owned())
    }

    /// Compile a regular-expression matcher.
    ///
    /// # Errors
    /// Returns the regex compilation error for invalid patterns.
    #[inline]
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self::Pattern)
    }

    #[inline]
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(token) => token == candidate,
            Self::Pattern(pattern) => pattern.is_match(candidate),
        }
    }
}

/// Literal tokens indexed in a hash set, patterns tried in insertion order.
#[derive(Clone, Debug)]
pub struct AllowList {
    literals: HashSet<String>,
    patterns: Vec<Matcher>,
}

impl Default for AllowList {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl AllowList {
    /// An allow-list holding only the global entries.
    pub fn new() -> Self {
        Self {
            literals: GLOBAL_SAFELIST.iter().map(|token| (*token).to_owned()).collect(),
            patterns: Vec::new(),
        }
    }

    pub fn insert(&mut self, matcher: Matcher) {
        match matcher {
            Matcher::Literal(token) => {
                self.literals.insert(token);
            }
            pattern @ Matcher::Pattern(_) => self.patterns.push(pattern),
        }
    }

    pub fn insert_literal(&mut self, token: &str) {
        self.literals.insert(token.to_owned());
    }

    /// Whether `candidate` (already in prefixed form) is allowed.
    pub fn matches(&self, candidate: &str) -> bool {
        self.literals.contains(candidate)
            || self.patterns.iter().any(|pattern| pattern.matches(candidate))
    }

    /// Number of literal entries, including the global ones.
    #[inline]
    pub fn literal_count(&self) -> usize {
        self.literals.len()
    }

    #[inline]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl Extend<Matcher> for AllowList {
    fn extend<T: IntoIterator<Item = Matcher>>(&mut self, iter: T) {
        for matcher in iter {
            self.insert(matcher);
        }
    }
}

impl FromIterator<Matcher> for AllowList {
    fn from_iter<T: IntoIterator<Item = Matcher>>(iter: T) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globals_are_always_present() {
        let list = AllowList::new();
        for token in GLOBAL_SAFELIST {
            assert!(list.matches(token));
        }
        assert!(!list.matches("p"));
    }

    #[test]
    fn literals_and_patterns() {
        let mut list: AllowList = [Matcher::literal("#not-included"), Matcher::literal("form")]
            .into_iter()
            .collect();
        if let Ok(pattern) = Matcher::pattern(r"^(a|span)$") {
            list.insert(pattern);
        }
        if let Ok(pattern) = Matcher::pattern(r"#main-\d+") {
            list.insert(pattern);
        }
        assert!(list.matches("form"));
        assert!(list.matches("#not-included"));
        assert!(list.matches("span"));
        assert!(!list.matches("spans"));
        assert!(list.matches("#main-42"));
        assert!(!list.matches(".main-42"));
        assert_eq!(list.pattern_count(), 2);
        assert_eq!(list.literal_count(), GLOBAL_SAFELIST.len() + 2);
    }

    #[test]
    fn invalid_patterns_are_reported() {
        assert!(matches!(Matcher::pattern("(unclosed"), Err(_)));
    }
}
