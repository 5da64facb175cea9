use crate::utils::is_empty_or_whitespace;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

// `regex` compiles to a finite automaton, so matching is linear in the length
// of the input and cannot backtrack catastrophically.
static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    RegexBuilder::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .case_insensitive(true)
        .build()
        .ok()
});

/// Returns `true` when `s` looks like `local-part@domain.tld`.
///
/// Fails closed: if the pattern is unavailable the address is considered invalid.
pub fn is_valid_email(s: &str) -> bool {
    if is_empty_or_whitespace(s) {
        return false;
    }

    match EMAIL_PATTERN.as_ref() {
        Some(pattern) => pattern.is_match(s),
        None => {
            tracing::error!("Email validation pattern failed to compile.");
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<SubscriberEmail, String> {
        if is_valid_email(&s) {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid subscriber email.", s))
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
