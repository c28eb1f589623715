//! `{{key}}` placeholder values and substitution.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Placeholder values keyed by name (without braces).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
}

impl Placeholders {
    /// Create an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is known.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every known `{{key}}` in `text`.
    ///
    /// Unknown tokens are left as they are. Returns the new text and the
    /// number of replacements made.
    pub fn substitute(&self, text: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut count = 0;
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(text) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if let Some(value) = self.get(key.as_str()) {
                out.push_str(&text[last..whole.start()]);
                out.push_str(value);
                last = whole.end();
                count += 1;
            }
        }

        out.push_str(&text[last..]);
        (out, count)
    }
}

/// Placeholder names appearing in `text`, in order of appearance.
pub fn placeholder_keys(text: &str) -> impl Iterator<Item = &str> {
    placeholder_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}
