//! Tag priorities
//!
//! The tail resolver asks a [`PriorityLookup`] how important a tag is; lower
//! values win. [`PriorityTable`] is the configured implementation: exact
//! tags first, then slash-delimited regex keys in configuration order, then
//! the default.

use crate::error::PriorityError;
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

/// Priority used when nothing matches and no default is configured
pub const DEFAULT_PRIORITY: i64 = 99_999;

/// Priority of the empty tag (an untailed title)
pub const EMPTY_TAG_PRIORITY: i64 = -1;

/// Configuration key holding the default priority
pub const DEFAULT_KEY: &str = "";

/// Tag to priority lookup; lower is more important
pub trait PriorityLookup: Send + Sync {
    /// Priority of `tag`
    fn priority(&self, tag: &str) -> i64;
}

impl<F> PriorityLookup for F
where
    F: Fn(&str) -> i64 + Send + Sync,
{
    fn priority(&self, tag: &str) -> i64 {
        self(tag)
    }
}

/// Configured priority table
#[derive(Debug, Clone, Default)]
pub struct PriorityTable {
    exact: HashMap<String, i64>,
    patterns: Vec<(Regex, i64)>,
    default: Option<i64>,
}

impl PriorityTable {
    /// Empty table: every tag gets [`DEFAULT_PRIORITY`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an ordered configuration map
    ///
    /// `""` sets the default, `/regex/flags` keys are patterns, anything
    /// else is an exact tag.
    ///
    /// # Errors
    /// Returns [`PriorityError`] when a pattern key does not compile.
    pub fn from_entries(entries: &IndexMap<String, i64>) -> Result<Self, PriorityError> {
        let mut table = Self::new();
        for (key, &value) in entries {
            if key == DEFAULT_KEY {
                table.default = Some(value);
            } else if let Some(pattern) = compile_pattern_key(key)? {
                table.patterns.push((pattern, value));
            } else {
                table.exact.insert(key.clone(), value);
            }
        }
        Ok(table)
    }

    /// With an exact tag priority
    #[must_use]
    pub fn with_exact(mut self, tag: impl Into<String>, priority: i64) -> Self {
        self.exact.insert(tag.into(), priority);
        self
    }

    /// With a pattern priority, appended after existing patterns
    ///
    /// # Errors
    /// Returns [`PriorityError::InvalidPattern`] when `pattern` does not compile.
    pub fn with_pattern(mut self, pattern: &str, priority: i64) -> Result<Self, PriorityError> {
        let re = Regex::new(pattern).map_err(|source| PriorityError::InvalidPattern {
            key: pattern.to_string(),
            source,
        })?;
        self.patterns.push((re, priority));
        Ok(self)
    }

    /// With the fallback priority
    #[inline]
    #[must_use]
    pub fn with_default(mut self, priority: i64) -> Self {
        self.default = Some(priority);
        self
    }

    /// Number of exact and pattern entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    /// True when only the default applies
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PriorityLookup for PriorityTable {
    fn priority(&self, tag: &str) -> i64 {
        if tag.is_empty() {
            return EMPTY_TAG_PRIORITY;
        }

        if let Some(&value) = self.exact.get(tag) {
            return value;
        }

        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(tag))
            .map(|(_, value)| *value)
            .or(self.default)
            .unwrap_or(DEFAULT_PRIORITY)
    }
}

/// Compile a `/body/flags` key; `Ok(None)` when the key is not a pattern
fn compile_pattern_key(key: &str) -> Result<Option<Regex>, PriorityError> {
    let Some(rest) = key.strip_prefix('/') else {
        return Ok(None);
    };
    let Some(end) = rest.rfind('/') else {
        return Ok(None);
    };

    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            other => {
                return Err(PriorityError::UnsupportedFlag {
                    key: key.to_string(),
                    flag: other,
                })
            }
        };
    }

    builder
        .build()
        .map(Some)
        .map_err(|source| PriorityError::InvalidPattern {
            key: key.to_string(),
            source,
        })
}
