//! Error types for the disambiguation core
//!
//! The core algorithms are total; the only failures are construction-time
//! precondition violations:
//! - Tags that contain the tag separator
//! - Priority patterns that do not compile

/// Errors raised while building a tag sequence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// A tag still contains the separator after trimming
    #[error("tag '{tag}' contains the tag separator '{separator}'")]
    ContainsSeparator {
        /// Offending tag (trimmed)
        tag: String,
        /// Configured separator
        separator: char,
    },
}

impl TagError {
    /// Create separator violation error
    pub fn contains_separator(tag: impl Into<String>, separator: char) -> Self {
        Self::ContainsSeparator {
            tag: tag.into(),
            separator,
        }
    }
}

/// Errors raised while building a priority table
#[derive(Debug, thiserror::Error)]
pub enum PriorityError {
    /// Pattern key did not compile
    #[error("invalid priority pattern '{key}': {source}")]
    InvalidPattern {
        /// Raw configuration key, slashes included
        key: String,
        #[source]
        source: regex::Error,
    },

    /// Pattern key carries a flag we do not understand
    #[error("unsupported flag '{flag}' in priority pattern '{key}'")]
    UnsupportedFlag {
        /// Raw configuration key
        key: String,
        /// Offending flag character
        flag: char,
    },
}
