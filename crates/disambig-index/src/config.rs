//! Index configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! tag_separator = "|"
//! extension_namespaces = [6]
//! disabled_namespaces = [2, 8]
//!
//! [delimiters]
//! prefix = "（"
//! suffix = "）"
//! list_separator = "，"
//!
//! [namespaces]
//! File = 6
//!
//! [priorities]
//! "" = 100
//! planet = 1
//! "/^album/i" = 5
//!
//! [cache]
//! capacity = 10000
//! ttl_secs = 2592000
//! ```

use crate::error::ConfigError;
use disambig_core::{
    PriorityError, PriorityTable, TailDelimiters, TitleGrammar, DEFAULT_TAG_SEPARATOR,
    FILE_NAMESPACE,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default cache capacity per cache
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default cache time-to-live: 30 days
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Namespaces the index ignores by default (user pages and system messages)
pub const DEFAULT_DISABLED_NAMESPACES: [i32; 2] = [2, 8];

/// Cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries per cache
    pub capacity: u64,
    /// Entry time-to-live in seconds
    pub ttl_secs: u64,
}

impl CacheConfig {
    /// Time-to-live as a duration
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambigConfig {
    /// Separator between declared tags
    pub tag_separator: char,

    /// Namespaces whose titles may end in a file extension
    pub extension_namespaces: Vec<i32>,

    /// Namespaces excluded from indexing and resolution
    pub disabled_namespaces: Vec<i32>,

    /// Tail delimiters
    pub delimiters: TailDelimiters,

    /// Namespace display names, keyed by name
    pub namespaces: BTreeMap<String, i32>,

    /// Ordered tag priorities; see [`PriorityTable::from_entries`]
    pub priorities: IndexMap<String, i64>,

    /// Cache sizing
    pub cache: CacheConfig,
}

impl Default for DisambigConfig {
    fn default() -> Self {
        Self {
            tag_separator: DEFAULT_TAG_SEPARATOR,
            extension_namespaces: vec![FILE_NAMESPACE],
            disabled_namespaces: DEFAULT_DISABLED_NAMESPACES.to_vec(),
            delimiters: TailDelimiters::default(),
            namespaces: BTreeMap::from([("File".to_string(), FILE_NAMESPACE)]),
            priorities: IndexMap::new(),
            cache: CacheConfig::default(),
        }
    }
}

impl DisambigConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input and
    /// [`ConfigError::Priority`] when a priority pattern does not compile.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.priority_table()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// as [`Self::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|source| ConfigError::io_error(path, source))?;
        tracing::debug!(path = %path.display(), "loading disambiguation config");
        Self::from_toml_str(&text)
    }

    /// With a tag priority appended to the table
    #[must_use]
    pub fn with_priority(mut self, key: impl Into<String>, priority: i64) -> Self {
        self.priorities.insert(key.into(), priority);
        self
    }

    /// With a namespace display name
    #[must_use]
    pub fn with_namespace(mut self, name: impl Into<String>, namespace: i32) -> Self {
        self.namespaces.insert(name.into(), namespace);
        self
    }

    /// With the set of disabled namespaces
    #[must_use]
    pub fn with_disabled_namespaces(mut self, namespaces: impl IntoIterator<Item = i32>) -> Self {
        self.disabled_namespaces = namespaces.into_iter().collect();
        self
    }

    /// With cache sizing
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Whether `namespace` is excluded from the index
    #[inline]
    #[must_use]
    pub fn is_disabled(&self, namespace: i32) -> bool {
        self.disabled_namespaces.contains(&namespace)
    }

    /// Title grammar described by this configuration
    #[must_use]
    pub fn grammar(&self) -> TitleGrammar {
        self.namespaces.iter().fold(
            TitleGrammar::new(self.delimiters.clone(), self.tag_separator)
                .with_extension_namespaces(self.extension_namespaces.iter().copied()),
            |grammar, (name, &namespace)| grammar.with_namespace(namespace, name.clone()),
        )
    }

    /// Compiled priority table
    ///
    /// # Errors
    /// Returns [`PriorityError`] when a pattern key does not compile.
    pub fn priority_table(&self) -> Result<PriorityTable, PriorityError> {
        PriorityTable::from_entries(&self.priorities)
    }
}
