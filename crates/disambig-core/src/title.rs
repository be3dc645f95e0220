//! Title decomposition and recomposition
//!
//! A display name has the shape
//!
//! ```text
//! [Namespace:]head[（tail）][.ext]
//! ```
//!
//! [`TitleGrammar`] splits raw title text into head, tail and extension, and
//! joins an [`Entity`] back into a display name. The tail delimiters default
//! to the full-width bracket pair.

use crate::entity::{Entity, PageTitle, Tags, DEFAULT_TAG_SEPARATOR};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest extension (letters after the dot) recognised in extension namespaces
pub const MAX_EXTENSION_LEN: usize = 5;

/// Namespace holding uploaded files
pub const FILE_NAMESPACE: i32 = 6;

/// Delimiters of the tail grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailDelimiters {
    /// Opens a wrapped tail
    pub prefix: String,

    /// Closes a wrapped tail
    pub suffix: String,

    /// Joins a tag list inside one wrapped tail
    pub list_separator: String,
}

impl Default for TailDelimiters {
    fn default() -> Self {
        Self {
            prefix: "\u{FF08}".to_string(),
            suffix: "\u{FF09}".to_string(),
            list_separator: "\u{FF0C}".to_string(),
        }
    }
}

/// Result of [`TitleGrammar::split`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitTitle {
    /// Trimmed head
    pub head: String,

    /// Tail found inside the delimiters, empty when none
    pub tail: String,

    /// Extension including the dot, empty when none
    pub extension: String,
}

/// Title grammar: delimiters, tag separator and namespace naming
#[derive(Debug, Clone)]
pub struct TitleGrammar {
    delimiters: TailDelimiters,
    tag_separator: char,
    namespace_names: BTreeMap<i32, String>,
    extension_namespaces: Vec<i32>,
    any_tail: Option<Regex>,
}

impl TitleGrammar {
    /// Create grammar with explicit delimiters
    #[must_use]
    pub fn new(delimiters: TailDelimiters, tag_separator: char) -> Self {
        let pattern = format!(
            "^(.*){}(.*){}$",
            regex::escape(&delimiters.prefix),
            regex::escape(&delimiters.suffix),
        );
        let any_tail = match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!("tail pattern rejected, titles will be tail-less: {}", err);
                None
            }
        };

        Self {
            any_tail,
            delimiters,
            tag_separator,
            namespace_names: BTreeMap::new(),
            extension_namespaces: vec![FILE_NAMESPACE],
        }
    }

    /// With a display name for a namespace
    #[must_use]
    pub fn with_namespace(mut self, namespace: i32, name: impl Into<String>) -> Self {
        self.namespace_names.insert(namespace, name.into());
        self
    }

    /// With the set of namespaces whose titles carry extensions
    #[must_use]
    pub fn with_extension_namespaces(mut self, namespaces: impl IntoIterator<Item = i32>) -> Self {
        self.extension_namespaces = namespaces.into_iter().collect();
        self
    }

    /// Tail delimiters
    #[inline]
    #[must_use]
    pub fn delimiters(&self) -> &TailDelimiters {
        &self.delimiters
    }

    /// Separator of the stored tag form
    #[inline]
    #[must_use]
    pub fn tag_separator(&self) -> char {
        self.tag_separator
    }

    /// Whether titles in `namespace` may end in an extension
    #[inline]
    #[must_use]
    pub fn is_extension_namespace(&self, namespace: i32) -> bool {
        self.extension_namespaces.contains(&namespace)
    }

    /// Split raw title text into head, tail and extension
    ///
    /// When `known_tags` is non-empty only those tags are recognised as a
    /// tail; otherwise any wrapped text at the end is.
    #[must_use]
    pub fn split(&self, text: &str, known_tags: &Tags, is_extension_namespace: bool) -> SplitTitle {
        let (text, extension) = if is_extension_namespace {
            split_extension(text)
        } else {
            (text, "")
        };

        let (head, tail) = if known_tags.is_empty() {
            self.any_tail(text)
        } else {
            self.known_tail(text, known_tags)
        }
        .unwrap_or((text, ""));

        SplitTitle {
            head: head.trim().to_string(),
            tail: tail.trim().to_string(),
            extension: extension.to_string(),
        }
    }

    fn any_tail<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        let caps = self.any_tail.as_ref()?.captures(text)?;
        Some((
            caps.get(1).map_or("", |m| m.as_str()),
            caps.get(2).map_or("", |m| m.as_str()),
        ))
    }

    /// Longest head followed by one of `known_tags` in delimiters
    fn known_tail<'t>(&self, text: &'t str, known_tags: &Tags) -> Option<(&'t str, &'t str)> {
        let inner = text.strip_suffix(self.delimiters.suffix.as_str())?;
        known_tags
            .iter()
            .filter_map(|tag| {
                let head = inner
                    .strip_suffix(tag)?
                    .strip_suffix(self.delimiters.prefix.as_str())?;
                Some((head, &inner[inner.len() - tag.len()..]))
            })
            .max_by_key(|(head, _)| head.len())
    }

    /// Wrap a tail in the delimiters; empty stays empty
    #[must_use]
    pub fn wrap(&self, tail: &str) -> String {
        let tail = tail.trim();
        if tail.is_empty() {
            String::new()
        } else {
            format!("{}{}{}", self.delimiters.prefix, tail, self.delimiters.suffix)
        }
    }

    /// Wrap a whole tag list in one pair of delimiters
    #[must_use]
    pub fn wrap_tags(&self, tags: &Tags) -> String {
        self.wrap(&tags.joined(&self.delimiters.list_separator))
    }

    /// Display prefix of a namespace (`"Name:"`), empty for the main namespace
    #[must_use]
    pub fn prefix(&self, namespace: i32) -> String {
        if namespace == 0 {
            return String::new();
        }
        self.namespace_names
            .get(&namespace)
            .map(|name| format!("{name}:"))
            .unwrap_or_default()
    }

    /// Head with namespace prefix
    #[must_use]
    pub fn prefixed_head(&self, entity: &Entity) -> String {
        format!("{}{}", self.prefix(entity.namespace()), entity.head())
    }

    /// Display name with the assigned tail
    #[must_use]
    pub fn join(&self, entity: &Entity) -> String {
        format!(
            "{}{}{}",
            self.prefixed_head(entity),
            self.wrap(entity.tail()),
            entity.extension()
        )
    }

    /// Display name with every declared tag instead of the assigned tail
    #[must_use]
    pub fn join_tags(&self, entity: &Entity) -> String {
        format!(
            "{}{}{}",
            self.prefixed_head(entity),
            self.wrap_tags(entity.tags()),
            entity.extension()
        )
    }

    /// One-line declaration: tagged name and state
    #[must_use]
    pub fn describe(&self, entity: &Entity) -> String {
        format!("{} - {}", self.join_tags(entity), entity.state())
    }

    /// Display form of a page title
    #[must_use]
    pub fn display(&self, title: &PageTitle) -> String {
        format!("{}{}", self.prefix(title.namespace), title.text)
    }

    /// Split `Name:text` into namespace and text
    ///
    /// Unknown prefixes are part of the text in the main namespace.
    #[must_use]
    pub fn parse_prefixed(&self, display: &str) -> (i32, String) {
        if let Some((name, rest)) = display.split_once(':') {
            let name = name.trim();
            let namespace = self
                .namespace_names
                .iter()
                .find(|(ns, known)| **ns != 0 && known.as_str() == name)
                .map(|(ns, _)| *ns);
            if let Some(namespace) = namespace {
                return (namespace, rest.trim().to_string());
            }
        }
        (0, display.trim().to_string())
    }

    /// Head of `text` with any wrapped tail removed
    #[must_use]
    pub fn strip_tail(&self, text: &str) -> String {
        self.split(text, &Tags::empty(), false).head
    }

    /// Decompose `text` into `entity`, recognising only its declared tags
    pub fn decompose_into(&self, entity: &mut Entity, text: &str) {
        let split = self.split(
            text,
            entity.tags(),
            self.is_extension_namespace(entity.namespace()),
        );
        entity.set_head(&split.head);
        entity.set_tail(&split.tail);
        entity.set_extension(split.extension);
    }

    /// Build an entity from a page title
    ///
    /// With `infer_tags`, a title that declares no tags but carries a tail
    /// adopts that tail as its declared tags.
    #[must_use]
    pub fn entity_from_title(
        &self,
        title: &PageTitle,
        tags: Tags,
        state: &str,
        infer_tags: bool,
    ) -> Entity {
        let mut entity = Entity::new(title.namespace, "")
            .with_tags(tags)
            .with_state(state)
            .with_id(title.id)
            .with_redirect(title.is_redirect);

        self.decompose_into(&mut entity, &title.text);

        if infer_tags && !entity.has_tags() && entity.has_tail() {
            let inferred = Tags::parse(entity.tail(), self.tag_separator);
            entity.set_tags(inferred);
        }

        entity
    }
}

impl Default for TitleGrammar {
    fn default() -> Self {
        Self::new(TailDelimiters::default(), DEFAULT_TAG_SEPARATOR)
    }
}

/// Split off a trailing `.` followed by 1-5 ASCII letters
fn split_extension(text: &str) -> (&str, &str) {
    match text.rfind('.') {
        Some(dot) => {
            let letters = &text[dot + 1..];
            if (1..=MAX_EXTENSION_LEN).contains(&letters.len())
                && letters.bytes().all(|b| b.is_ascii_alphabetic())
            {
                (&text[..dot], &text[dot..])
            } else {
                (text, "")
            }
        }
        None => (text, ""),
    }
}
