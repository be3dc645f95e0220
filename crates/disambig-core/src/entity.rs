//! Decomposed titles and their tag sequences
//!
//! An [`Entity`] is a page title split into a collision key (namespace +
//! head), the tail it currently carries, and the ordered [`Tags`] it declares
//! as disambiguation capability.

use crate::error::TagError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Separator between tags in their stored form
pub const DEFAULT_TAG_SEPARATOR: char = '|';

/// Ordered disambiguation tags, broadest first
///
/// Every element is trimmed and non-empty. Deserialization goes through
/// [`Tags::try_new`] with [`DEFAULT_TAG_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl TryFrom<Vec<String>> for Tags {
    type Error = TagError;

    fn try_from(items: Vec<String>) -> Result<Self, Self::Error> {
        Self::try_new(items, DEFAULT_TAG_SEPARATOR)
    }
}

impl From<Tags> for Vec<String> {
    fn from(tags: Tags) -> Self {
        tags.0
    }
}

impl Tags {
    /// Empty tag sequence
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Parse the stored, separator-joined form
    ///
    /// Never fails: segments are trimmed and empty segments dropped.
    #[must_use]
    pub fn parse(raw: &str, separator: char) -> Self {
        Self(
            raw.split(separator)
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Build from individual tags
    ///
    /// # Errors
    /// Returns [`TagError::ContainsSeparator`] if a trimmed tag contains
    /// `separator`.
    pub fn try_new<I, S>(items: I, separator: char) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = Vec::new();
        for item in items {
            let tag = item.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            if tag.contains(separator) {
                return Err(TagError::contains_separator(tag, separator));
            }
            tags.push(tag.to_string());
        }
        Ok(Self(tags))
    }

    /// Stored form, joined with `separator`
    #[must_use]
    pub fn joined(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    /// Tag at a layer index
    #[inline]
    #[must_use]
    pub fn get(&self, layer: usize) -> Option<&str> {
        self.0.get(layer).map(String::as_str)
    }

    /// Broadest tag
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    /// Whether `tag` is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Number of tags (layer depth)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no disambiguation capability is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate tags broadest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tags as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A page as the host knows it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageTitle {
    /// Namespace identifier
    pub namespace: i32,

    /// Title text without namespace prefix
    pub text: String,

    /// Backing page id (0 when the page does not exist)
    #[serde(default)]
    pub id: u64,

    /// Whether the page is a redirect
    #[serde(default)]
    pub is_redirect: bool,
}

impl PageTitle {
    /// Title of a page that is not stored yet
    #[inline]
    #[must_use]
    pub fn new(namespace: i32, text: impl Into<String>) -> Self {
        Self {
            namespace,
            text: text.into(),
            id: 0,
            is_redirect: false,
        }
    }

    /// With backing page id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// With redirect flag
    #[inline]
    #[must_use]
    pub fn with_redirect(mut self, is_redirect: bool) -> Self {
        self.is_redirect = is_redirect;
        self
    }

    /// Whether a backing page exists
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.id > 0
    }
}

/// Decomposed title
///
/// Constructed by decomposition ([`crate::title::TitleGrammar::entity_from_title`])
/// or loaded from a stored record. Mutated only through its setters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entity {
    namespace: i32,
    head: String,
    #[serde(default)]
    tail: String,
    #[serde(default)]
    extension: String,
    #[serde(default)]
    tags: Tags,
    #[serde(default)]
    state: String,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    is_redirect: bool,
    #[serde(default)]
    search_key: String,
}

impl Entity {
    /// Create entity with a collision key and nothing else
    #[must_use]
    pub fn new(namespace: i32, head: impl AsRef<str>) -> Self {
        Self {
            namespace,
            head: head.as_ref().trim().to_string(),
            ..Self::default()
        }
    }

    /// With declared tags
    #[inline]
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// With assigned tail
    #[inline]
    #[must_use]
    pub fn with_tail(mut self, tail: impl AsRef<str>) -> Self {
        self.set_tail(tail);
        self
    }

    /// With verbatim extension
    #[inline]
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// With state description
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: impl AsRef<str>) -> Self {
        self.set_state(state);
        self
    }

    /// With backing page id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// With redirect flag
    #[inline]
    #[must_use]
    pub fn with_redirect(mut self, is_redirect: bool) -> Self {
        self.is_redirect = is_redirect;
        self
    }

    /// Namespace identifier
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> i32 {
        self.namespace
    }

    /// Collision head
    #[inline]
    #[must_use]
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Assigned tail
    #[inline]
    #[must_use]
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Verbatim extension, dot included
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Declared tags
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// State description
    #[inline]
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Backing page id, 0 when not persisted
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the backing page is a redirect
    #[inline]
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        self.is_redirect
    }

    /// Normalized full name used by prefix search
    #[inline]
    #[must_use]
    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    /// Replace the namespace
    pub fn set_namespace(&mut self, namespace: i32) {
        self.namespace = namespace;
    }

    /// Replace the head, trimmed
    pub fn set_head(&mut self, head: impl AsRef<str>) {
        self.head = head.as_ref().trim().to_string();
    }

    /// Replace the tail, trimmed
    pub fn set_tail(&mut self, tail: impl AsRef<str>) {
        self.tail = tail.as_ref().trim().to_string();
    }

    /// Replace the extension (dot included)
    pub fn set_extension(&mut self, extension: impl Into<String>) {
        self.extension = extension.into();
    }

    /// Replace the declared tags
    pub fn set_tags(&mut self, tags: Tags) {
        self.tags = tags;
    }

    /// Replace the state, trimmed
    pub fn set_state(&mut self, state: impl AsRef<str>) {
        self.state = state.as_ref().trim().to_string();
    }

    /// Replace the backing page id
    pub fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    /// Replace the redirect flag
    pub fn set_redirect(&mut self, is_redirect: bool) {
        self.is_redirect = is_redirect;
    }

    /// Replace the search key, trimmed
    pub fn set_search_key(&mut self, search_key: impl AsRef<str>) {
        self.search_key = search_key.as_ref().trim().to_string();
    }

    /// Whether the head is non-empty
    #[inline]
    #[must_use]
    pub fn has_head(&self) -> bool {
        !self.head.is_empty()
    }

    /// Whether a tail is assigned
    #[inline]
    #[must_use]
    pub fn has_tail(&self) -> bool {
        !self.tail.is_empty()
    }

    /// Whether any tags are declared
    #[inline]
    #[must_use]
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Whether a state is declared
    #[inline]
    #[must_use]
    pub fn has_state(&self) -> bool {
        !self.state.is_empty()
    }

    /// Whether a backing page id is known
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.head)?;
        if self.has_tail() {
            write!(f, " [{}]", self.tail)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_empty() {
        let tags = Tags::parse(" person | |singer|", '|');
        assert_eq!(tags.as_slice(), &["person", "singer"]);
    }

    #[test]
    fn parse_empty_string_is_empty() {
        assert!(Tags::parse("", '|').is_empty());
    }

    #[test]
    fn try_new_rejects_separator() {
        let err = Tags::try_new(["ok", " a|b "], '|').unwrap_err();
        assert_eq!(err, TagError::contains_separator("a|b", '|'));
    }

    #[test]
    fn try_new_drops_blank_items() {
        let tags = Tags::try_new(["", "  ", "x"], '|').unwrap();
        assert_eq!(tags.as_slice(), &["x"]);
    }

    #[test]
    fn tags_joined_round_trips_through_parse() {
        let tags = Tags::try_new(["a", "b", "c"], '|').unwrap();
        assert_eq!(Tags::parse(&tags.joined("|"), '|'), tags);
    }

    #[test]
    fn entity_setters_trim() {
        let mut entity = Entity::new(0, "  Head ");
        entity.set_tail(" tail ");
        entity.set_state(" state ");

        assert_eq!(entity.head(), "Head");
        assert_eq!(entity.tail(), "tail");
        assert_eq!(entity.state(), "state");
    }

    #[test]
    fn entity_persistence_flag() {
        assert!(!Entity::new(0, "a").is_persisted());
        assert!(Entity::new(0, "a").with_id(4).is_persisted());
    }

    #[test]
    fn entity_display_shows_tail() {
        let entity = Entity::new(0, "Mercury").with_tail("planet");
        assert_eq!(entity.to_string(), "0:Mercury [planet]");
    }

    #[test]
    fn page_title_exists_only_with_id() {
        assert!(!PageTitle::new(0, "A").exists());
        assert!(PageTitle::new(0, "A").with_id(1).exists());
    }

    #[test]
    fn tags_deserialize_through_validation() {
        let tags: Tags = serde_json::from_str(r#"[" a ", "", "b"]"#).unwrap();
        assert_eq!(tags.as_slice(), &["a", "b"]);

        let err = serde_json::from_str::<Tags>(r#"["a|b"]"#).unwrap_err();
        assert!(err.to_string().contains("tag separator"));
    }

    #[test]
    fn tags_serialize_as_plain_list() {
        let tags = Tags::try_new(["a", "b"], '|').unwrap();
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn entity_with_invalid_tags_is_rejected() {
        let json = r#"{"namespace": 0, "head": "mercury", "tags": ["x|y"]}"#;
        assert!(serde_json::from_str::<Entity>(json).is_err());
    }
}
