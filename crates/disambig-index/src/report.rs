//! Value types returned by the collision index

use disambig_core::{PageTitle, Tags};
use indexmap::IndexMap;
use serde::Serialize;

/// Related heads to merge into a disambiguation listing, keyed by display
/// head; an empty description pulls in that head's whole collision set
pub type RelatedHeads = IndexMap<String, String>;

/// Outcome of a near-match lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NearMatch {
    /// No indexed page shares the head
    NoMatch,
    /// Exactly one indexed page shares the head
    Unique(PageTitle),
    /// Several pages share the head; show a listing for it
    Ambiguous {
        /// Head that needs a listing
        head: String,
    },
}

impl NearMatch {
    /// Whether the lookup found anything
    #[inline]
    #[must_use]
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }
}

/// One page in a conflict report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictEntry {
    /// Page id
    pub id: u64,
    /// Display name the page currently has
    pub current: String,
    /// Display name with the computed minimal tail
    pub proposed: String,
    /// Declared tags
    pub tags: Tags,
    /// Tail still shared with another page
    pub unsolved: bool,
    /// Page should be renamed to `proposed`
    pub needs_move: bool,
    /// Page is a redirect
    pub is_redirect: bool,
    /// Redirect target, for redirects
    pub redirect_target: Option<u64>,
}

/// Naming conflicts among pages sharing one head
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    /// Namespace of the collision
    pub namespace: i32,
    /// Normalized head of the collision
    pub head: String,
    /// One entry per page, id order
    pub entries: Vec<ConflictEntry>,
}

impl ConflictReport {
    /// Entries whose tail is still shared
    pub fn unsolved(&self) -> impl Iterator<Item = &ConflictEntry> {
        self.entries.iter().filter(|entry| entry.unsolved)
    }

    /// Entries that should be renamed
    pub fn moves(&self) -> impl Iterator<Item = &ConflictEntry> {
        self.entries.iter().filter(|entry| entry.needs_move)
    }

    /// Whether every page already has a unique, correctly ranked name
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| !entry.unsolved && !entry.needs_move)
    }
}

/// One row of a disambiguation listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// Page id
    pub id: u64,
    /// Display name of the page
    pub title: String,
    /// Short description: the declared state, or the tags when none
    pub label: Option<String>,
}

/// A tagged head shared by several records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadCount {
    /// Namespace of the records
    pub namespace: i32,
    /// Normalized head
    pub head: String,
    /// Number of tagged records with this head
    pub count: usize,
}

/// Untagged records whose full titles normalize to the same key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SameNameGroup {
    /// Namespace of the records
    pub namespace: i32,
    /// Shared search key
    pub search_key: String,
    /// Page ids, ascending
    pub ids: Vec<u64>,
}

/// Pages a redirect's own name also refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectListing {
    /// Page id of the redirect
    pub id: u64,
    /// Display name of the redirect
    pub title: String,
    /// Other pages sharing the redirect's name
    pub entries: Vec<ListingEntry>,
}
