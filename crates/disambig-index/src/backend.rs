//! Storage and page directory seams
//!
//! The index never talks to a database directly. Persisted records come
//! from an [`IndexBackend`]; facts about pages (titles, redirects,
//! disambiguation markers) come from a [`PageDirectory`].

use crate::error::BackendError;
use crate::report::{HeadCount, SameNameGroup};
use disambig_core::{Entity, PageTitle};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Persistent store of declared entities, one record per page id
///
/// Records hold the normalized head; tails and extensions are not stored.
pub trait IndexBackend: Send + Sync + Debug {
    /// Record for page `id`
    ///
    /// # Errors
    /// Returns [`BackendError`] when storage fails.
    fn get(&self, id: u64) -> Result<Option<Entity>, BackendError>;

    /// Every record in `namespace` whose normalized head equals `head`
    ///
    /// Redirect pages are included with [`Entity::is_redirect`] set.
    ///
    /// # Errors
    /// Returns [`BackendError`] when storage fails.
    fn match_by_head(&self, namespace: i32, head: &str)
        -> Result<BTreeMap<u64, Entity>, BackendError>;

    /// Insert or replace the record keyed by the entity's id
    ///
    /// # Errors
    /// Returns [`BackendError`] when storage fails.
    fn write(&self, entity: &Entity) -> Result<(), BackendError>;

    /// Remove the record for `id`; missing ids are not an error
    ///
    /// # Errors
    /// Returns [`BackendError`] when storage fails.
    fn delete(&self, id: u64) -> Result<(), BackendError>;

    /// Heads shared by more than one tagged record, ordered by namespace
    /// then head
    ///
    /// # Errors
    /// Returns [`BackendError`] when storage fails.
    fn colliding_heads(&self) -> Result<Vec<HeadCount>, BackendError>;

    /// Untagged records grouped by namespace and search key, groups of two
    /// or more only, ordered by namespace then key
    ///
    /// # Errors
    /// Returns [`BackendError`] when storage fails.
    fn same_name_groups(&self) -> Result<Vec<SameNameGroup>, BackendError>;
}

/// Read-only view of the host's pages
pub trait PageDirectory: Send + Sync + Debug {
    /// Title of page `id`, if the page exists
    fn title(&self, id: u64) -> Option<PageTitle>;

    /// Existing page with exactly this namespace and text
    fn find(&self, namespace: i32, text: &str) -> Option<PageTitle>;

    /// Target page id of redirect `id`
    fn redirect_target(&self, id: u64) -> Option<u64>;

    /// Redirect pages pointing at page `id`, in id order
    fn redirects_to(&self, id: u64) -> Vec<PageTitle>;

    /// Whether page `id` is itself a disambiguation page
    fn is_disambiguation(&self, _id: u64) -> bool {
        false
    }
}
