//! Tag-constraint matching between decomposed titles
//!
//! A request declares the tags it wants; a candidate satisfies the request
//! when it declares all of them. A request with no tags is a wildcard.

use crate::entity::Entity;

/// Whether `candidate` satisfies the tag constraints of `requested`
///
/// Subset test, order-independent:
/// - no requested tags: always true
/// - requested tags but candidate declares none: false
/// - otherwise every requested tag must be declared by the candidate
#[must_use]
pub fn matches(candidate: &Entity, requested: &Entity) -> bool {
    if !requested.has_tags() {
        return true;
    }

    if !candidate.has_tags() {
        return false;
    }

    requested
        .tags()
        .iter()
        .all(|tag| candidate.tags().contains(tag))
}

/// Structural equality on namespace, head, ordered tags and state
#[must_use]
pub fn equals(a: &Entity, b: &Entity) -> bool {
    a.namespace() == b.namespace()
        && a.head() == b.head()
        && a.tags() == b.tags()
        && a.state() == b.state()
}

/// Same collision key
#[inline]
#[must_use]
pub fn is_same_head(a: &Entity, b: &Entity) -> bool {
    a.namespace() == b.namespace() && a.head() == b.head()
}

/// Same persisted backing page
#[inline]
#[must_use]
pub fn is_same_page(a: &Entity, b: &Entity) -> bool {
    a.id() > 0 && a.id() == b.id()
}

impl Entity {
    /// See [`matches`]
    #[inline]
    #[must_use]
    pub fn matches(&self, requested: &Entity) -> bool {
        matches(self, requested)
    }

    /// See [`equals`]
    #[inline]
    #[must_use]
    pub fn equals(&self, other: &Entity) -> bool {
        equals(self, other)
    }

    /// See [`is_same_head`]
    #[inline]
    #[must_use]
    pub fn is_same_head(&self, other: &Entity) -> bool {
        is_same_head(self, other)
    }

    /// See [`is_same_page`]
    #[inline]
    #[must_use]
    pub fn is_same_page(&self, other: &Entity) -> bool {
        is_same_page(self, other)
    }
}
