//! Collision index
//!
//! Ties the title grammar, the matcher and the tail resolver to a cached
//! backend and a page directory. Lookups normalize the head before keying;
//! disabled namespaces always look empty.

use crate::backend::{IndexBackend, PageDirectory};
use crate::cache::{CacheStats, CachedIndex};
use crate::config::DisambigConfig;
use crate::error::{ConfigError, IndexResult};
use crate::report::{
    ConflictEntry, ConflictReport, HeadCount, ListingEntry, NearMatch, RedirectListing,
    RelatedHeads, SameNameGroup,
};
use disambig_core::{
    BasicNormalizer, Entity, Normalizer, PageTitle, PriorityLookup, Tags, TailAssignment,
    TailResolver, TitleGrammar,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Candidate-map key of the entity being resolved; never a real page id
pub const REQUEST_KEY: u64 = 0;

/// Cached collision index over pluggable storage
#[derive(Clone)]
pub struct CollisionIndex {
    index: CachedIndex,
    pages: Arc<dyn PageDirectory>,
    priorities: Arc<dyn PriorityLookup>,
    normalizer: Arc<dyn Normalizer>,
    grammar: TitleGrammar,
    disabled_namespaces: Vec<i32>,
}

impl fmt::Debug for CollisionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionIndex")
            .field("index", &self.index)
            .field("pages", &self.pages)
            .field("normalizer", &self.normalizer)
            .field("grammar", &self.grammar)
            .field("disabled_namespaces", &self.disabled_namespaces)
            .finish_non_exhaustive()
    }
}

impl CollisionIndex {
    /// Build from configuration, storage and page directory
    ///
    /// # Errors
    /// Returns [`ConfigError::Priority`] when the configured priorities do
    /// not compile.
    pub fn new(
        config: &DisambigConfig,
        backend: Arc<dyn IndexBackend>,
        pages: Arc<dyn PageDirectory>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            index: CachedIndex::new(backend, &config.cache),
            pages,
            priorities: Arc::new(config.priority_table()?),
            normalizer: Arc::new(BasicNormalizer),
            grammar: config.grammar(),
            disabled_namespaces: config.disabled_namespaces.clone(),
        })
    }

    /// With a host-specific normalizer
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// With a priority lookup replacing the configured table
    #[must_use]
    pub fn with_priorities(mut self, priorities: Arc<dyn PriorityLookup>) -> Self {
        self.priorities = priorities;
        self
    }

    /// Title grammar in use
    #[inline]
    #[must_use]
    pub fn grammar(&self) -> &TitleGrammar {
        &self.grammar
    }

    /// Page directory in use
    #[inline]
    #[must_use]
    pub fn pages(&self) -> &Arc<dyn PageDirectory> {
        &self.pages
    }

    /// Whether `namespace` is excluded from the index
    #[inline]
    #[must_use]
    pub fn is_disabled(&self, namespace: i32) -> bool {
        self.disabled_namespaces.contains(&namespace)
    }

    /// Collision key of `head`
    #[must_use]
    pub fn normalize_head(&self, head: &str) -> String {
        self.normalizer.normalize(head.trim(), "")
    }

    /// Priority of `tag` under the configured lookup
    #[must_use]
    pub fn priority(&self, tag: &str) -> i64 {
        self.priorities.priority(tag)
    }

    /// Cache statistics
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.index.stats()
    }

    /// Stored record of page `id`
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn lookup(&self, id: u64) -> IndexResult<Option<Entity>> {
        if id == 0 {
            return Ok(None);
        }
        let entity = self.index.get(id)?;
        Ok(entity.filter(|entity| !self.is_disabled(entity.namespace())))
    }

    /// Every record sharing `head` in `namespace`
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn collision_set(
        &self,
        namespace: i32,
        head: &str,
        allow_redirects: bool,
    ) -> IndexResult<BTreeMap<u64, Entity>> {
        if self.is_disabled(namespace) {
            return Ok(BTreeMap::new());
        }
        let key = self.normalize_head(head);
        if key.is_empty() {
            return Ok(BTreeMap::new());
        }

        let matched = self.index.match_by_head(namespace, &key)?;
        Ok(matched
            .iter()
            .filter(|(_, entity)| allow_redirects || !entity.is_redirect())
            .map(|(id, entity)| (*id, entity.clone()))
            .collect())
    }

    /// Tails for `entities` under the configured priorities
    #[must_use]
    pub fn tail_assignment(&self, entities: &BTreeMap<u64, Entity>) -> TailAssignment {
        TailResolver::new(self.priorities.as_ref()).resolve(entities)
    }

    /// Canonical display name for `title` requested with `tags`
    ///
    /// Pure read: calling it again without an intervening write returns the
    /// same name.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn resolve(&self, title: &PageTitle, tags: &Tags) -> IndexResult<String> {
        if self.is_disabled(title.namespace) {
            return Ok(self.grammar.display(title));
        }

        let mut requested = self
            .grammar
            .entity_from_title(title, tags.clone(), "", true);
        let members = self.collision_set(requested.namespace(), requested.head(), true)?;

        if members.is_empty() {
            let bare = format!("{}{}", requested.head(), requested.extension());
            let tail = match self.pages.find(requested.namespace(), &bare) {
                Some(_) => requested.tags().first().unwrap_or_default().to_string(),
                None => String::new(),
            };
            debug!(title = %bare, tail = %tail, "no collision");
            requested.set_tail(tail);
            return Ok(self.grammar.join(&requested));
        }

        let matched: Vec<String> = members
            .values()
            .filter(|member| member.matches(&requested))
            .filter_map(|member| self.pages.title(member.id()))
            .map(|page| self.grammar.display(&page))
            .collect();

        if let [unique] = matched.as_slice() {
            debug!(name = %unique, "unique match");
            return Ok(unique.clone());
        }

        let mut candidates = members;
        candidates.insert(REQUEST_KEY, requested.clone());
        let tails = self.tail_assignment(&candidates);
        let tail = tails.get(REQUEST_KEY).unwrap_or_default();

        if tail.is_empty() {
            if let Some(first) = matched.into_iter().next() {
                debug!(name = %first, "request exempt, using existing page");
                return Ok(first);
            }
        }

        debug!(
            head = %requested.head(),
            tail = %tail,
            candidates = candidates.len(),
            "resolved tail"
        );
        requested.set_tail(tail);
        Ok(self.grammar.join(&requested))
    }

    /// Persist the declaration of `title`
    ///
    /// Returns the stored record, or `None` when the page has no id yet.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn store(&self, title: &PageTitle, tags: Tags, state: &str) -> IndexResult<Option<Entity>> {
        if !title.exists() {
            warn!(title = %title.text, "skipping store for page without id");
            return Ok(None);
        }

        let mut entity = self.grammar.entity_from_title(title, tags, state, true);
        entity.set_head(self.normalize_head(entity.head()));
        entity.set_search_key(self.normalizer.normalize(&title.text, " "));

        self.index.write(&entity)?;
        debug!(
            id = entity.id(),
            namespace = entity.namespace(),
            head = %entity.head(),
            "stored declaration"
        );
        Ok(Some(entity))
    }

    /// Remove the record of page `id`
    ///
    /// Returns the removed record, if any.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn delete(&self, id: u64) -> IndexResult<Option<Entity>> {
        let removed = self.index.delete(id)?;
        debug!(id, removed = removed.is_some(), "deleted declaration");
        Ok(removed)
    }

    /// Declared description of page `id`
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn page_description(&self, id: u64) -> IndexResult<Option<String>> {
        Ok(self
            .lookup(id)?
            .filter(Entity::has_state)
            .map(|entity| entity.state().to_string()))
    }

    /// Main-namespace page for a search term, ignoring any tail in it
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn near_match(&self, term: &str) -> IndexResult<NearMatch> {
        let head = self.grammar.strip_tail(term);
        let members = self.collision_set(0, &head, true)?;

        let outcome = match members.len() {
            0 => NearMatch::NoMatch,
            1 => members
                .keys()
                .next()
                .and_then(|id| self.pages.title(*id))
                .map_or(NearMatch::NoMatch, NearMatch::Unique),
            _ => NearMatch::Ambiguous { head },
        };
        debug!(term, matched = members.len(), "near match");
        Ok(outcome)
    }

    /// Naming review of the pages sharing `head`
    ///
    /// `None` when fewer than two pages collide.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn conflict_report(&self, namespace: i32, head: &str) -> IndexResult<Option<ConflictReport>> {
        let members = self.collision_set(namespace, head, true)?;
        if members.len() < 2 {
            return Ok(None);
        }

        let ids: BTreeSet<u64> = members.keys().copied().collect();
        let members: BTreeMap<u64, Entity> = members
            .into_iter()
            .filter(|(id, entity)| {
                !entity.is_redirect()
                    || self
                        .pages
                        .redirect_target(*id)
                        .is_some_and(|target| !ids.contains(&target))
            })
            .collect();

        let tails = self.tail_assignment(&members);
        let duplicated = tails.duplicated_tails();

        let entries = tails
            .iter()
            .filter_map(|(id, tail)| {
                let page = self.pages.title(id)?;
                let mut entity = members.get(&id)?.clone();
                self.grammar.decompose_into(&mut entity, &page.text);

                let current = self.grammar.join(&entity);
                let old_tail = entity.tail().to_string();
                let unsolved = duplicated.contains(tail);
                if !unsolved {
                    entity.set_tail(tail);
                }
                let proposed = self.grammar.join(&entity);
                let needs_move = !unsolved
                    && current != proposed
                    && self.priority(&old_tail) != self.priority(tail);

                Some(ConflictEntry {
                    id,
                    current,
                    proposed,
                    tags: entity.tags().clone(),
                    unsolved,
                    needs_move,
                    is_redirect: entity.is_redirect(),
                    redirect_target: entity
                        .is_redirect()
                        .then(|| self.pages.redirect_target(id))
                        .flatten(),
                })
            })
            .collect();

        Ok(Some(ConflictReport {
            namespace,
            head: self.normalize_head(head),
            entries,
        }))
    }

    /// Rows of the disambiguation listing for `head`
    ///
    /// `related` heads are resolved in `namespace` unless they carry a known
    /// namespace prefix.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn disambiguation_list(
        &self,
        namespace: i32,
        head: &str,
        current_page: Option<u64>,
        related: &RelatedHeads,
    ) -> IndexResult<Vec<ListingEntry>> {
        let mut rows = self.collision_set(namespace, head, false)?;

        for (related_head, description) in related {
            let (parsed, text) = self.grammar.parse_prefixed(related_head);
            let related_namespace = if parsed == 0 { namespace } else { parsed };

            if description.trim().is_empty() {
                for (id, entity) in self.collision_set(related_namespace, &text, false)? {
                    rows.entry(id).or_insert(entity);
                }
            } else if let Some(page) = self.pages.find(related_namespace, &text) {
                let entity = self
                    .grammar
                    .entity_from_title(&page, Tags::empty(), description, false);
                rows.insert(page.id, entity);
            }
        }

        if let Some(current) = current_page {
            rows.remove(&current);
        }

        let entries = self.listing_entries(rows);
        debug!(namespace, head, rows = entries.len(), "built disambiguation listing");
        Ok(entries)
    }

    /// Listings for the redirects pointing at page `target`
    ///
    /// Each redirect whose own name is shared by other indexed pages gets a
    /// listing of those pages. A redirect is skipped when its name leads
    /// back to `target` or to nothing at all.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn redirect_listings(&self, target: u64) -> IndexResult<Vec<RedirectListing>> {
        if self.pages.title(target).is_none() {
            return Ok(Vec::new());
        }

        let mut listings = Vec::new();
        for redirect in self.pages.redirects_to(target) {
            let mut rows = self.collision_set(redirect.namespace, &redirect.text, false)?;
            rows.remove(&redirect.id);
            if rows.is_empty() || rows.contains_key(&target) {
                continue;
            }

            let entries = self.listing_entries(rows);
            if entries.is_empty() {
                continue;
            }
            listings.push(RedirectListing {
                id: redirect.id,
                title: self.grammar.display(&redirect),
                entries,
            });
        }

        debug!(target, listings = listings.len(), "built redirect listings");
        Ok(listings)
    }

    /// Tagged heads shared by several records, outside disabled namespaces
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn conflicts(&self) -> IndexResult<Vec<HeadCount>> {
        let mut heads = self.index.backend().colliding_heads()?;
        heads.retain(|head| !self.is_disabled(head.namespace));
        Ok(heads)
    }

    /// Untagged pages whose titles only differ in case or spacing
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn same_name_groups(&self) -> IndexResult<Vec<SameNameGroup>> {
        let mut groups = self.index.backend().same_name_groups()?;
        groups.retain(|group| !self.is_disabled(group.namespace));
        Ok(groups)
    }

    fn listing_entries(&self, rows: BTreeMap<u64, Entity>) -> Vec<ListingEntry> {
        rows.into_iter()
            .filter_map(|(id, entity)| {
                let page = self.pages.title(id)?;
                if page.is_redirect || self.pages.is_disambiguation(id) {
                    return None;
                }
                Some(ListingEntry {
                    id,
                    title: self.grammar.display(&page),
                    label: listing_label(&entity),
                })
            })
            .collect()
    }
}

/// State if declared, else the tags, else nothing
fn listing_label(entity: &Entity) -> Option<String> {
    if entity.has_state() {
        Some(entity.state().to_string())
    } else if entity.has_tags() {
        Some(entity.tags().joined(", "))
    } else {
        None
    }
}
