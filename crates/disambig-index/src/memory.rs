//! In-memory backend and page directory
//!
//! Backed by [`DashMap`] so a single instance can be shared across threads
//! behind an `Arc`. Used by the CLI and by tests.

use crate::backend::{IndexBackend, PageDirectory};
use crate::error::BackendError;
use crate::report::{HeadCount, SameNameGroup};
use dashmap::DashMap;
use disambig_core::{Entity, PageTitle};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct PageRecord {
    title: PageTitle,
    redirect_target: Option<u64>,
    disambiguation: bool,
}

/// Concurrent in-memory store of records and pages
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: DashMap<u64, Entity>,
    pages: DashMap<u64, PageRecord>,
}

impl MemoryBackend {
    /// Create empty backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page; `title.id` must be non-zero
    pub fn add_page(&self, title: PageTitle) {
        self.pages.insert(
            title.id,
            PageRecord {
                title,
                redirect_target: None,
                disambiguation: false,
            },
        );
    }

    /// Register a redirect page pointing at `target`
    pub fn add_redirect(&self, title: PageTitle, target: Option<u64>) {
        let title = title.with_redirect(true);
        self.pages.insert(
            title.id,
            PageRecord {
                title,
                redirect_target: target,
                disambiguation: false,
            },
        );
    }

    /// Flag page `id` as a disambiguation page
    ///
    /// Returns `false` when the page is unknown.
    pub fn mark_disambiguation(&self, id: u64) -> bool {
        match self.pages.get_mut(&id) {
            Some(mut page) => {
                page.disambiguation = true;
                true
            }
            None => false,
        }
    }

    /// Forget page `id`; its index record is left alone
    pub fn remove_page(&self, id: u64) -> Option<PageTitle> {
        self.pages.remove(&id).map(|(_, page)| page.title)
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of registered pages
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn is_redirect_page(&self, id: u64) -> bool {
        self.pages.get(&id).is_some_and(|page| page.title.is_redirect)
    }
}

impl IndexBackend for MemoryBackend {
    fn get(&self, id: u64) -> Result<Option<Entity>, BackendError> {
        Ok(self.records.get(&id).map(|record| {
            let mut entity = record.value().clone();
            entity.set_redirect(self.is_redirect_page(id));
            entity
        }))
    }

    fn match_by_head(
        &self,
        namespace: i32,
        head: &str,
    ) -> Result<BTreeMap<u64, Entity>, BackendError> {
        let mut matched = BTreeMap::new();
        for record in &self.records {
            let entity = record.value();
            if entity.namespace() == namespace && entity.head() == head {
                let mut entity = entity.clone();
                entity.set_redirect(self.is_redirect_page(*record.key()));
                matched.insert(*record.key(), entity);
            }
        }
        Ok(matched)
    }

    fn write(&self, entity: &Entity) -> Result<(), BackendError> {
        if entity.id() == 0 {
            return Err(BackendError::corrupt(0, "record without page id"));
        }
        let mut stored = entity.clone();
        stored.set_tail("");
        stored.set_extension("");
        self.records.insert(entity.id(), stored);
        Ok(())
    }

    fn delete(&self, id: u64) -> Result<(), BackendError> {
        self.records.remove(&id);
        Ok(())
    }

    fn colliding_heads(&self) -> Result<Vec<HeadCount>, BackendError> {
        let mut counts: BTreeMap<(i32, String), usize> = BTreeMap::new();
        for record in &self.records {
            let entity = record.value();
            if entity.has_tags() {
                *counts
                    .entry((entity.namespace(), entity.head().to_string()))
                    .or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((namespace, head), count)| HeadCount {
                namespace,
                head,
                count,
            })
            .collect())
    }

    fn same_name_groups(&self) -> Result<Vec<SameNameGroup>, BackendError> {
        let mut groups: BTreeMap<(i32, String), Vec<u64>> = BTreeMap::new();
        for record in &self.records {
            let entity = record.value();
            if !entity.has_tags() {
                groups
                    .entry((entity.namespace(), entity.search_key().to_string()))
                    .or_default()
                    .push(*record.key());
            }
        }
        Ok(groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((namespace, search_key), mut ids)| {
                ids.sort_unstable();
                SameNameGroup {
                    namespace,
                    search_key,
                    ids,
                }
            })
            .collect())
    }
}

impl PageDirectory for MemoryBackend {
    fn title(&self, id: u64) -> Option<PageTitle> {
        self.pages.get(&id).map(|page| page.title.clone())
    }

    fn find(&self, namespace: i32, text: &str) -> Option<PageTitle> {
        self.pages
            .iter()
            .find(|page| page.title.namespace == namespace && page.title.text == text)
            .map(|page| page.title.clone())
    }

    fn redirect_target(&self, id: u64) -> Option<u64> {
        self.pages.get(&id).and_then(|page| page.redirect_target)
    }

    fn redirects_to(&self, id: u64) -> Vec<PageTitle> {
        let mut redirects: Vec<PageTitle> = self
            .pages
            .iter()
            .filter(|page| page.redirect_target == Some(id))
            .map(|page| page.title.clone())
            .collect();
        redirects.sort_by_key(|title| title.id);
        redirects
    }

    fn is_disambiguation(&self, id: u64) -> bool {
        self.pages.get(&id).is_some_and(|page| page.disambiguation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disambig_core::Tags;

    fn record(id: u64, head: &str) -> Entity {
        Entity::new(0, head)
            .with_id(id)
            .with_tags(Tags::parse("planet", '|'))
            .with_tail("planet")
    }

    #[test]
    fn write_strips_tail_and_extension() {
        let backend = MemoryBackend::new();
        backend
            .write(&record(1, "mercury").with_extension(".png"))
            .unwrap();

        let stored = backend.get(1).unwrap().unwrap();
        assert_eq!(stored.tail(), "");
        assert_eq!(stored.extension(), "");
        assert_eq!(stored.tags().first(), Some("planet"));
    }

    #[test]
    fn write_rejects_unsaved_page() {
        let backend = MemoryBackend::new();
        assert!(backend.write(&record(0, "mercury")).is_err());
    }

    #[test]
    fn match_filters_by_namespace_and_head() {
        let backend = MemoryBackend::new();
        backend.write(&record(1, "mercury")).unwrap();
        backend.write(&record(2, "venus")).unwrap();
        backend
            .write(&Entity::new(6, "mercury").with_id(3))
            .unwrap();

        let matched = backend.match_by_head(0, "mercury").unwrap();
        assert_eq!(matched.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn redirect_flag_comes_from_pages() {
        let backend = MemoryBackend::new();
        backend.add_redirect(PageTitle::new(0, "Hg").with_id(4), Some(1));
        backend.write(&record(4, "hg")).unwrap();

        assert!(backend.get(4).unwrap().unwrap().is_redirect());
        assert_eq!(backend.redirect_target(4), Some(1));
    }

    #[test]
    fn delete_missing_id_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.delete(99).is_ok());
        assert_eq!(backend.record_count(), 0);
    }

    #[test]
    fn page_directory_lookups() {
        let backend = MemoryBackend::new();
        backend.add_page(PageTitle::new(0, "Mercury（planet）").with_id(1));
        assert!(backend.mark_disambiguation(1));
        assert!(!backend.mark_disambiguation(2));

        assert_eq!(backend.find(0, "Mercury（planet）").map(|t| t.id), Some(1));
        assert!(backend.find(6, "Mercury（planet）").is_none());
        assert!(backend.is_disambiguation(1));
        assert_eq!(backend.remove_page(1).map(|t| t.id), Some(1));
        assert_eq!(backend.page_count(), 0);
    }

    #[test]
    fn colliding_heads_count_tagged_records_only() {
        let backend = MemoryBackend::new();
        backend.write(&record(1, "mercury")).unwrap();
        backend.write(&record(2, "mercury")).unwrap();
        backend.write(&Entity::new(0, "mercury").with_id(3)).unwrap();
        backend.write(&record(4, "venus")).unwrap();
        backend.write(&Entity::new(0, "mars").with_id(5)).unwrap();
        backend.write(&Entity::new(0, "mars").with_id(6)).unwrap();

        let heads = backend.colliding_heads().unwrap();
        assert_eq!(
            heads,
            vec![HeadCount {
                namespace: 0,
                head: "mercury".to_string(),
                count: 2,
            }]
        );
    }

    #[test]
    fn same_name_groups_collect_untagged_records() {
        let backend = MemoryBackend::new();
        let untagged = |id: u64, key: &str| {
            let mut entity = Entity::new(0, "x").with_id(id);
            entity.set_search_key(key);
            entity
        };
        backend.write(&untagged(7, "red giant")).unwrap();
        backend.write(&untagged(3, "red giant")).unwrap();
        backend.write(&untagged(4, "white dwarf")).unwrap();
        let mut tagged = record(5, "x");
        tagged.set_search_key("red giant");
        backend.write(&tagged).unwrap();

        let groups = backend.same_name_groups().unwrap();
        assert_eq!(
            groups,
            vec![SameNameGroup {
                namespace: 0,
                search_key: "red giant".to_string(),
                ids: vec![3, 7],
            }]
        );
    }

    #[test]
    fn redirects_to_lists_pointing_redirects() {
        let backend = MemoryBackend::new();
        backend.add_page(PageTitle::new(0, "Mercury（element）").with_id(1));
        backend.add_redirect(PageTitle::new(0, "Quicksilver").with_id(9), Some(1));
        backend.add_redirect(PageTitle::new(0, "Hg").with_id(4), Some(1));
        backend.add_redirect(PageTitle::new(0, "Sol").with_id(5), Some(2));

        let ids: Vec<u64> = backend.redirects_to(1).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 9]);
        assert!(backend.redirects_to(3).is_empty());
    }
}
