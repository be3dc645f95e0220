//! Testing utilities for the disambig workspace
//! 
//! Shared fixtures: a populated in-memory index and entity builders.

#![allow(missing_docs)]

use disambig_core::{Entity, PageTitle, Tags, DEFAULT_TAG_SEPARATOR};
use disambig_index::{CollisionIndex, DisambigConfig, MemoryBackend};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn tags(items: &[&str]) -> Tags {
    Tags::try_new(items.iter().copied(), DEFAULT_TAG_SEPARATOR).unwrap()
}

pub fn entity(id: u64, head: &str, items: &[&str]) -> Entity {
    Entity::new(0, head).with_id(id).with_tags(tags(items))
}

pub fn entities(items: &[(u64, &[&str])]) -> BTreeMap<u64, Entity> {
    items
        .iter()
        .map(|(id, tag_list)| (*id, entity(*id, "Mercury", tag_list)))
        .collect()
}

pub fn tails(pairs: &[(u64, &str)]) -> BTreeMap<u64, String> {
    pairs.iter().map(|(id, tail)| (*id, (*tail).to_string())).collect()
}

/// Index wired to a fresh in-memory backend
pub struct TestIndex {
    pub backend: Arc<MemoryBackend>,
    pub index: CollisionIndex,
}

impl TestIndex {
    pub fn new(config: &DisambigConfig) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let index = CollisionIndex::new(config, backend.clone(), backend.clone()).unwrap();
        Self { backend, index }
    }

    /// Register the page and store its declaration
    pub fn add(&self, id: u64, namespace: i32, text: &str, tag_list: &[&str], state: &str) -> PageTitle {
        let title = PageTitle::new(namespace, text).with_id(id);
        self.backend.add_page(title.clone());
        self.index.store(&title, tags(tag_list), state).unwrap();
        title
    }

    /// Register a redirect and store its declaration
    pub fn add_redirect(&self, id: u64, text: &str, target: Option<u64>) -> PageTitle {
        let title = PageTitle::new(0, text).with_id(id).with_redirect(true);
        self.backend.add_redirect(title.clone(), target);
        self.index.store(&title, Tags::empty(), "").unwrap();
        title
    }

    pub fn resolve(&self, text: &str, tag_list: &[&str]) -> String {
        self.index
            .resolve(&PageTitle::new(0, text), &tags(tag_list))
            .unwrap()
    }
}

pub fn config_with_priorities(pairs: &[(&str, i64)]) -> DisambigConfig {
    pairs
        .iter()
        .fold(DisambigConfig::default(), |config, (key, priority)| {
            config.with_priority(*key, *priority)
        })
}

/// Two Mercury pages: the planet (priority 1) and the element (priority 5)
pub fn setup_mercury() -> TestIndex {
    let fixture = TestIndex::new(&config_with_priorities(&[("planet", 1), ("element", 5)]));
    fixture.add(1, 0, "Mercury（planet）", &["planet"], "innermost planet");
    fixture.add(2, 0, "Mercury（element）", &["element"], "");
    fixture
}
