//! Shortest-tail assignment for colliding titles
//!
//! Every entity in a collision starts with an empty tail. Layer by layer
//! (tag index 0 = broadest), each group of entities still sharing a tail is
//! examined:
//!
//! - members with a tag at this layer are *promotion candidates*
//! - members without one are *starved* and keep their tail
//! - if exactly one candidate holds the lowest priority in the group, it is
//!   exempted and keeps its shorter tail; every other candidate takes its
//!   tag at this layer as its new tail
//! - ties, or a starved member at the bottom of the ranking, exempt nobody
//!
//! Resolution stops once a layer finds no shared tails. Entities that run out
//! of tags while still colliding stay duplicated.

use crate::entity::Entity;
use crate::priority::PriorityLookup;
use crate::ranker::Ranker;
use std::collections::{BTreeMap, BTreeSet};

/// Assigned tails keyed by entity id
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TailAssignment {
    tails: BTreeMap<u64, String>,
}

impl TailAssignment {
    /// Tail assigned to `id`
    #[inline]
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&str> {
        self.tails.get(&id).map(String::as_str)
    }

    /// Iterate `(id, tail)` in id order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.tails.iter().map(|(id, tail)| (*id, tail.as_str()))
    }

    /// Number of ids
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tails.len()
    }

    /// True when no ids were resolved
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }

    /// Tails carried by more than one id
    #[must_use]
    pub fn duplicated_tails(&self) -> BTreeSet<&str> {
        let mut seen = BTreeSet::new();
        let mut duplicated = BTreeSet::new();
        for tail in self.tails.values() {
            if !seen.insert(tail.as_str()) {
                duplicated.insert(tail.as_str());
            }
        }
        duplicated
    }

    /// Whether `id` still shares its tail with another id
    #[must_use]
    pub fn is_unsolved(&self, id: u64) -> bool {
        self.get(id)
            .is_some_and(|tail| self.tails.iter().any(|(other, t)| *other != id && t == tail))
    }

    /// Underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<u64, String> {
        &self.tails
    }

    /// Consume into the underlying map
    #[inline]
    #[must_use]
    pub fn into_map(self) -> BTreeMap<u64, String> {
        self.tails
    }
}

/// Layered tail resolver
#[derive(Debug, Clone, Copy)]
pub struct TailResolver<'a, P: ?Sized> {
    priorities: &'a P,
}

impl<'a, P: PriorityLookup + ?Sized> TailResolver<'a, P> {
    /// Create resolver over a priority lookup
    #[inline]
    #[must_use]
    pub fn new(priorities: &'a P) -> Self {
        Self { priorities }
    }

    /// Compute the shortest sufficient tail for every entity
    ///
    /// Entities are never modified; apply the returned tails as needed.
    #[must_use]
    pub fn resolve(&self, entities: &BTreeMap<u64, Entity>) -> TailAssignment {
        let mut tails: BTreeMap<u64, String> =
            entities.keys().map(|&id| (id, String::new())).collect();

        for (layer_index, layer) in build_layers(entities).iter().enumerate() {
            let groups = collision_groups(&tails);
            if groups.is_empty() {
                tracing::trace!(layer = layer_index, "no collisions left");
                break;
            }

            for group in &groups {
                let exempt = self.exemption(group, layer);
                tracing::trace!(
                    layer = layer_index,
                    size = group.len(),
                    exempt = ?exempt,
                    "resolving collision group"
                );

                for id in group {
                    if exempt == Some(*id) {
                        continue;
                    }
                    if let Some(tag) = layer.get(id) {
                        tails.insert(*id, (*tag).to_string());
                    }
                }
            }
        }

        TailAssignment { tails }
    }

    /// Candidate allowed to keep its current tail, if any
    fn exemption(&self, group: &[u64], layer: &BTreeMap<u64, &str>) -> Option<u64> {
        // `None` orders below every `Some`, so starved members sit at the bottom
        let mut ranker: Ranker<u64, Option<i64>> = Ranker::min();
        for &id in group {
            let rank = layer.get(&id).map(|tag| self.priorities.priority(tag));
            ranker.observe(id, rank);
        }

        ranker
            .winner()
            .copied()
            .filter(|id| layer.contains_key(id))
    }
}

/// Resolve tails with a one-off resolver
#[must_use]
pub fn assign_tails<P: PriorityLookup + ?Sized>(
    entities: &BTreeMap<u64, Entity>,
    priorities: &P,
) -> TailAssignment {
    TailResolver::new(priorities).resolve(entities)
}

/// `layers[i][id]` = tag `i` of entity `id`; shorter sequences leave gaps
fn build_layers(entities: &BTreeMap<u64, Entity>) -> Vec<BTreeMap<u64, &str>> {
    let mut layers: Vec<BTreeMap<u64, &str>> = Vec::new();
    for (&id, entity) in entities {
        for (layer_index, tag) in entity.tags().iter().enumerate() {
            if layers.len() <= layer_index {
                layers.push(BTreeMap::new());
            }
            layers[layer_index].insert(id, tag);
        }
    }
    layers
}

/// Ids grouped by current tail, groups of two or more only
fn collision_groups(tails: &BTreeMap<u64, String>) -> Vec<Vec<u64>> {
    let mut by_tail: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for (&id, tail) in tails {
        by_tail.entry(tail.as_str()).or_default().push(id);
    }
    by_tail.into_values().filter(|ids| ids.len() > 1).collect()
}
