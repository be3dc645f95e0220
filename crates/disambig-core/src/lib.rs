//! Disambig Core
//!
//! Head/tail decomposition of page titles and shortest-tail resolution for
//! titles whose heads collide.
//!
//! # Overview
//!
//! - **Entity / Tags**: a title split into collision key, tail and declared tags
//! - **TitleGrammar**: split raw text into head/tail/extension and join back
//! - **matcher**: does a candidate satisfy a request's tag constraints
//! - **Ranker**: streaming min/max with tie detection
//! - **TailResolver**: layered escalation assigning the minimal tail per id
//! - **PriorityTable**: configured tie-break priorities
//!
//! # Example
//!
//! ```rust
//! use disambig_core::{assign_tails, Entity, PriorityTable, Tags};
//! use std::collections::BTreeMap;
//!
//! let priorities = PriorityTable::new().with_exact("planet", 1);
//! let mut pages = BTreeMap::new();
//! pages.insert(1, Entity::new(0, "Mercury").with_tags(Tags::parse("planet", '|')));
//! pages.insert(2, Entity::new(0, "Mercury").with_tags(Tags::parse("element", '|')));
//!
//! let tails = assign_tails(&pages, &priorities);
//! assert_eq!(tails.get(1), Some(""));
//! assert_eq!(tails.get(2), Some("element"));
//! ```

#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod priority;
pub mod ranker;
pub mod resolver;
pub mod title;

// Re-exports
pub use entity::{Entity, PageTitle, Tags, DEFAULT_TAG_SEPARATOR};
pub use error::{PriorityError, TagError};
pub use normalize::{BasicNormalizer, Normalizer};
pub use priority::{PriorityLookup, PriorityTable, DEFAULT_PRIORITY, EMPTY_TAG_PRIORITY};
pub use ranker::{Observation, RankMode, Ranker};
pub use resolver::{assign_tails, TailAssignment, TailResolver};
pub use title::{SplitTitle, TailDelimiters, TitleGrammar, FILE_NAMESPACE};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for title disambiguation
    pub use crate::{
        assign_tails, Entity, PageTitle, PriorityLookup, PriorityTable, Tags, TailResolver,
        TitleGrammar,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
