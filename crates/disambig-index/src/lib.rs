//! Disambig Index
//!
//! Cached collision index over pluggable storage: decides the canonical
//! display name for a requested title, records declarations, and produces
//! conflict reports and disambiguation listings.
//!
//! # Overview
//!
//! - **IndexBackend / PageDirectory**: storage and page-metadata seams
//! - **CachedIndex**: moka read-through cache with write invalidation
//! - **CollisionIndex**: resolve, store, delete, near match, reports, listings,
//!   maintenance scans (colliding heads, same-name pages, redirect listings)
//! - **DisambigConfig**: TOML configuration
//! - **MemoryBackend**: dashmap-backed implementation of both seams
//!
//! # Example
//!
//! ```rust
//! use disambig_core::{PageTitle, Tags};
//! use disambig_index::{CollisionIndex, DisambigConfig, MemoryBackend};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let config = DisambigConfig::default().with_priority("planet", 1);
//! let index = CollisionIndex::new(&config, backend.clone(), backend.clone()).unwrap();
//!
//! let planet = PageTitle::new(0, "Mercury（planet）").with_id(1);
//! backend.add_page(planet.clone());
//! index.store(&planet, Tags::empty(), "").unwrap();
//!
//! let name = index
//!     .resolve(&PageTitle::new(0, "Mercury"), &Tags::parse("element", '|'))
//!     .unwrap();
//! assert_eq!(name, "Mercury（element）");
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod cache;
pub mod collision;
pub mod config;
pub mod error;
pub mod memory;
pub mod report;

// Re-exports
pub use backend::{IndexBackend, PageDirectory};
pub use cache::{CacheStats, CachedIndex, HeadKey};
pub use collision::{CollisionIndex, REQUEST_KEY};
pub use config::{CacheConfig, DisambigConfig};
pub use error::{BackendError, ConfigError, IndexError, IndexResult};
pub use memory::MemoryBackend;
pub use report::{
    ConflictEntry, ConflictReport, HeadCount, ListingEntry, NearMatch, RedirectListing,
    RelatedHeads, SameNameGroup,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for index consumers
    pub use crate::{
        CollisionIndex, DisambigConfig, IndexBackend, IndexResult, MemoryBackend, NearMatch,
        PageDirectory,
    };
    pub use disambig_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
