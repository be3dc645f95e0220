//! Page fixtures loaded from JSON
//!
//! ```json
//! [
//!   {"id": 1, "title": "Mercury（planet）", "tags": ["planet"], "state": "innermost planet"},
//!   {"id": 2, "namespace": 0, "title": "Hg", "redirect_to": 3},
//!   {"id": 4, "title": "Mercury", "disambiguation": true}
//! ]
//! ```

use anyhow::{Context, Result};
use disambig_core::{PageTitle, Tags};
use disambig_index::{CollisionIndex, MemoryBackend};
use serde::Deserialize;
use std::path::Path;

/// One page of the fixture document
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FixturePage {
    pub(crate) id: u64,
    #[serde(default)]
    pub(crate) namespace: i32,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(default)]
    pub(crate) state: String,
    #[serde(default)]
    pub(crate) redirect_to: Option<u64>,
    #[serde(default)]
    pub(crate) disambiguation: bool,
}

impl FixturePage {
    fn page_title(&self) -> PageTitle {
        PageTitle::new(self.namespace, &self.title)
            .with_id(self.id)
            .with_redirect(self.redirect_to.is_some())
    }
}

pub(crate) fn parse_pages(text: &str) -> Result<Vec<FixturePage>> {
    serde_json::from_str(text).context("invalid pages document")
}

pub(crate) fn load_pages(path: &Path) -> Result<Vec<FixturePage>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading pages from {}", path.display()))?;
    parse_pages(&text)
}

/// Register every page, then store its declaration
///
/// Returns the number of stored declarations.
pub(crate) fn populate(
    backend: &MemoryBackend,
    index: &CollisionIndex,
    pages: &[FixturePage],
    separator: char,
) -> Result<usize> {
    for page in pages {
        let title = page.page_title();
        if page.redirect_to.is_some() {
            backend.add_redirect(title, page.redirect_to);
        } else {
            backend.add_page(title);
        }
        if page.disambiguation {
            backend.mark_disambiguation(page.id);
        }
    }

    let mut stored = 0;
    for page in pages {
        let tags = Tags::try_new(page.tags.iter(), separator)
            .with_context(|| format!("page {} declares an invalid tag", page.id))?;
        if index.store(&page.page_title(), tags, &page.state)?.is_some() {
            stored += 1;
        }
    }
    Ok(stored)
}
