//! Slug Index
//!
//! Secondary slug → DTO view, derived from one generation of the id map.

use std::collections::HashMap;
use std::sync::Arc;

/// Extracts the slug of a DTO.
pub type SlugFn<D> = fn(&D) -> &str;

#[derive(Debug)]
pub struct SlugIndex<D> {
    by_slug: HashMap<String, Arc<D>>,
}

impl<D> SlugIndex<D> {
    pub fn empty() -> Self {
        Self {
            by_slug: HashMap::new(),
        }
    }

    /// Indexes `dtos` by slug. Empty slugs are skipped; on duplicates the
    /// later DTO wins.
    pub fn build<'a, I>(dtos: I, slug_of: SlugFn<D>) -> Self
    where
        I: IntoIterator<Item = &'a Arc<D>>,
        D: 'a,
    {
        let mut by_slug = HashMap::new();
        for dto in dtos {
            let slug = slug_of(dto);
            if !slug.is_empty() {
                by_slug.insert(slug.to_owned(), Arc::clone(dto));
            }
        }
        Self { by_slug }
    }

    pub fn get(&self, slug: &str) -> Option<Arc<D>> {
        self.by_slug.get(slug).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<D>)> {
        self.by_slug.iter().map(|(slug, dto)| (slug.as_str(), dto))
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}
