//! Metadata cache for branches, tags and remotes.
//!
//! Each repository handle owns one `MetadataCache`, so repositories in
//! multi-repo mode never share or cross-invalidate entries.
//! - Each category has its own snapshot and expiry; a hit requires
//!   `now < expiry` and a non-empty snapshot
//! - `put` replaces a whole category under the write lock; readers never see
//!   a half-written snapshot
//! - `invalidate` resets the expiry to "zero", forcing the next `get` to miss,
//!   and bumps the category's generation
//! - `put` only lands if the generation it was given is still current, so a
//!   listing that raced a mutation never re-caches the pre-mutation state
//!
//! Used by: `GitRepository::list_branches/list_tags/list_remotes` in refs.rs
//! Invalidated by: checkout, commit, branch/tag create/delete/rename, merge,
//! reset, rebase, cherry-pick, revert, pull, fetch

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::models::{Branch, Remote, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Branches,
    Tags,
    Remotes,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Branches => "branches",
            Category::Tags => "tags",
            Category::Remotes => "remotes",
        }
    }
}

/// One cached category. `expiry == None` is the zero time: always stale.
/// `generation` counts invalidations.
#[derive(Debug)]
pub struct CacheEntry<T> {
    data: Vec<T>,
    expiry: Option<Instant>,
    generation: u64,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            expiry: None,
            generation: 0,
        }
    }
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expiry.is_some_and(|expiry| now < expiry) && !self.data.is_empty()
    }

    fn expire(&mut self) {
        self.expiry = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Debug, Default)]
pub struct CacheEntries {
    branches: CacheEntry<Branch>,
    tags: CacheEntry<Tag>,
    remotes: CacheEntry<Remote>,
}

impl CacheEntries {
    fn expire(&mut self, category: Category) {
        match category {
            Category::Branches => self.branches.expire(),
            Category::Tags => self.tags.expire(),
            Category::Remotes => self.remotes.expire(),
        }
    }
}

/// A record type with its own cache slot.
pub trait Cached: Clone {
    const CATEGORY: Category;

    fn entry(entries: &CacheEntries) -> &CacheEntry<Self>;
    fn entry_mut(entries: &mut CacheEntries) -> &mut CacheEntry<Self>;
}

impl Cached for Branch {
    const CATEGORY: Category = Category::Branches;

    fn entry(entries: &CacheEntries) -> &CacheEntry<Self> {
        &entries.branches
    }

    fn entry_mut(entries: &mut CacheEntries) -> &mut CacheEntry<Self> {
        &mut entries.branches
    }
}

impl Cached for Tag {
    const CATEGORY: Category = Category::Tags;

    fn entry(entries: &CacheEntries) -> &CacheEntry<Self> {
        &entries.tags
    }

    fn entry_mut(entries: &mut CacheEntries) -> &mut CacheEntry<Self> {
        &mut entries.tags
    }
}

impl Cached for Remote {
    const CATEGORY: Category = Category::Remotes;

    fn entry(entries: &CacheEntries) -> &CacheEntry<Self> {
        &entries.remotes
    }

    fn entry_mut(entries: &mut CacheEntries) -> &mut CacheEntry<Self> {
        &mut entries.remotes
    }
}

#[derive(Debug)]
pub struct MetadataCache {
    entries: RwLock<CacheEntries>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(CacheEntries::default()),
            ttl,
        }
    }

    /// Returns a copy of the cached snapshot, or `None` when expired or empty.
    pub fn get<T: Cached>(&self) -> Option<Vec<T>> {
        // Entries are only ever swapped whole, so a poisoned lock still guards consistent data
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = T::entry(&entries);
        entry.is_fresh(Instant::now()).then(|| entry.data.clone())
    }

    /// Current invalidation count of `T`'s category. Read it before running
    /// git and hand it back to `store`.
    pub fn generation<T: Cached>(&self) -> u64 {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        T::entry(&entries).generation
    }

    /// Replaces the category's snapshot, fresh for `ttl` from now, unless the
    /// category was invalidated after `seen` was read. Returns whether the
    /// snapshot was stored.
    pub fn put<T: Cached>(&self, data: &[T], ttl: Duration, seen: u64) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = T::entry_mut(&mut entries);
        if entry.generation != seen {
            tracing::debug!(
                category = T::CATEGORY.as_str(),
                seen,
                current = entry.generation,
                "invalidated while loading, snapshot dropped"
            );
            return false;
        }
        entry.data = data.to_vec();
        entry.expiry = Some(Instant::now() + ttl);
        tracing::debug!(category = T::CATEGORY.as_str(), len = data.len(), ?ttl, "cache refreshed");
        true
    }

    /// Stores with the cache's configured TTL.
    pub fn store<T: Cached>(&self, data: &[T], seen: u64) -> bool {
        self.put(data, self.ttl, seen)
    }

    pub fn invalidate(&self, category: Category) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.expire(category);
        tracing::debug!(category = category.as_str(), "cache invalidated");
    }

    #[cfg(test)]
    pub fn is_fresh(&self, category: Category) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match category {
            Category::Branches => entries.branches.is_fresh(now),
            Category::Tags => entries.tags.is_fresh(now),
            Category::Remotes => entries.remotes.is_fresh(now),
        }
    }
}
