//! Bounded cache of extracted document texts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::Result;

#[derive(Debug)]
struct CachedText {
    text: Option<String>,
    uses: u64,
    stamp: u64,
}

/// Least-frequently-used cache keyed by `(document path, extractor name)`.
///
/// Documents without text are cached too; extraction errors are not.
/// Among equally used entries the oldest is evicted first.
#[derive(Debug)]
pub struct DocumentCache {
    capacity: usize,
    entries: HashMap<(PathBuf, String), CachedText>,
    clock: u64,
    hits: u64,
    misses: u64,
}

impl DocumentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached text of `path` for `extractor`, or the result of `load`.
    pub fn get_or_load<F>(&mut self, path: &Path, extractor: &str, load: F) -> Result<Option<String>>
    where
        F: FnOnce() -> Result<Option<String>>,
    {
        self.clock += 1;
        let key = (path.to_path_buf(), extractor.to_string());

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.uses += 1;
            self.hits += 1;
            trace!("Text cache hit for {} ({})", path.display(), extractor);
            return Ok(entry.text.clone());
        }

        self.misses += 1;
        let text = load()?;
        if self.capacity == 0 {
            return Ok(text);
        }
        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.entries.insert(
            key,
            CachedText {
                text: text.clone(),
                uses: 1,
                stamp: self.clock,
            },
        );
        Ok(text)
    }

    fn evict(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.uses, entry.stamp))
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            trace!("Evicting {} ({}) from text cache", key.0.display(), key.1);
            self.entries.remove(&key);
        }
    }

    pub fn contains(&self, path: &Path, extractor: &str) -> bool {
        self.entries
            .contains_key(&(path.to_path_buf(), extractor.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(10)
    }
}
