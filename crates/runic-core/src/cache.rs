//! The at-most-once texture cache.
//!
//! Each [`Screen`](crate::screen::Screen) owns two instances: one keyed by
//! character (rasterized glyphs) and one keyed by file path (page images).
//! Both share the same contract: a key's loader runs at most once for the
//! process lifetime, and there is no eviction: the entry bound is a
//! configuration limit, not an LRU.

use std::collections::HashMap;
use std::fmt;

use crate::texture::{BitmapLoader, TextureHandle, TextureStore};

/// Default maximum number of cache entries, matching the original page bound.
pub const MAX_CACHE_ENTRIES: usize = 512;

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Identifier used to deduplicate GPU resource loads.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheKey {
    /// A single rasterized character.
    Glyph(char),
    /// A page image addressed by file path.
    Page(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Glyph(ch) => write!(f, "glyph {ch:?}"),
            CacheKey::Page(path) => write!(f, "page {path}"),
        }
    }
}

// ---------------------------------------------------------------------------
// TextureCache
// ---------------------------------------------------------------------------

/// Maps cache keys to GPU texture handles, loading each key at most once.
///
/// A failed load is cached as [`TextureHandle::NONE`]: the failure is
/// terminal, later lookups return the sentinel without retrying the loader.
#[derive(Debug)]
pub struct TextureCache {
    entries: HashMap<CacheKey, TextureHandle>,
    max_entries: usize,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(MAX_CACHE_ENTRIES)
    }
}

impl TextureCache {
    /// Create a cache bounded to `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
        }
    }

    /// Return the handle for `key`, invoking `loader` (and uploading through
    /// `store`) only on the first call for that key.
    ///
    /// # Panics
    ///
    /// Panics when inserting a new key would exceed the entry bound.
    /// Exceeding the bound is a configuration error; the cache never
    /// evicts.
    pub fn get_or_load(
        &mut self,
        key: CacheKey,
        loader: &mut dyn BitmapLoader,
        store: &mut dyn TextureStore,
    ) -> TextureHandle {
        if let Some(&handle) = self.entries.get(&key) {
            return handle;
        }

        assert!(
            self.entries.len() < self.max_entries,
            "texture cache exceeded its {} entry bound inserting {key}",
            self.max_entries,
        );

        let handle = match loader.load(&key) {
            Ok(bitmap) => {
                let h = store.upload(&bitmap);
                log::debug!("loaded {key} ({}x{}) as {h:?}", bitmap.width, bitmap.height);
                h
            }
            Err(err) => {
                log::warn!("failed to load {key}: {err}");
                TextureHandle::NONE
            }
        };
        self.entries.insert(key, handle);
        handle
    }

    /// Handle for an already-loaded key, if any.
    pub fn get(&self, key: &CacheKey) -> Option<TextureHandle> {
        self.entries.get(key).copied()
    }

    /// Number of resident entries (including cached failures).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::texture::Bitmap;

    /// Loader that counts invocations and serves solid bitmaps.
    struct CountingLoader {
        calls: usize,
    }

    impl BitmapLoader for CountingLoader {
        fn load(&mut self, _key: &CacheKey) -> Result<Bitmap, LoadError> {
            self.calls += 1;
            Ok(Bitmap::solid(4, 4, [255, 255, 255, 255]))
        }
    }

    /// Loader that always fails.
    struct FailingLoader {
        calls: usize,
    }

    impl BitmapLoader for FailingLoader {
        fn load(&mut self, key: &CacheKey) -> Result<Bitmap, LoadError> {
            self.calls += 1;
            Err(LoadError::MissingAsset(key.to_string()))
        }
    }

    /// Store issuing sequential handles.
    #[derive(Default)]
    struct SeqStore {
        uploads: u32,
    }

    impl TextureStore for SeqStore {
        fn upload(&mut self, _bitmap: &Bitmap) -> TextureHandle {
            let h = TextureHandle(self.uploads);
            self.uploads += 1;
            h
        }
    }

    #[test]
    fn load_is_idempotent_per_key() {
        let mut cache = TextureCache::default();
        let mut loader = CountingLoader { calls: 0 };
        let mut store = SeqStore::default();

        let a = cache.get_or_load(CacheKey::Glyph('A'), &mut loader, &mut store);
        let b = cache.get_or_load(CacheKey::Glyph('A'), &mut loader, &mut store);
        assert_eq!(a, b);
        assert_eq!(loader.calls, 1);
        assert_eq!(store.uploads, 1);

        let c = cache.get_or_load(CacheKey::Glyph('B'), &mut loader, &mut store);
        assert_ne!(a, c);
        assert_eq!(loader.calls, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn glyph_and_page_keys_do_not_collide() {
        let mut cache = TextureCache::default();
        let mut loader = CountingLoader { calls: 0 };
        let mut store = SeqStore::default();

        let g = cache.get_or_load(CacheKey::Glyph('x'), &mut loader, &mut store);
        let p = cache.get_or_load(CacheKey::Page("x".into()), &mut loader, &mut store);
        assert_ne!(g, p);
        assert_eq!(loader.calls, 2);
    }

    #[test]
    fn failed_load_pins_the_sentinel() {
        let mut cache = TextureCache::default();
        let mut loader = FailingLoader { calls: 0 };
        let mut store = SeqStore::default();

        let key = CacheKey::Page("missing.png".into());
        let first = cache.get_or_load(key.clone(), &mut loader, &mut store);
        let second = cache.get_or_load(key, &mut loader, &mut store);
        assert!(first.is_none());
        assert!(second.is_none());
        // Failure is terminal: the loader is not retried.
        assert_eq!(loader.calls, 1);
        assert_eq!(store.uploads, 0);
    }

    #[test]
    #[should_panic(expected = "entry bound")]
    fn exceeding_the_bound_panics() {
        let mut cache = TextureCache::new(2);
        let mut loader = CountingLoader { calls: 0 };
        let mut store = SeqStore::default();
        cache.get_or_load(CacheKey::Glyph('a'), &mut loader, &mut store);
        cache.get_or_load(CacheKey::Glyph('b'), &mut loader, &mut store);
        cache.get_or_load(CacheKey::Glyph('c'), &mut loader, &mut store);
    }
}
