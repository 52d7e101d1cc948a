//! LRU cache of compiled guest modules.
//!
//! Compiling a guest module is far more expensive than instantiating it, so
//! matchers built from the same bytes share one [`Module`]. Keys are BLAKE3
//! hashes of the module bytes.
//!
//! # Examples
//!
//! ```
//! use multimatch_wasm::cache::ModuleCache;
//! use std::num::NonZeroUsize;
//!
//! let cache = ModuleCache::new(NonZeroUsize::new(8).unwrap());
//! let key = ModuleCache::key_for(b"\0asm\x01\0\0\0");
//! assert!(cache.get(&key).is_none());
//! assert_eq!(cache.capacity(), 8);
//! ```

use blake3::Hasher;
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use wasmtime::Module;

/// Cache key for a compiled module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Thread-safe LRU cache of compiled modules with hit/miss counters.
pub struct ModuleCache {
    entries: Mutex<LruCache<CacheKey, Module>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

impl ModuleCache {
    /// Creates a cache holding at most `capacity` modules.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Hashes module bytes into a cache key.
    ///
    /// # Examples
    ///
    /// ```
    /// use multimatch_wasm::cache::ModuleCache;
    ///
    /// let a = ModuleCache::key_for(b"module");
    /// assert_eq!(a, ModuleCache::key_for(b"module"));
    /// assert_ne!(a, ModuleCache::key_for(b"other"));
    /// assert!(a.as_str().starts_with("guest_"));
    /// ```
    #[must_use]
    pub fn key_for(bytes: &[u8]) -> CacheKey {
        let mut hasher = Hasher::new();
        hasher.update(bytes);
        CacheKey(format!("guest_{}", hasher.finalize().to_hex()))
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Module>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a module, promoting it to most recently used.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Module> {
        let found = self.lock().get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Returns the cached module for `key`, compiling and inserting it on a
    /// miss.
    ///
    /// The lock is not held while `compile` runs; two threads missing on the
    /// same key may both compile, and the later insert wins.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `compile`.
    pub fn get_or_compile<E>(
        &self,
        key: CacheKey,
        compile: impl FnOnce() -> Result<Module, E>,
    ) -> Result<Module, E> {
        if let Some(module) = self.get(&key) {
            tracing::debug!(key = %key, "guest module cache hit");
            return Ok(module);
        }
        let module = compile()?;
        self.insert(key, module.clone());
        Ok(module)
    }

    /// Inserts a module, evicting the least recently used entry when full.
    pub fn insert(&self, key: CacheKey, module: Module) {
        let mut entries = self.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), module)
            && evicted != key
        {
            tracing::debug!(key = %evicted, "evicted guest module");
        }
        tracing::debug!(key = %key, len = entries.len(), "guest module cached");
    }

    /// Checks for a key without touching recency or counters.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains(key)
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        self.lock().clear();
        tracing::info!("guest module cache cleared");
    }

    /// Number of cached modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached modules.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Lookups that found a module.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::Engine;

    fn cache(capacity: usize) -> ModuleCache {
        ModuleCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn empty_module(engine: &Engine) -> Module {
        Module::new(engine, wat::parse_str("(module)").unwrap()).unwrap()
    }

    #[test]
    fn test_key_is_content_addressed() {
        let a = ModuleCache::key_for(b"same");
        let b = ModuleCache::key_for(b"same");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), "guest_".len() + 64);
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let engine = Engine::default();
        let cache = cache(4);
        let key = ModuleCache::key_for(b"x");

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), empty_module(&engine));
        assert!(cache.get(&key).is_some());

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_lru_eviction_respects_recency() {
        let engine = Engine::default();
        let cache = cache(2);
        let (k1, k2, k3) = (
            ModuleCache::key_for(b"1"),
            ModuleCache::key_for(b"2"),
            ModuleCache::key_for(b"3"),
        );

        cache.insert(k1.clone(), empty_module(&engine));
        cache.insert(k2.clone(), empty_module(&engine));
        assert!(cache.get(&k1).is_some());
        cache.insert(k3.clone(), empty_module(&engine));

        assert!(cache.contains(&k1));
        assert!(!cache.contains(&k2));
        assert!(cache.contains(&k3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_or_compile_compiles_once() {
        let engine = Engine::default();
        let cache = cache(2);
        let key = ModuleCache::key_for(b"once");
        let mut compiled = 0;

        for _ in 0..3 {
            cache
                .get_or_compile::<wasmtime::Error>(key.clone(), || {
                    compiled += 1;
                    Ok(empty_module(&engine))
                })
                .unwrap();
        }

        assert_eq!(compiled, 1);
        assert_eq!(cache.hits(), 2);
    }

    #[test]
    fn test_get_or_compile_propagates_errors() {
        let cache = cache(2);
        let result = cache.get_or_compile(ModuleCache::key_for(b"bad"), || Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let engine = Engine::default();
        let cache = cache(2);
        cache.insert(ModuleCache::key_for(b"a"), empty_module(&engine));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
    }
}
