//! Per-manager asset cache keyed by normalized name.

use std::sync::Arc;

use orrery_core::alloc::HashMap;

use crate::key::AssetKey;
use crate::reader::{AssetType, ErasedAsset, Reloader, reload_as};
use crate::Asset;

/// One cached asset together with everything needed to reload it.
pub struct CacheEntry {
    /// Slash-normalized, case-preserved name the asset was first loaded under.
    name: String,
    asset: ErasedAsset,
    asset_type: AssetType,
    reloader: Reloader,
    version: u32,
}

impl CacheEntry {
    /// Wrap a freshly read asset of type `T`.
    pub(crate) fn new<T: Asset>(name: String, asset: Arc<T>) -> Self {
        Self {
            name,
            asset,
            asset_type: AssetType::of::<T>(),
            reloader: reload_as::<T>,
            version: 1,
        }
    }

    /// The cached asset if it is a `T`.
    pub fn downcast<T: Asset>(&self) -> Option<Arc<T>> {
        self.asset.clone().downcast::<T>().ok()
    }

    /// The name reloads are issued under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The concrete type of the cached asset.
    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    /// Starts at 1 and increments on every successful reload.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Swap in a reloaded asset of the same type.
    pub(crate) fn replace(&mut self, asset: ErasedAsset) {
        self.asset = asset;
        self.version = self.version.wrapping_add(1);
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("name", &self.name)
            .field("asset_type", &self.asset_type)
            .field("version", &self.version)
            .finish()
    }
}

/// Mapping from normalized asset key to cached asset. At most one entry per key.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, CacheEntry>,
}

impl AssetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    pub fn get(&self, key: &AssetKey) -> Option<&CacheEntry> {
        self.entries.get(key.lookup())
    }

    /// Look up a `T` under `key`. Entries of another type are ignored.
    pub fn get_typed<T: Asset>(&self, key: &AssetKey) -> Option<Arc<T>> {
        self.get(key).and_then(CacheEntry::downcast::<T>)
    }

    /// Store a `T` under `key`, replacing whatever was there.
    pub fn insert<T: Asset>(&mut self, key: AssetKey, asset: Arc<T>) {
        let (name, lookup) = key.into_parts();
        self.entries.insert(lookup, CacheEntry::new(name, asset));
    }

    /// Check whether `key` is cached.
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.entries.contains_key(key.lookup())
    }

    /// Mutable access by lookup form, used by reloads.
    pub(crate) fn get_mut_by_lookup(&mut self, lookup: &str) -> Option<&mut CacheEntry> {
        self.entries.get_mut(lookup)
    }

    /// Snapshot of `(lookup, name, type, reloader)` for every entry, so reloads can borrow the
    /// rest of the manager mutably while walking the cache.
    pub(crate) fn reload_plan(&self) -> Vec<(String, String, AssetType, Reloader)> {
        self.entries
            .iter()
            .map(|(lookup, entry)| {
                (
                    lookup.clone(),
                    entry.name.clone(),
                    entry.asset_type,
                    entry.reloader,
                )
            })
            .collect()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyComparison;

    #[derive(Debug, PartialEq)]
    struct Texture {
        width: u32,
    }

    impl Asset for Texture {}

    fn key(name: &str) -> AssetKey {
        AssetKey::new(name, KeyComparison::CaseInsensitive)
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = AssetCache::new();
        let texture = Arc::new(Texture { width: 64 });
        cache.insert(key("sprites\\hero.png"), texture.clone());

        let found = cache.get_typed::<Texture>(&key("Sprites/Hero.PNG")).unwrap();
        assert!(Arc::ptr_eq(&found, &texture));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_wrong_type_not_returned() {
        let mut cache = AssetCache::new();
        cache.insert(key("data"), Arc::new(Texture { width: 1 }));

        assert!(cache.contains(&key("data")));
        assert!(cache.get_typed::<String>(&key("data")).is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut cache = AssetCache::new();
        cache.insert(key("data"), Arc::new(Texture { width: 1 }));
        cache.insert(key("DATA"), Arc::new("text".to_string()));

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get_typed::<String>(&key("data")).as_deref(),
            Some(&"text".to_string())
        );
    }

    #[test]
    fn test_entry_keeps_first_spelling() {
        let mut cache = AssetCache::new();
        cache.insert(key("Fonts\\Title.spritefont"), Arc::new(Texture { width: 1 }));

        let entry = cache.get(&key("fonts/title.spritefont")).unwrap();
        assert_eq!(entry.name(), "Fonts/Title.spritefont");
        assert_eq!(entry.asset_type(), AssetType::of::<Texture>());
        assert_eq!(entry.version(), 1);
    }

    #[test]
    fn test_replace_bumps_version() {
        let mut cache = AssetCache::new();
        cache.insert(key("a"), Arc::new(Texture { width: 1 }));

        let entry = cache.get_mut_by_lookup(key("a").lookup()).unwrap();
        entry.replace(Arc::new(Texture { width: 2 }));

        let entry = cache.get(&key("a")).unwrap();
        assert_eq!(entry.version(), 2);
        assert_eq!(entry.downcast::<Texture>().unwrap().width, 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = AssetCache::new();
        cache.insert(key("a"), Arc::new(Texture { width: 1 }));
        cache.insert(key("b"), Arc::new(Texture { width: 2 }));
        assert_eq!(cache.reload_plan().len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
