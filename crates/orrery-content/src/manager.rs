//! The content manager: load, cache and release assets for one content root.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use orrery_core::profiling::{profile_function, profile_scope};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::cache::AssetCache;
use crate::config::{ContentConfig, TypeMismatchPolicy};
use crate::disposable::DisposableRegistry;
use crate::error::{ContentError, ContentResult};
use crate::key::AssetKey;
use crate::reader::{AssetReader, AssetType, ReadContext, read_typed};
use crate::registry::{ManagerId, ManagerRegistry, ReloadFailure, ReloadReport, ReloadTarget};
use crate::scratch::ScratchBuffer;
use crate::service::ServiceProvider;
use crate::Asset;

/// Mutable per-manager state.
struct ManagerState {
    config: ContentConfig,
    cache: AssetCache,
    disposables: DisposableRegistry,
    scratch: ScratchBuffer,
    disposed: bool,
}

impl ManagerState {
    fn read_context<'a>(
        &'a mut self,
        name: &'a str,
        asset_type: AssetType,
        services: &'a ServiceProvider,
    ) -> ReadContext<'a> {
        ReadContext::new(
            name,
            asset_type,
            &self.config.root_directory,
            services,
            &mut self.scratch,
            &mut self.disposables,
        )
    }

    fn unload(&mut self, id: ManagerId) {
        let released = self.disposables.release_all();
        let assets = self.cache.len();
        self.cache.clear();
        if released > 0 || assets > 0 {
            tracing::debug!(manager = %id, assets, released, "unloaded content");
        }
    }
}

/// State shared between the owning [`ContentManager`] and the registry's weak reference.
struct ManagerShared {
    id: ManagerId,
    services: Arc<ServiceProvider>,
    reader: Arc<dyn AssetReader>,
    state: Mutex<ManagerState>,
}

impl ReloadTarget for ManagerShared {
    fn reload_graphics_assets(&self, report: &mut ReloadReport) {
        profile_function!();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return;
        }

        for (lookup, name, asset_type, reloader) in state.cache.reload_plan() {
            profile_scope!("reload_asset");
            let mut ctx = state.read_context(&name, asset_type, &self.services);
            match reloader(self.reader.as_ref(), &mut ctx) {
                Ok(asset) => {
                    if let Some(entry) = state.cache.get_mut_by_lookup(&lookup) {
                        entry.replace(asset);
                    }
                    report.reloaded += 1;
                    tracing::trace!(manager = %self.id, asset = %name, "reloaded asset");
                }
                Err(error) => {
                    tracing::warn!(
                        manager = %self.id,
                        asset = %name,
                        asset_type = asset_type.name(),
                        %error,
                        "failed to reload asset, keeping previous instance"
                    );
                    report.failures.push(ReloadFailure {
                        manager: self.id,
                        asset: name,
                        asset_type: asset_type.name(),
                        error,
                    });
                }
            }
        }
    }
}

impl Drop for ManagerShared {
    fn drop(&mut self) {
        // Dropped without dispose: release what we own. The registry entry is left to go stale.
        let state = self.state.get_mut();
        if !state.disposed {
            state.unload(self.id);
            state.scratch.release();
            state.disposed = true;
        }
    }
}

/// Loads assets through an [`AssetReader`], caches them by normalized name and owns the
/// disposable resources they create.
///
/// Every manager registers itself in a [`ManagerRegistry`] (the global one unless the builder
/// says otherwise) so a graphics-device reset can reload its assets.
///
/// A manager is meant to be driven from one thread at a time; the registry may reach it from
/// another thread during a reload broadcast.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use orrery_content::prelude::*;
///
/// let mut source = MemorySource::new();
/// source.insert("greeting.txt", b"hello".to_vec());
///
/// let mut readers = TypeReaderRegistry::new(source);
/// readers.register(TextReader);
///
/// let content = ContentManager::builder(Arc::new(ServiceProvider::new()), Arc::new(readers))
///     .registry(ManagerRegistry::new())
///     .build();
///
/// let text = content.load::<String>("greeting.txt").unwrap();
/// assert_eq!(text.as_str(), "hello");
/// ```
pub struct ContentManager {
    shared: Arc<ManagerShared>,
    registry: Arc<ManagerRegistry>,
}

impl ContentManager {
    /// Create a manager with default configuration, registered globally.
    pub fn new(services: Arc<ServiceProvider>, reader: Arc<dyn AssetReader>) -> Self {
        Self::builder(services, reader).build()
    }

    /// Start building a manager.
    pub fn builder(
        services: Arc<ServiceProvider>,
        reader: Arc<dyn AssetReader>,
    ) -> ContentManagerBuilder {
        ContentManagerBuilder::new(services, reader)
    }

    /// Process-unique id of this manager.
    pub fn id(&self) -> ManagerId {
        self.shared.id
    }

    /// Load an asset, reading it on the first request and returning the cached instance after.
    ///
    /// `name` is normalized (backslashes become `/`, case folded unless the key comparison is
    /// exact) to form the cache key; the reader always sees `name` as given.
    ///
    /// # Errors
    ///
    /// - [`ContentError::InvalidArgument`] if `name` is empty.
    /// - [`ContentError::Disposed`] after [`ContentManager::dispose`].
    /// - [`ContentError::TypeMismatch`] if the key is cached as another type and the policy is
    ///   [`TypeMismatchPolicy::Error`], or if the reader produced the wrong type.
    /// - Any error from the reader, unchanged. Failed reads are not cached.
    pub fn load<T: Asset>(&self, name: &str) -> ContentResult<Arc<T>> {
        profile_function!();
        if name.is_empty() {
            return Err(ContentError::InvalidArgument {
                argument: "name",
                reason: "asset name must not be empty".to_string(),
            });
        }

        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return Err(ContentError::Disposed);
        }

        let key = AssetKey::new(name, state.config.key_comparison);
        if let Some(entry) = state.cache.get(&key) {
            if let Some(asset) = entry.downcast::<T>() {
                tracing::trace!(manager = %self.shared.id, asset = key.name(), "cache hit");
                return Ok(asset);
            }
            if state.config.mismatch_policy == TypeMismatchPolicy::Error {
                return Err(ContentError::TypeMismatch {
                    name: name.to_string(),
                    expected: T::type_name(),
                    actual: entry.asset_type().name(),
                });
            }
            tracing::debug!(
                manager = %self.shared.id,
                asset = key.name(),
                cached = entry.asset_type().name(),
                requested = T::type_name(),
                "cached asset has another type, reading again"
            );
        }

        let asset = {
            profile_scope!("read_asset");
            let mut ctx = state.read_context(name, AssetType::of::<T>(), &self.shared.services);
            read_typed::<T>(self.shared.reader.as_ref(), &mut ctx)?
        };

        tracing::debug!(
            manager = %self.shared.id,
            asset = key.name(),
            asset_type = T::type_name(),
            "loaded asset"
        );
        state.cache.insert(key, Arc::clone(&asset));
        Ok(asset)
    }

    /// Release every recorded disposable exactly once and empty the cache.
    ///
    /// Safe to call any number of times. The manager stays registered and usable.
    pub fn unload(&self) {
        profile_function!();
        self.shared.state.lock().unload(self.shared.id);
    }

    /// Unload, free the scratch buffer and deregister. Later loads fail with
    /// [`ContentError::Disposed`]. A second call does nothing.
    pub fn dispose(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return;
            }
            state.unload(self.shared.id);
            state.scratch.release();
            state.disposed = true;
        }
        // The state lock is released first: broadcasts take the registry lock, then ours.
        self.registry.deregister(self.shared.id);
        tracing::debug!(manager = %self.shared.id, "disposed content manager");
    }

    /// Returns `true` once [`ContentManager::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    /// The directory asset names resolve against.
    pub fn root_directory(&self) -> PathBuf {
        self.shared.state.lock().config.root_directory.clone()
    }

    /// Change the root directory. Already loaded assets are not reloaded.
    pub fn set_root_directory(&self, root_directory: impl Into<PathBuf>) {
        self.shared.state.lock().config.root_directory = root_directory.into();
    }

    /// The service provider handed to readers.
    pub fn services(&self) -> &Arc<ServiceProvider> {
        &self.shared.services
    }

    /// The registry this manager is registered in.
    pub fn registry(&self) -> &Arc<ManagerRegistry> {
        &self.registry
    }

    /// Borrow the scratch buffer, grown to at least `max(min_size, MIN_SCRATCH_SIZE)` bytes.
    ///
    /// The manager is locked while the guard lives.
    ///
    /// [`MIN_SCRATCH_SIZE`]: crate::scratch::MIN_SCRATCH_SIZE
    pub fn scratch_buffer(&self, min_size: usize) -> ContentResult<MappedMutexGuard<'_, [u8]>> {
        let state = self.shared.state.lock();
        if state.disposed {
            return Err(ContentError::Disposed);
        }
        Ok(MutexGuard::map(state, |state| state.scratch.get(min_size)))
    }

    /// Check whether `name` is cached (under any type).
    pub fn is_loaded(&self, name: &str) -> bool {
        let state = self.shared.state.lock();
        let key = AssetKey::new(name, state.config.key_comparison);
        state.cache.contains(&key)
    }

    /// Number of cached assets.
    pub fn loaded_count(&self) -> usize {
        self.shared.state.lock().cache.len()
    }

    /// Names of all cached assets, as they will be passed to the reader on reload.
    pub fn loaded_names(&self) -> Vec<String> {
        self.shared
            .state
            .lock()
            .cache
            .iter()
            .map(|entry| entry.name().to_string())
            .collect()
    }

    /// Reload counter of a cached asset (1 after the first load).
    pub fn version(&self, name: &str) -> Option<u32> {
        let state = self.shared.state.lock();
        let key = AssetKey::new(name, state.config.key_comparison);
        state.cache.get(&key).map(|entry| entry.version())
    }

    /// Number of distinct disposable resources awaiting release.
    pub fn disposable_count(&self) -> usize {
        self.shared.state.lock().disposables.len()
    }
}

impl std::fmt::Debug for ContentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ContentManager")
            .field("id", &self.shared.id)
            .field("root_directory", &state.config.root_directory)
            .field("loaded", &state.cache.len())
            .field("disposables", &state.disposables.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

/// Builder for [`ContentManager`].
pub struct ContentManagerBuilder {
    services: Arc<ServiceProvider>,
    reader: Arc<dyn AssetReader>,
    config: ContentConfig,
    registry: Option<Arc<ManagerRegistry>>,
}

impl ContentManagerBuilder {
    pub fn new(services: Arc<ServiceProvider>, reader: Arc<dyn AssetReader>) -> Self {
        Self {
            services,
            reader,
            config: ContentConfig::default(),
            registry: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ContentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root_directory(mut self, root_directory: impl Into<PathBuf>) -> Self {
        self.config.root_directory = root_directory.into();
        self
    }

    /// Register in `registry` instead of the global one.
    pub fn registry(mut self, registry: Arc<ManagerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Create the manager and register it.
    pub fn build(self) -> ContentManager {
        let registry = self.registry.unwrap_or_else(ManagerRegistry::global);
        let shared = Arc::new(ManagerShared {
            id: ManagerId::next(),
            services: self.services,
            reader: self.reader,
            state: Mutex::new(ManagerState {
                config: self.config,
                cache: AssetCache::new(),
                disposables: DisposableRegistry::new(),
                scratch: ScratchBuffer::new(),
                disposed: false,
            }),
        });

        let target: Weak<ManagerShared> = Arc::downgrade(&shared);
        registry.register(shared.id, target);

        ContentManager { shared, registry }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::BoxedAsset;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Texture {
        name: String,
    }

    impl Asset for Texture {}

    #[derive(Default)]
    struct CountingReader {
        reads: AtomicUsize,
    }

    impl AssetReader for CountingReader {
        fn read(&self, ctx: &mut ReadContext<'_>) -> ContentResult<BoxedAsset> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if ctx.name().contains("missing") {
                return Err(ContentError::NotFound {
                    name: ctx.name().to_string(),
                });
            }
            if ctx.asset_type().is::<Texture>() {
                Ok(Box::new(Texture {
                    name: ctx.name().to_string(),
                }))
            } else if ctx.asset_type().is::<String>() {
                Ok(Box::new(ctx.name().to_string()))
            } else {
                Err(ContentError::NoReader {
                    type_name: ctx.asset_type().name(),
                })
            }
        }
    }

    fn manager(reader: &Arc<CountingReader>) -> ContentManager {
        let reader: Arc<dyn AssetReader> = reader.clone();
        ContentManager::builder(Arc::new(ServiceProvider::new()), reader)
            .root_directory("Content")
            .registry(ManagerRegistry::new())
            .build()
    }

    #[test]
    fn test_empty_name_rejected() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        assert!(matches!(
            content.load::<Texture>(""),
            Err(ContentError::InvalidArgument { .. })
        ));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reader_sees_name_as_given() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        let texture = content.load::<Texture>("sprites\\hero.png").unwrap();
        assert_eq!(texture.name, "sprites\\hero.png");
        assert!(content.is_loaded("sprites/hero.png"));
    }

    #[test]
    fn test_failed_read_not_cached() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        assert!(matches!(
            content.load::<Texture>("missing.png"),
            Err(ContentError::NotFound { .. })
        ));
        assert!(!content.is_loaded("missing.png"));
        assert_eq!(content.loaded_count(), 0);
    }

    #[test]
    fn test_wrong_type_rereads_by_default() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        content.load::<Texture>("shared").unwrap();
        let text = content.load::<String>("shared").unwrap();

        assert_eq!(text.as_str(), "shared");
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
        assert_eq!(content.loaded_count(), 1);
    }

    #[test]
    fn test_wrong_type_errors_when_configured() {
        let reader = Arc::new(CountingReader::default());
        let dyn_reader: Arc<dyn AssetReader> = reader.clone();
        let content = ContentManager::builder(Arc::new(ServiceProvider::new()), dyn_reader)
            .config(ContentConfig::default().with_mismatch_policy(TypeMismatchPolicy::Error))
            .registry(ManagerRegistry::new())
            .build();

        content.load::<Texture>("shared").unwrap();
        let result = content.load::<String>("shared");
        assert!(matches!(result, Err(ContentError::TypeMismatch { .. })));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_root_directory_accessors() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        assert_eq!(content.root_directory(), PathBuf::from("Content"));

        content.load::<Texture>("a").unwrap();
        content.set_root_directory("Other");
        assert_eq!(content.root_directory(), PathBuf::from("Other"));
        assert!(content.is_loaded("a"));
    }

    #[test]
    fn test_scratch_buffer() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        {
            let buffer = content.scratch_buffer(10).unwrap();
            assert_eq!(buffer.len(), crate::scratch::MIN_SCRATCH_SIZE);
        }
        content.dispose();
        assert!(matches!(
            content.scratch_buffer(10),
            Err(ContentError::Disposed)
        ));
    }

    #[test]
    fn test_registers_and_dispose_deregisters() {
        let reader = Arc::new(CountingReader::default());
        let content = manager(&reader);
        let registry = Arc::clone(content.registry());
        assert!(registry.contains(content.id()));

        content.unload();
        assert!(registry.contains(content.id()));

        content.dispose();
        assert!(!registry.contains(content.id()));
        assert!(matches!(
            content.load::<Texture>("a"),
            Err(ContentError::Disposed)
        ));
    }
}
