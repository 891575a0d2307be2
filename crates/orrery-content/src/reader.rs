//! The asset reader seam.
//!
//! A content manager never decodes anything itself. On a cache miss (and on every reload) it hands
//! an [`AssetReader`] a [`ReadContext`] describing what to produce and collects whatever
//! disposable resources the reader reports.

use std::any::{Any, TypeId};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::disposable::{DisposableRef, DisposableRegistry};
use crate::error::{ContentError, ContentResult};
use crate::scratch::ScratchBuffer;
use crate::service::ServiceProvider;
use crate::Asset;

/// A type-erased asset as stored in the cache.
pub type ErasedAsset = Arc<dyn Any + Send + Sync>;

/// A value produced by a reader before it is cached.
pub type BoxedAsset = Box<dyn Any + Send + Sync>;

/// Runtime descriptor of an asset type.
#[derive(Clone, Copy)]
pub struct AssetType {
    id: TypeId,
    name: &'static str,
}

impl AssetType {
    /// The descriptor for `T`.
    pub fn of<T: Asset>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::type_name(),
        }
    }

    /// The `TypeId` of the asset type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable name of the asset type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether this descriptor is for `T`.
    pub fn is<T: Asset>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for AssetType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AssetType {}

impl std::hash::Hash for AssetType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Everything a reader gets to produce one asset.
pub struct ReadContext<'a> {
    pub(crate) name: &'a str,
    pub(crate) asset_type: AssetType,
    pub(crate) root_directory: &'a Path,
    pub(crate) services: &'a ServiceProvider,
    pub(crate) scratch: &'a mut ScratchBuffer,
    pub(crate) disposables: &'a mut DisposableRegistry,
}

impl<'a> ReadContext<'a> {
    /// Create a read context.
    pub fn new(
        name: &'a str,
        asset_type: AssetType,
        root_directory: &'a Path,
        services: &'a ServiceProvider,
        scratch: &'a mut ScratchBuffer,
        disposables: &'a mut DisposableRegistry,
    ) -> Self {
        Self {
            name,
            asset_type,
            root_directory,
            services,
            scratch,
            disposables,
        }
    }

    /// The logical asset name as the caller wrote it.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The type the caller asked for.
    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    /// The manager's root directory, against which names resolve to physical storage.
    pub fn root_directory(&self) -> &Path {
        self.root_directory
    }

    /// Platform services (e.g. the graphics device).
    pub fn services(&self) -> &ServiceProvider {
        self.services
    }

    /// The manager's scratch buffer, grown to at least `min_size` bytes.
    pub fn scratch_buffer(&mut self, min_size: usize) -> &mut [u8] {
        self.scratch.get(min_size)
    }

    /// Report a disposable resource created while reading.
    ///
    /// Recording the same instance twice is a no-op.
    pub fn record_disposable(&mut self, resource: DisposableRef) {
        if !self.disposables.record(resource) {
            tracing::trace!(asset = self.name, "disposable already recorded");
        }
    }
}

/// Produces deserialized assets from logical names.
///
/// Readers must be callable repeatedly for the same name: the same context shape is used for the
/// first load and for every device-reset reload. The manager's state is locked while a reader
/// runs, so a reader must not call back into the manager that invoked it.
///
/// During a reload the [`ManagerRegistry`](crate::ManagerRegistry) is locked as well. A reader
/// may build, dispose or drop other content managers in that registry (the registration changes
/// are applied when the broadcast ends), but must not query it (`len`, `contains`, `live_count`)
/// or `clear` it.
pub trait AssetReader: Send + Sync {
    /// Produce an asset of `ctx.asset_type()` for `ctx.name()`.
    ///
    /// Errors are returned to the caller of `load` unchanged.
    fn read(&self, ctx: &mut ReadContext<'_>) -> ContentResult<BoxedAsset>;
}

impl<R: AssetReader + ?Sized> AssetReader for Arc<R> {
    fn read(&self, ctx: &mut ReadContext<'_>) -> ContentResult<BoxedAsset> {
        (**self).read(ctx)
    }
}

/// Ask `reader` for a `T` and check that it actually produced one.
pub(crate) fn read_typed<T: Asset>(
    reader: &dyn AssetReader,
    ctx: &mut ReadContext<'_>,
) -> ContentResult<Arc<T>> {
    debug_assert!(ctx.asset_type.is::<T>());
    let boxed = reader.read(ctx)?;
    match boxed.downcast::<T>() {
        Ok(asset) => Ok(Arc::from(asset)),
        Err(_) => Err(ContentError::TypeMismatch {
            name: ctx.name.to_string(),
            expected: T::type_name(),
            actual: "<unknown>",
        }),
    }
}

/// Re-read an asset whose concrete type was `T`, returning it erased.
///
/// Instantiated once per asset type and stored in each cache entry, so reloading needs no
/// runtime type discovery.
pub(crate) fn reload_as<T: Asset>(
    reader: &dyn AssetReader,
    ctx: &mut ReadContext<'_>,
) -> ContentResult<ErasedAsset> {
    read_typed::<T>(reader, ctx).map(|asset| asset as ErasedAsset)
}

/// Signature of the per-entry reload capsule.
pub(crate) type Reloader = fn(&dyn AssetReader, &mut ReadContext<'_>) -> ContentResult<ErasedAsset>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Answer;
    impl Asset for Answer {}

    struct FixedReader;

    impl AssetReader for FixedReader {
        fn read(&self, ctx: &mut ReadContext<'_>) -> ContentResult<BoxedAsset> {
            if ctx.asset_type().is::<Answer>() {
                Ok(Box::new(Answer))
            } else {
                // Deliberately wrong type.
                Ok(Box::new(42u32))
            }
        }
    }

    #[test]
    fn test_asset_type_identity() {
        assert_eq!(AssetType::of::<String>(), AssetType::of::<String>());
        assert_ne!(AssetType::of::<String>(), AssetType::of::<Vec<u8>>());
        assert!(AssetType::of::<Answer>().is::<Answer>());
    }

    #[test]
    fn test_read_typed_rejects_wrong_type() {
        let root = PathBuf::from("Content");
        let services = ServiceProvider::new();
        let mut scratch = ScratchBuffer::new();
        let mut disposables = DisposableRegistry::new();

        let mut ctx = ReadContext::new(
            "numbers",
            AssetType::of::<String>(),
            &root,
            &services,
            &mut scratch,
            &mut disposables,
        );
        let result = read_typed::<String>(&FixedReader, &mut ctx);
        assert!(matches!(result, Err(ContentError::TypeMismatch { .. })));

        let mut ctx = ReadContext::new(
            "answer",
            AssetType::of::<Answer>(),
            &root,
            &services,
            &mut scratch,
            &mut disposables,
        );
        assert!(reload_as::<Answer>(&FixedReader, &mut ctx).is_ok());
    }
}
