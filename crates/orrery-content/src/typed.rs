//! Typed reader dispatch.
//!
//! [`TypeReaderRegistry`] is an [`AssetReader`] built from one [`TypeReader`] per asset type. It
//! pulls the asset's bytes from a [`ByteSource`] and hands them to the reader registered for the
//! requested type.

use std::any::TypeId;
use std::sync::Arc;

use orrery_core::alloc::HashMap;

use crate::disposable::{DisposableRef, DisposableRegistry};
use crate::error::{ContentError, ContentResult};
use crate::reader::{AssetReader, AssetType, BoxedAsset, ReadContext};
use crate::service::ServiceProvider;
use crate::source::ByteSource;
use crate::Asset;

/// Context handed to a [`TypeReader`].
pub struct TypeReadContext<'a> {
    name: &'a str,
    bytes: &'a [u8],
    services: &'a ServiceProvider,
    disposables: &'a mut DisposableRegistry,
}

impl<'a> TypeReadContext<'a> {
    /// The logical asset name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The raw bytes of the asset.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Platform services.
    pub fn services(&self) -> &ServiceProvider {
        self.services
    }

    /// Report a disposable resource created while decoding.
    pub fn record_disposable(&mut self, resource: DisposableRef) {
        self.disposables.record(resource);
    }
}

/// Decodes one asset type from bytes.
///
/// # Example
///
/// ```ignore
/// struct LevelReader;
///
/// impl TypeReader for LevelReader {
///     type Asset = Level;
///
///     fn read(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<Level> {
///         Level::parse(ctx.bytes()).map_err(|e| ContentError::read_failed(ctx.name(), e))
///     }
/// }
/// ```
pub trait TypeReader: Send + Sync + 'static {
    /// The asset type this reader produces.
    type Asset: Asset;

    /// Decode an asset.
    fn read(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<Self::Asset>;
}

/// Type-erased [`TypeReader`] for dynamic dispatch.
trait ErasedTypeReader: Send + Sync {
    fn asset_type(&self) -> AssetType;

    fn read_erased(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<BoxedAsset>;
}

impl<R: TypeReader> ErasedTypeReader for R {
    fn asset_type(&self) -> AssetType {
        AssetType::of::<R::Asset>()
    }

    fn read_erased(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<BoxedAsset> {
        let asset = self.read(ctx)?;
        Ok(Box::new(asset))
    }
}

/// An [`AssetReader`] that dispatches on the requested asset type.
pub struct TypeReaderRegistry {
    source: Box<dyn ByteSource>,
    readers: HashMap<TypeId, Arc<dyn ErasedTypeReader>>,
}

impl TypeReaderRegistry {
    /// Create a registry reading bytes from `source`.
    pub fn new(source: impl ByteSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            readers: HashMap::new(),
        }
    }

    /// Register a reader, replacing any existing reader for the same asset type.
    ///
    /// Returns `true` if a reader was replaced.
    pub fn register<R: TypeReader>(&mut self, reader: R) -> bool {
        let reader: Arc<dyn ErasedTypeReader> = Arc::new(reader);
        let asset_type = reader.asset_type();
        let replaced = self.readers.insert(asset_type.id(), reader).is_some();
        if replaced {
            tracing::debug!(asset_type = asset_type.name(), "replaced type reader");
        }
        replaced
    }

    /// Check whether a reader is registered for `T`.
    pub fn has_reader_for<T: Asset>(&self) -> bool {
        self.readers.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered readers.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Check if no readers are registered.
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl AssetReader for TypeReaderRegistry {
    fn read(&self, ctx: &mut ReadContext<'_>) -> ContentResult<BoxedAsset> {
        let reader = self
            .readers
            .get(&ctx.asset_type.id())
            .ok_or(ContentError::NoReader {
                type_name: ctx.asset_type.name(),
            })?;

        let bytes = self
            .source
            .read(ctx.root_directory, ctx.name, &mut *ctx.scratch)?;
        let mut typed = TypeReadContext {
            name: ctx.name,
            bytes,
            services: ctx.services,
            disposables: &mut *ctx.disposables,
        };
        reader.read_erased(&mut typed)
    }
}

/// Reads UTF-8 text.
pub struct TextReader;

impl TypeReader for TextReader {
    type Asset = String;

    fn read(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<String> {
        String::from_utf8(ctx.bytes().to_vec())
            .map_err(|e| ContentError::read_failed(ctx.name(), format!("invalid UTF-8: {}", e)))
    }
}

/// Reads raw bytes.
pub struct BytesReader;

impl TypeReader for BytesReader {
    type Asset = Vec<u8>;

    fn read(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<Vec<u8>> {
        Ok(ctx.bytes().to_vec())
    }
}
