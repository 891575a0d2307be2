//! Orrery content management.
//!
//! A [`ContentManager`] turns logical asset names into shared runtime objects. It caches each
//! asset under a normalized key, owns the disposable resources readers create, and releases them
//! on [`ContentManager::unload`] or [`ContentManager::dispose`].
//!
//! Every manager registers weakly in a [`ManagerRegistry`]. When the graphics device is lost and
//! recreated, [`graphics_device_reset`] walks the registry and re-reads every cached asset of
//! every live manager in place.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use orrery_content::prelude::*;
//!
//! let mut source = MemorySource::new();
//! source.insert("sprites/hero.txt", b"hero".to_vec());
//!
//! let mut readers = TypeReaderRegistry::new(source);
//! readers.register(TextReader);
//!
//! let content = ContentManager::builder(Arc::new(ServiceProvider::new()), Arc::new(readers))
//!     .root_directory("Content")
//!     .registry(ManagerRegistry::new())
//!     .build();
//!
//! let a = content.load::<String>("sprites\\hero.txt").unwrap();
//! let b = content.load::<String>("sprites/HERO.txt").unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//!
//! let report = content.registry().broadcast_reload();
//! assert_eq!(report.reloaded, 1);
//! ```

pub mod cache;
pub mod config;
pub mod disposable;
pub mod error;
pub mod key;
pub mod manager;
pub mod reader;
pub mod registry;
pub mod scratch;
pub mod service;
pub mod source;
pub mod typed;

pub use cache::{AssetCache, CacheEntry};
pub use config::{ContentConfig, TypeMismatchPolicy};
pub use disposable::{Disposable, DisposableRef, DisposableRegistry};
pub use error::{ContentError, ContentResult};
pub use key::{AssetKey, KeyComparison};
pub use manager::{ContentManager, ContentManagerBuilder};
pub use reader::{AssetReader, AssetType, BoxedAsset, ErasedAsset, ReadContext};
pub use registry::{
    ManagerId, ManagerRegistry, ReloadFailure, ReloadReport, ReloadTarget, graphics_device_reset,
};
pub use scratch::{MIN_SCRATCH_SIZE, ScratchBuffer};
pub use service::{Service, ServiceProvider};
pub use source::{ByteSource, FileSource, MemorySource};
pub use typed::{BytesReader, TextReader, TypeReadContext, TypeReader, TypeReaderRegistry};

/// Trait for values a content manager can load.
pub trait Asset: Send + Sync + 'static {
    /// Human-readable type name used in errors and logs.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl Asset for String {
    fn type_name() -> &'static str {
        "String"
    }
}

impl Asset for Vec<u8> {
    fn type_name() -> &'static str {
        "Bytes"
    }
}

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Asset, AssetReader, AssetType, BoxedAsset, ByteSource, BytesReader, ContentConfig,
        ContentError, ContentManager, ContentResult, Disposable, DisposableRef, FileSource,
        KeyComparison, ManagerRegistry, MemorySource, ReadContext, ReloadReport, ServiceProvider,
        TextReader, TypeMismatchPolicy, TypeReadContext, TypeReader, TypeReaderRegistry,
        graphics_device_reset,
    };
}
