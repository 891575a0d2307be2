//! Test utilities for Orrery.
//!
//! Mocks for the collaborators a content manager talks to:
//!
//! - [`RecordingReader`] - an asset reader built from per-type factories that records every call
//! - [`MockDisposable`] - a disposable resource that counts its releases
//! - [`MockGraphicsDevice`] - a graphics-device service whose generation changes on reset
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use orrery_content::{ContentManager, ManagerRegistry, ServiceProvider};
//! use orrery_test_utils::{RecordingReader, MockGraphicsDevice, Texture2D, texture_factory};
//!
//! let mut services = ServiceProvider::new();
//! services.insert(MockGraphicsDevice::new());
//!
//! let reader = Arc::new(RecordingReader::new().with(texture_factory));
//! let content = ContentManager::builder(Arc::new(services), reader.clone())
//!     .registry(ManagerRegistry::new())
//!     .build();
//!
//! let texture = content.load::<Texture2D>("sprites/hero").unwrap();
//! assert_eq!(texture.gpu.generation, 0);
//! assert_eq!(reader.call_count(), 1);
//! ```
//!
//! # Interior Mutability
//!
//! Readers and disposables are called through `&self` from behind `Arc`s, so the mocks record
//! into `parking_lot::Mutex` and atomics.

pub mod disposable;
pub mod graphics;
pub mod reader;

pub use disposable::MockDisposable;
pub use graphics::{MockGraphicsDevice, MockTexture, Texture2D, texture_factory};
pub use reader::{ReadCall, RecordingReader};
