//! Recording asset reader.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use orrery_content::{
    Asset, AssetReader, BoxedAsset, ContentError, ContentResult, ReadContext,
};
use parking_lot::Mutex;

type Factory = Box<dyn Fn(&mut ReadContext<'_>) -> ContentResult<BoxedAsset> + Send + Sync>;

/// One recorded `read` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCall {
    pub name: String,
    pub asset_type: &'static str,
}

/// An [`AssetReader`] assembled from per-type factories that records every call.
///
/// # Example
///
/// ```rust
/// use orrery_test_utils::RecordingReader;
///
/// let reader = RecordingReader::new().with(|ctx| Ok(ctx.name().to_uppercase()));
/// reader.fail_on("broken");
/// assert_eq!(reader.call_count(), 0);
/// ```
#[derive(Default)]
pub struct RecordingReader {
    factories: HashMap<TypeId, Factory>,
    calls: Mutex<Vec<ReadCall>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce `T` assets with `factory`.
    pub fn with<T, F>(mut self, factory: F) -> Self
    where
        T: Asset,
        F: Fn(&mut ReadContext<'_>) -> ContentResult<T> + Send + Sync + 'static,
    {
        let factory: Factory = Box::new(move |ctx: &mut ReadContext<'_>| {
            factory(ctx).map(|asset| Box::new(asset) as BoxedAsset)
        });
        self.factories.insert(TypeId::of::<T>(), factory);
        self
    }

    /// Make reads of exactly `name` fail with [`ContentError::ReadFailed`].
    pub fn fail_on(&self, name: impl Into<String>) {
        self.failing.lock().insert(name.into());
    }

    /// Stop failing any name.
    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    /// Copy of all recorded calls.
    pub fn calls(&self) -> Vec<ReadCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls for exactly `name`.
    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.name == name)
            .count()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }
}

impl AssetReader for RecordingReader {
    fn read(&self, ctx: &mut ReadContext<'_>) -> ContentResult<BoxedAsset> {
        self.calls.lock().push(ReadCall {
            name: ctx.name().to_string(),
            asset_type: ctx.asset_type().name(),
        });

        if self.failing.lock().contains(ctx.name()) {
            return Err(ContentError::read_failed(ctx.name(), "injected failure"));
        }

        let factory = self
            .factories
            .get(&ctx.asset_type().id())
            .ok_or(ContentError::NoReader {
                type_name: ctx.asset_type().name(),
            })?;
        factory(ctx)
    }
}
