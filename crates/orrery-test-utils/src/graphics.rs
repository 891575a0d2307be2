//! Mock graphics device and the texture assets it backs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use orrery_content::{Asset, ContentError, ContentResult, Disposable, ReadContext};

/// Stand-in for a platform graphics device, registered as a service.
///
/// Every [`reset`](MockGraphicsDevice::reset) starts a new generation; textures remember the
/// generation they were created in.
#[derive(Debug, Default)]
pub struct MockGraphicsDevice {
    generation: AtomicU32,
    created: AtomicUsize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current device generation.
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Simulate losing and recreating the device. Returns the new generation.
    pub fn reset(&self) -> u32 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Allocate a texture on the current generation.
    pub fn create_texture(&self, width: u32, height: u32) -> Arc<MockTexture> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(MockTexture {
            width,
            height,
            generation: self.generation(),
            releases: AtomicUsize::new(0),
        })
    }

    /// Total textures created over the device's lifetime.
    pub fn textures_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

/// A device-side texture handle.
#[derive(Debug)]
pub struct MockTexture {
    pub width: u32,
    pub height: u32,
    pub generation: u32,
    releases: AtomicUsize,
}

impl MockTexture {
    /// Number of `release` calls so far.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Disposable for MockTexture {
    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// A loaded texture asset.
#[derive(Debug)]
pub struct Texture2D {
    pub name: String,
    pub gpu: Arc<MockTexture>,
}

impl Asset for Texture2D {
    fn type_name() -> &'static str {
        "Texture2D"
    }
}

/// Factory for [`RecordingReader`](crate::RecordingReader) producing 64x64 textures on the
/// [`MockGraphicsDevice`] service and recording them as disposables.
pub fn texture_factory(ctx: &mut ReadContext<'_>) -> ContentResult<Texture2D> {
    let device = ctx
        .services()
        .get::<MockGraphicsDevice>()
        .ok_or_else(|| ContentError::read_failed(ctx.name(), "no graphics device service"))?;

    let gpu = device.create_texture(64, 64);
    ctx.record_disposable(gpu.clone());

    Ok(Texture2D {
        name: ctx.name().to_string(),
        gpu,
    })
}
