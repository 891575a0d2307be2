//! Device reset example.
//!
//! This example shows:
//! - Serving content from an in-memory source
//! - Writing a typed reader that creates device resources through a service
//! - Sharing one graphics device between two content managers
//! - Reloading every cached asset after the device is lost and recreated

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use orrery_content::prelude::*;
use orrery_core::logging;
use orrery_core::profiling::{ProfilingBackend, init_profiling};

/// A toy graphics device. Each reset starts a new generation.
#[derive(Default)]
struct GraphicsDevice {
    generation: AtomicU32,
}

impl GraphicsDevice {
    fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Device-side handle owned by the content manager that created it.
struct GpuTexture {
    label: String,
    generation: u32,
}

impl Disposable for GpuTexture {
    fn release(&self) {
        tracing::info!(label = %self.label, generation = self.generation, "released texture");
    }
}

#[derive(Debug)]
struct Sprite {
    width: u32,
    height: u32,
    generation: u32,
}

impl Asset for Sprite {
    fn type_name() -> &'static str {
        "Sprite"
    }
}

/// Reads `width x height` headers into sprites.
struct SpriteReader;

impl TypeReader for SpriteReader {
    type Asset = Sprite;

    fn read(&self, ctx: &mut TypeReadContext<'_>) -> ContentResult<Sprite> {
        let text = std::str::from_utf8(ctx.bytes())
            .map_err(|e| ContentError::read_failed(ctx.name(), e))?;
        let (width, height) = text
            .trim()
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
            .ok_or_else(|| ContentError::read_failed(ctx.name(), "expected `WIDTHxHEIGHT`"))?;

        let device = ctx
            .services()
            .get::<GraphicsDevice>()
            .ok_or_else(|| ContentError::read_failed(ctx.name(), "no graphics device"))?;
        let generation = device.generation.load(Ordering::SeqCst);

        ctx.record_disposable(Arc::new(GpuTexture {
            label: ctx.name().to_string(),
            generation,
        }));

        Ok(Sprite {
            width,
            height,
            generation,
        })
    }
}

fn main() -> ContentResult<()> {
    logging::init();
    init_profiling(ProfilingBackend::PuffinHttp);

    let mut source = MemorySource::new();
    source.insert_static("sprites/hero", b"32x48");
    source.insert_static("sprites/slime", b"16x16");
    source.insert_static("ui/title.txt", b"Orrery");

    let mut readers = TypeReaderRegistry::new(source);
    readers.register(SpriteReader);
    readers.register(TextReader);
    let readers = Arc::new(readers);

    let device = Arc::new(GraphicsDevice::default());
    let mut services = ServiceProvider::new();
    services.insert_arc(Arc::clone(&device));
    let services = Arc::new(services);

    let level = ContentManager::new(Arc::clone(&services), readers.clone());
    let menu = ContentManager::new(Arc::clone(&services), readers.clone());

    let hero = level.load::<Sprite>("Sprites\\Hero")?;
    level.load::<Sprite>("sprites/slime")?;
    let title = menu.load::<String>("ui/title.txt")?;
    tracing::info!(?hero, title = %title, "loaded content");

    device.reset();
    let report = graphics_device_reset();
    tracing::info!(
        managers = report.managers,
        reloaded = report.reloaded,
        failed = report.failures.len(),
        "device reset handled"
    );

    let hero = level.load::<Sprite>("sprites/hero")?;
    tracing::info!(
        width = hero.width,
        height = hero.height,
        generation = hero.generation,
        "hero after reset"
    );

    menu.dispose();
    drop(level);
    Ok(())
}
