//! Counting disposable resource.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use orrery_content::Disposable;

/// A disposable that counts how often it was released.
#[derive(Debug, Default)]
pub struct MockDisposable {
    label: String,
    releases: AtomicUsize,
}

impl MockDisposable {
    /// Create a shared mock resource.
    pub fn new(label: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            label: label.into(),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of `release` calls so far.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Returns `true` after the first release.
    pub fn is_released(&self) -> bool {
        self.release_count() > 0
    }
}

impl Disposable for MockDisposable {
    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
