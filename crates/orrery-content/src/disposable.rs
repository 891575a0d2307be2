//! Disposable resources and the per-manager registry that releases them.

use std::sync::{Arc, Weak};

use orrery_core::alloc::{HashMap, HashSet};

/// A resource that needs an explicit release call, such as a graphics API handle.
pub trait Disposable: Send + Sync {
    /// Release the underlying resource.
    ///
    /// A [`DisposableRegistry`] calls this at most once per registered instance.
    fn release(&self);
}

/// Shared handle to a disposable resource.
pub type DisposableRef = Arc<dyn Disposable>;

fn identity(resource: &DisposableRef) -> usize {
    Arc::as_ptr(resource) as *const () as usize
}

/// The set of disposable resources owned by one content manager.
///
/// Resources are deduplicated by identity: two assets may share the same underlying resource and
/// it must only be released once. Released instances are remembered for as long as something
/// else keeps them alive, so a reader handing out the same resource after an unload cannot get
/// it released a second time.
#[derive(Default)]
pub struct DisposableRegistry {
    resources: Vec<DisposableRef>,
    // The Arcs in `resources` keep these addresses from being reused.
    seen: HashSet<usize>,
    // A Weak keeps its allocation, so a tombstoned address is not reused until pruned.
    released: HashMap<usize, Weak<dyn Disposable>>,
}

impl DisposableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resource.
    ///
    /// Returns `false` if this exact instance is already recorded or was released before.
    pub fn record(&mut self, resource: DisposableRef) -> bool {
        self.prune_released();
        let id = identity(&resource);
        if self.released.contains_key(&id) {
            tracing::trace!("skipping already released disposable");
            return false;
        }
        if !self.seen.insert(id) {
            return false;
        }
        self.resources.push(resource);
        true
    }

    /// Check whether this exact instance is recorded.
    pub fn contains(&self, resource: &DisposableRef) -> bool {
        self.seen.contains(&identity(resource))
    }

    /// Release every recorded resource once, in recording order, and forget them.
    ///
    /// Returns the number of resources released.
    pub fn release_all(&mut self) -> usize {
        self.prune_released();
        let count = self.resources.len();
        for resource in self.resources.drain(..) {
            resource.release();
            self.released
                .insert(identity(&resource), Arc::downgrade(&resource));
        }
        self.seen.clear();
        count
    }

    /// Check whether this exact instance has already been released by this registry.
    pub fn is_released(&self, resource: &DisposableRef) -> bool {
        self.released.contains_key(&identity(resource))
    }

    fn prune_released(&mut self) {
        self.released.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Number of recorded resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl std::fmt::Debug for DisposableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposableRegistry")
            .field("len", &self.resources.len())
            .finish()
    }
}
