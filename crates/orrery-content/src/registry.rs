//! Process-wide registry of live content managers and the device-reset broadcast.
//!
//! The registry holds only weak references. Managers register themselves on construction and
//! deregister on `dispose`; a manager that is simply dropped leaves a dead entry behind, which is
//! pruned the next time the registry is touched.
//!
//! A broadcast holds the registry lock while readers run. Readers may still create or dispose
//! managers in the same registry: on the broadcasting thread those changes are queued and applied
//! once the traversal is done.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};

use orrery_core::profiling::profile_function;
use parking_lot::Mutex;

use crate::error::ContentError;

/// Process-unique identifier of a content manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u64);

impl ManagerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manager#{}", self.0)
    }
}

/// Something the registry can ask to rebuild its graphics assets.
pub trait ReloadTarget: Send + Sync {
    /// Re-read every cached asset, recording results into `report`.
    fn reload_graphics_assets(&self, report: &mut ReloadReport);
}

/// One asset that could not be re-read during a broadcast.
#[derive(Debug)]
pub struct ReloadFailure {
    pub manager: ManagerId,
    /// Name the reload was issued under.
    pub asset: String,
    pub asset_type: &'static str,
    pub error: ContentError,
}

/// Outcome of a [`ManagerRegistry::broadcast_reload`].
///
/// Failed assets keep their previous cache entry; the broadcast never stops early.
#[derive(Debug, Default)]
pub struct ReloadReport {
    /// Live managers visited.
    pub managers: usize,
    /// Assets successfully re-read.
    pub reloaded: usize,
    /// Dead entries removed during the traversal.
    pub pruned: usize,
    pub failures: Vec<ReloadFailure>,
}

impl ReloadReport {
    /// Returns `true` if every asset was reloaded.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

struct RegistryEntry {
    id: ManagerId,
    target: Weak<dyn ReloadTarget>,
}

/// A change requested from inside a broadcast on the broadcasting thread.
enum PendingChange {
    Register(RegistryEntry),
    Deregister(ManagerId),
}

thread_local! {
    /// Addresses of the registries this thread is currently broadcasting on.
    static BROADCASTING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a registry as broadcasting on this thread until dropped.
struct BroadcastGuard {
    registry: usize,
}

impl BroadcastGuard {
    fn enter(registry: &ManagerRegistry) -> Self {
        let registry = registry.address();
        BROADCASTING.with_borrow_mut(|active| active.push(registry));
        Self { registry }
    }
}

impl Drop for BroadcastGuard {
    fn drop(&mut self) {
        BROADCASTING.with_borrow_mut(|active| {
            if let Some(pos) = active.iter().rposition(|r| *r == self.registry) {
                active.remove(pos);
            }
        });
    }
}

static GLOBAL: LazyLock<Arc<ManagerRegistry>> = LazyLock::new(ManagerRegistry::new);

/// Weakly-held set of live content managers.
///
/// All mutations and the broadcast traversal are serialized under one lock. Registrations made
/// by readers during a broadcast on the same thread are deferred until the traversal ends.
pub struct ManagerRegistry {
    entries: Mutex<Vec<RegistryEntry>>,
    pending: Mutex<Vec<PendingChange>>,
}

impl ManagerRegistry {
    /// Create an independent registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    fn address(&self) -> usize {
        self as *const Self as usize
    }

    /// Returns `true` while this thread is inside [`ManagerRegistry::broadcast_reload`] on this
    /// registry.
    pub fn is_broadcasting(&self) -> bool {
        let registry = self.address();
        BROADCASTING.with_borrow(|active| active.contains(&registry))
    }

    /// The process-wide registry.
    ///
    /// Created on first use and kept until the process exits; [`ManagerRegistry::clear`] is the
    /// explicit teardown.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Add a manager unless a live entry already refers to it.
    ///
    /// Returns `true` if an entry was added. Called from a reader during a broadcast on this
    /// registry, the entry is queued and `true` is returned.
    pub fn register(&self, id: ManagerId, target: Weak<dyn ReloadTarget>) -> bool {
        if self.is_broadcasting() {
            tracing::debug!(manager = %id, "deferring registration until broadcast ends");
            self.pending
                .lock()
                .push(PendingChange::Register(RegistryEntry { id, target }));
            return true;
        }

        let mut entries = self.entries.lock();
        prune(&mut entries);
        insert_entry(&mut entries, RegistryEntry { id, target })
    }

    /// Remove a manager. Returns `true` if it was present.
    ///
    /// Called from a reader during a broadcast on this registry, the removal is queued and
    /// `true` is returned.
    pub fn deregister(&self, id: ManagerId) -> bool {
        if self.is_broadcasting() {
            tracing::debug!(manager = %id, "deferring deregistration until broadcast ends");
            self.pending.lock().push(PendingChange::Deregister(id));
            return true;
        }

        let mut entries = self.entries.lock();
        prune(&mut entries);
        remove_entry(&mut entries, id)
    }

    /// Ask every live manager to reload its assets.
    ///
    /// Dead entries are dropped along the way and never cause an error. A reader that calls this
    /// again on the same registry gets an empty report.
    pub fn broadcast_reload(&self) -> ReloadReport {
        profile_function!();
        let mut report = ReloadReport::default();
        if self.is_broadcasting() {
            tracing::warn!("ignoring nested reload broadcast");
            return report;
        }

        let mut entries = self.entries.lock();
        {
            let _guard = BroadcastGuard::enter(self);
            entries.retain(|entry| match entry.target.upgrade() {
                Some(target) => {
                    report.managers += 1;
                    target.reload_graphics_assets(&mut report);
                    true
                }
                None => {
                    report.pruned += 1;
                    false
                }
            });
        }
        self.apply_pending(&mut entries);

        tracing::info!(
            managers = report.managers,
            reloaded = report.reloaded,
            failed = report.failures.len(),
            pruned = report.pruned,
            "reloaded graphics content"
        );
        report
    }

    fn apply_pending(&self, entries: &mut Vec<RegistryEntry>) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for change in pending {
            match change {
                PendingChange::Register(entry) => {
                    insert_entry(entries, entry);
                }
                PendingChange::Deregister(id) => {
                    remove_entry(entries, id);
                }
            }
        }
    }

    /// Number of entries, dead or alive. Does not prune.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of entries whose manager is still alive. Does not prune.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.target.strong_count() > 0)
            .count()
    }

    /// Check whether a manager is registered.
    pub fn contains(&self, id: ManagerId) -> bool {
        self.entries.lock().iter().any(|entry| entry.id == id)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

fn insert_entry(entries: &mut Vec<RegistryEntry>, entry: RegistryEntry) -> bool {
    if entries.iter().any(|existing| existing.id == entry.id) {
        tracing::debug!(manager = %entry.id, "manager already registered");
        return false;
    }

    let id = entry.id;
    entries.push(entry);
    tracing::debug!(manager = %id, live = entries.len(), "registered content manager");
    true
}

fn remove_entry(entries: &mut Vec<RegistryEntry>, id: ManagerId) -> bool {
    let before = entries.len();
    entries.retain(|entry| entry.id != id);
    let removed = entries.len() != before;
    if removed {
        tracing::debug!(manager = %id, live = entries.len(), "deregistered content manager");
    }
    removed
}

fn prune(entries: &mut Vec<RegistryEntry>) -> usize {
    let before = entries.len();
    entries.retain(|entry| entry.target.strong_count() > 0);
    let pruned = before - entries.len();
    if pruned > 0 {
        tracing::trace!(pruned, "pruned dead content managers");
    }
    pruned
}

/// Platform hook for a lost-and-recreated graphics device.
///
/// Reloads the assets of every live manager in the global registry.
pub fn graphics_device_reset() -> ReloadReport {
    tracing::info!("graphics device reset");
    ManagerRegistry::global().broadcast_reload()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Target {
        reloads: AtomicUsize,
    }

    impl ReloadTarget for Target {
        fn reload_graphics_assets(&self, report: &mut ReloadReport) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            report.reloaded += 1;
        }
    }

    fn weak(target: &Arc<Target>) -> Weak<dyn ReloadTarget> {
        let weak: Weak<Target> = Arc::downgrade(target);
        weak
    }

    #[test]
    fn test_manager_ids_unique() {
        assert_ne!(ManagerId::next(), ManagerId::next());
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let registry = ManagerRegistry::new();
        let target = Arc::new(Target::default());
        let id = ManagerId::next();

        assert!(registry.register(id, weak(&target)));
        assert!(!registry.register(id, weak(&target)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister() {
        let registry = ManagerRegistry::new();
        let target = Arc::new(Target::default());
        let id = ManagerId::next();
        registry.register(id, weak(&target));

        assert!(registry.deregister(id));
        assert!(!registry.deregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dead_entries_pruned_lazily() {
        let registry = ManagerRegistry::new();
        let dead = Arc::new(Target::default());
        registry.register(ManagerId::next(), weak(&dead));
        drop(dead);

        // Nothing touched the registry yet.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.live_count(), 0);

        let alive = Arc::new(Target::default());
        registry.register(ManagerId::next(), weak(&alive));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deregister_prunes() {
        let registry = ManagerRegistry::new();
        let dead = Arc::new(Target::default());
        registry.register(ManagerId::next(), weak(&dead));
        drop(dead);

        assert!(!registry.deregister(ManagerId::next()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_visits_live_and_prunes_dead() {
        let registry = ManagerRegistry::new();
        let a = Arc::new(Target::default());
        let b = Arc::new(Target::default());
        let dead = Arc::new(Target::default());
        registry.register(ManagerId::next(), weak(&a));
        registry.register(ManagerId::next(), weak(&dead));
        registry.register(ManagerId::next(), weak(&b));
        drop(dead);

        let report = registry.broadcast_reload();
        assert_eq!(report.managers, 2);
        assert_eq!(report.reloaded, 2);
        assert_eq!(report.pruned, 1);
        assert!(report.is_ok());
        assert_eq!(a.reloads.load(Ordering::SeqCst), 1);
        assert_eq!(b.reloads.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 2);
    }

    /// Registers a child (and drops a throwaway one) every time it is reloaded.
    struct Spawner {
        registry: Arc<ManagerRegistry>,
        child: Arc<Target>,
        child_id: ManagerId,
    }

    impl ReloadTarget for Spawner {
        fn reload_graphics_assets(&self, report: &mut ReloadReport) {
            assert!(self.registry.is_broadcasting());
            self.registry.register(self.child_id, weak(&self.child));

            let temporary = Arc::new(Target::default());
            let temporary_id = ManagerId::next();
            self.registry.register(temporary_id, weak(&temporary));
            self.registry.deregister(temporary_id);

            assert_eq!(self.registry.broadcast_reload().managers, 0);
            report.reloaded += 1;
        }
    }

    #[test]
    fn test_registration_during_broadcast_is_deferred() {
        let registry = ManagerRegistry::new();
        let spawner = Arc::new(Spawner {
            registry: Arc::clone(&registry),
            child: Arc::new(Target::default()),
            child_id: ManagerId::next(),
        });
        let spawner_weak: Weak<Spawner> = Arc::downgrade(&spawner);
        registry.register(ManagerId::next(), spawner_weak);

        let report = registry.broadcast_reload();
        assert_eq!(report.managers, 1);
        assert_eq!(report.reloaded, 1);
        assert!(!registry.is_broadcasting());
        assert!(registry.contains(spawner.child_id));
        assert_eq!(registry.len(), 2);

        // The child takes part in the next broadcast; the spawner re-registering it is a no-op.
        let report = registry.broadcast_reload();
        assert_eq!(report.managers, 2);
        assert_eq!(spawner.child.reloads.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear() {
        let registry = ManagerRegistry::new();
        let a = Arc::new(Target::default());
        let id = ManagerId::next();
        registry.register(id, weak(&a));
        assert!(registry.contains(id));

        registry.clear();
        assert!(!registry.contains(id));
    }
}
