//! Client-side completion store.
//!
//! One `ProgressStore` lives per client session and is shared by cloning.
//! Every effective write persists the whole map and bumps a change counter
//! that all observers watch, whichever material they follow.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use portal_core::model::{MaterialId, Percent, ProgressMap, ProgressState};
use storage::repository::ProgressBackend;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ProgressStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<StoreState>,
    changes: watch::Sender<u64>,
}

struct StoreState {
    progress: ProgressMap,
    /// `None` once the store runs in memory only.
    backend: Option<Arc<dyn ProgressBackend>>,
}

impl ProgressStore {
    /// Opens the store on top of `backend`.
    ///
    /// If the backend cannot be read the store starts empty and keeps
    /// everything in memory for the rest of the session.
    #[must_use]
    pub fn open(backend: Arc<dyn ProgressBackend>) -> Self {
        match backend.load_all() {
            Ok(progress) => Self::from_parts(progress, Some(backend)),
            Err(err) => {
                warn!(error = %err, "progress storage unavailable, keeping progress in memory only");
                Self::from_parts(ProgressMap::new(), None)
            }
        }
    }

    /// A store with no persistent backing.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::from_parts(ProgressMap::new(), None)
    }

    fn from_parts(progress: ProgressMap, backend: Option<Arc<dyn ProgressBackend>>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState { progress, backend }),
                changes,
            }),
        }
    }

    /// True when writes are not persisted anywhere.
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.lock().backend.is_none()
    }

    /// Stored progress for `id`; unknown ids read as zero.
    #[must_use]
    pub fn get_progress(&self, id: &MaterialId) -> Percent {
        self.lock().progress.get(id).copied().unwrap_or_default()
    }

    /// Sets an absolute percentage, clamped to `0..=100`.
    pub fn set_progress(&self, id: &MaterialId, value: f64) -> Percent {
        self.update_progress(id, |_| value)
    }

    /// Applies `f` to the current value under the store lock.
    ///
    /// Returns the stored value. When it did not change nothing is written
    /// and no observer is woken.
    ///
    /// `f` runs while the lock is held, as does the backend write, so
    /// concurrent updaters never lose each other's increments. `f` must not
    /// call back into this store or it deadlocks.
    pub fn update_progress(&self, id: &MaterialId, f: impl FnOnce(Percent) -> f64) -> Percent {
        self.write(id, f, None)
    }

    /// Shared write path. When `writer` is given and had nothing pending,
    /// it is marked as having seen its own notification. This happens under
    /// the store lock, which every notification also holds, so a pending
    /// foreign change is never swallowed.
    fn write(
        &self,
        id: &MaterialId,
        f: impl FnOnce(Percent) -> f64,
        writer: Option<&mut watch::Receiver<u64>>,
    ) -> Percent {
        let mut state = self.lock();
        let current = state.progress.get(id).copied().unwrap_or_default();
        let next = Percent::new(f(current));
        if state.progress.get(id) == Some(&next) {
            return next;
        }

        state.progress.insert(id.clone(), next);
        debug!(material = %id, progress = next.value(), "progress updated");
        if let Some(backend) = &state.backend {
            if let Err(err) = backend.save_all(&state.progress) {
                warn!(material = %id, error = %err, "failed to persist progress");
            }
        }
        let pending = writer
            .as_ref()
            .is_some_and(|rx| rx.has_changed().unwrap_or(false));
        self.notify();
        if let Some(rx) = writer {
            if !pending {
                rx.mark_unchanged();
            }
        }
        next
    }

    /// Re-reads the backend, picking up writes made by another client.
    ///
    /// Observers are woken only if the map actually changed. Read failures
    /// keep the current in-memory values.
    pub fn reload(&self) {
        let mut state = self.lock();
        let Some(backend) = state.backend.clone() else {
            return;
        };
        match backend.load_all() {
            Ok(progress) if progress != state.progress => {
                state.progress = progress;
                self.notify();
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to reload progress"),
        }
    }

    /// Copy of the whole map.
    #[must_use]
    pub fn snapshot(&self) -> ProgressMap {
        self.lock().progress.clone()
    }

    /// Handle that follows one material and wakes on every store change.
    #[must_use]
    pub fn observe(&self, id: MaterialId) -> MaterialProgress {
        let mut changes = self.inner.changes.subscribe();
        changes.mark_unchanged();
        MaterialProgress {
            id,
            store: self.clone(),
            changes,
        }
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|n| *n = n.wrapping_add(1));
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Per-material view of the store.
///
/// Reads always go to the store, so every handle for the same id agrees.
/// Writes made through this handle do not count as a change for the handle
/// itself; writes from anywhere else do.
#[derive(Clone)]
pub struct MaterialProgress {
    id: MaterialId,
    store: ProgressStore,
    changes: watch::Receiver<u64>,
}

impl MaterialProgress {
    #[must_use]
    pub fn id(&self) -> &MaterialId {
        &self.id
    }

    #[must_use]
    pub fn progress(&self) -> Percent {
        self.store.get_progress(&self.id)
    }

    #[must_use]
    pub fn state(&self) -> ProgressState {
        self.progress().state()
    }

    pub fn set(&mut self, value: f64) -> Percent {
        self.update(|_| value)
    }

    /// Same contract as [`ProgressStore::update_progress`].
    pub fn update(&mut self, f: impl FnOnce(Percent) -> f64) -> Percent {
        self.store.write(&self.id, f, Some(&mut self.changes))
    }

    /// Raises progress to 100. Returns false if it was already complete.
    pub fn mark_complete(&mut self) -> bool {
        if self.progress().is_complete() {
            return false;
        }
        self.set(Percent::COMPLETE.value());
        true
    }

    /// True if the store changed since this handle last looked.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changes.has_changed().unwrap_or(false)
    }

    /// Waits for the next store-wide change and returns the re-derived value.
    pub async fn changed(&mut self) -> Percent {
        // The sender lives in the store this handle owns, so this cannot fail.
        let _ = self.changes.changed().await;
        self.progress()
    }
}
