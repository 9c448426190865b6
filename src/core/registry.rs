//! # Action registry - the in-flight resolution set.
//!
//! Ordered list of live [`ResolveAction`]s, guarded by a single lock that is
//! held only for the registry access itself (never across an attempt).
//!
//! ## Rules
//! - An action is present iff its retry loop was submitted and has not finished.
//! - Removal goes through [`RegistryGuard`], so a loop that panics still leaves.
//! - `len` is mirrored into a `watch` channel so callers can await emptiness.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::core::action::ResolveAction;

/// In-flight actions, in submission order.
pub struct ActionRegistry {
    actions: Mutex<Vec<Arc<ResolveAction>>>,
    len: watch::Sender<usize>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        let (len, _rx) = watch::channel(0);
        Arc::new(Self {
            actions: Mutex::new(Vec::new()),
            len,
        })
    }

    /// Adds `action`; the returned guard removes it when dropped.
    pub fn add(self: &Arc<Self>, action: Arc<ResolveAction>) -> RegistryGuard {
        let id = action.id();
        {
            let mut actions = self.actions.lock();
            actions.push(action);
            self.len.send_replace(actions.len());
        }
        RegistryGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Removes the action with `id`. Returns false if it was not registered.
    pub fn remove(&self, id: u64) -> bool {
        let mut actions = self.actions.lock();
        let Some(pos) = actions.iter().position(|a| a.id() == id) else {
            return false;
        };
        actions.remove(pos);
        self.len.send_replace(actions.len());
        true
    }

    /// Cancels every registered action; returns how many were cancelled.
    pub fn stop_all(&self) -> usize {
        let actions = self.actions.lock();
        for action in actions.iter() {
            action.cancel();
        }
        actions.len()
    }

    /// Number of in-flight actions.
    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.actions.lock().is_empty()
    }

    /// Paths of in-flight actions, in submission order.
    pub fn paths(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .map(|a| a.path().to_string())
            .collect()
    }

    /// Waits until the registry is empty.
    pub async fn wait_empty(&self) {
        let mut rx = self.len.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|len| *len == 0).await;
    }
}

/// Removes its action from the registry on drop.
pub struct RegistryGuard {
    registry: Arc<ActionRegistry>,
    id: u64,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
