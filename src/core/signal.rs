//! # Completion signal.
//!
//! A re-armable boolean flag backed by [`tokio::sync::watch`]. The action raises
//! its own signal when an attempt finishes. Each observed attempt also gets a
//! fresh signal that its [`ScriptObserver`](crate::ScriptObserver) raises on exit.
//! Any number of tasks can await either.
//!
//! ```text
//! reset() ──► false ──► raise() ──► true ──► (waiters wake)
//!                 ▲                   │
//!                 └──── reset() ──────┘   (next attempt)
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable completion flag. All clones share the same state.
#[derive(Clone, Debug)]
pub struct CompletionSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CompletionSignal {
    /// Creates a lowered signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raises the signal, waking every waiter. Raising twice is a no-op.
    pub fn raise(&self) {
        self.tx.send_if_modified(|raised| !std::mem::replace(raised, true));
    }

    /// Lowers the signal for the next attempt.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    /// Returns true if the signal is currently raised.
    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until the signal is raised. Returns immediately if it already is.
    pub async fn raised(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|raised| *raised).await;
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
