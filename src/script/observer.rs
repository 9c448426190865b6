//! # Script observer.
//!
//! Watches one script's lifecycle and raises a [`CompletionSignal`] when the
//! script exits. The signal belongs to a single attempt; an aborted observer
//! that has not yet been polled cannot raise a later attempt's signal.
//! Used on the slow path only: scripts that report within the fast-path
//! window never get an observer.
//!
//! ```text
//! ScriptObserver::new(id, signal)
//!     └──► tokio task: select (biased) {
//!              abort token           ──► (nothing)
//!              runtime.wait_exit(id) ──► signal.raise()
//!          }
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::CompletionSignal;
use crate::script::{ScriptId, ScriptRuntime};

/// Background watcher bound to one script id. Aborts on drop.
pub struct ScriptObserver {
    id: ScriptId,
    abort: CancellationToken,
    join: JoinHandle<()>,
}

impl ScriptObserver {
    /// Starts observing `id`; raises `signal` once the script exits.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(runtime: Arc<dyn ScriptRuntime>, id: ScriptId, signal: CompletionSignal) -> Self {
        let abort = CancellationToken::new();
        let token = abort.clone();

        let join = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = runtime.wait_exit(id) => signal.raise(),
            }
        });

        Self { id, abort, join }
    }

    /// Script this observer watches.
    pub fn id(&self) -> ScriptId {
        self.id
    }

    /// Stops observing. Leaves the signal untouched.
    pub fn abort(&self) {
        self.abort.cancel();
    }

    /// Returns true once the watcher task has ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for ScriptObserver {
    fn drop(&mut self) {
        self.abort.cancel();
    }
}
