//! # Script runtime contract.
//!
//! [`ScriptRuntime`] is the seam to the interpreter that actually runs addon
//! scripts. The resolver never executes scripts itself; it only:
//! - launches one with a [`ResultSink`] the script reports into,
//! - waits for it to exit (through a [`ScriptObserver`](crate::ScriptObserver)),
//! - force-stops it on cancellation.

use std::fmt;

use async_trait::async_trait;

use crate::error::ScriptError;
use crate::script::ResultSink;

/// Identifier of a running script, assigned by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(pub u64);

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script#{}", self.0)
    }
}

/// # Interpreter that runs resolving scripts.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use plugin_resolver::{ResolvedItem, ResultSink, ScriptError, ScriptId, ScriptRuntime};
///
/// /// Resolves every plugin path to the same file, synchronously.
/// struct Static;
///
/// #[async_trait]
/// impl ScriptRuntime for Static {
///     fn launch(&self, _path: &str, _resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError> {
///         sink.set_resolved(true, ResolvedItem::new("/media/file.mkv"));
///         Ok(ScriptId(1))
///     }
///
///     fn force_stop(&self, _id: ScriptId) {}
///
///     async fn wait_exit(&self, _id: ScriptId) {}
/// }
/// ```
#[async_trait]
pub trait ScriptRuntime: Send + Sync + 'static {
    /// Starts the script behind `path` asynchronously and returns its id.
    ///
    /// The script reports its outcome through `sink`. Implementations must not
    /// block until the script finishes.
    fn launch(&self, path: &str, resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError>;

    /// Best-effort immediate termination of a running script.
    fn force_stop(&self, id: ScriptId);

    /// Completes when the script has exited, whatever the outcome.
    ///
    /// Must complete promptly for unknown or already-exited ids.
    async fn wait_exit(&self, id: ScriptId);
}
