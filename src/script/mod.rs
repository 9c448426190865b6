//! # Script collaborators.
//!
//! - [`ScriptRuntime`] - external interpreter contract (launch / force-stop / wait-exit)
//! - [`ScriptHandle`] - per-action execution handle, owns the reported result
//! - [`ResultSink`] - reporting end handed to the running script
//! - [`ScriptExecutionInfo`] - id + fast-completion flag of one execution
//! - [`ScriptObserver`] - raises a completion signal when a script exits

mod handle;
mod observer;
mod runtime;

pub use handle::{ResultSink, ScriptExecutionInfo, ScriptHandle};
pub use observer::ScriptObserver;
pub use runtime::{ScriptId, ScriptRuntime};
