//! Resolver core: actions, the in-flight registry and the executor.
//!
//! The public entry point is [`Executor`], which accepts resolve requests,
//! drives [`ResolveAction`]s through a bounded retry loop and reports back.
//!
//! Internal modules:
//! - [`signal`]: re-armable completion flag shared by an action and its observer;
//! - [`action`]: one cancellable resolve attempt unit;
//! - [`registry`]: ordered set of in-flight actions;
//! - [`executor`]: retry loop, stop-all, message handling and shutdown;
//! - [`builder`]: executor construction.

mod action;
mod builder;
mod executor;
mod registry;
mod signal;

pub use action::{ActionParams, AttemptOutcome, ResolveAction};
pub use builder::ExecutorBuilder;
pub use executor::{Executor, Resolution};
pub use signal::CompletionSignal;
