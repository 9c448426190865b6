//! # plugin-resolver
//!
//! **plugin-resolver** turns indirect `plugin://` media references into concrete,
//! playable locations by driving an external script runtime.
//!
//! A caller hands a [`MediaItem`] to the [`Executor`]; the executor launches the
//! plugin script through a [`ScriptRuntime`], waits for it to report a
//! [`ResolvedItem`], retries a bounded number of times and posts the resolved
//! item back over the [`MessageBus`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller / player                                   ScriptRuntime (external)
//!        │ ResolvePluginPath                              ▲      │ ResultSink
//!        ▼                                                │      │ set_resolved()
//! ┌──────────────┐   ┌───────────────────────────────┐   │      │
//! │  MessageBus  │──►│ Executor                      │   │      │
//! └──────▲───────┘   │  - ActionRegistry (one lock)  │   │      │
//!        │           │  - retry loop per action      │   │      │
//!        │           └──────┬────────────────────────┘   │      │
//!        │                  ▼                            │      ▼
//!        │           ┌───────────────┐  launch/stop  ┌───┴────────────┐
//!        │           │ ResolveAction │──────────────►│  ScriptHandle  │
//!        │           │  run/finish   │◄── signal ────│  ScriptObserver│
//!        │           └──────┬────────┘               └────────────────┘
//!        │                  │ item.apply(resolved)
//!        └─ PluginPathResolved{item, player}
//!
//!  Actions/Executor ── publish(Event) ──► Bus ──► SubscriberSet ──► LogWriter, ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! submit(path, action, on_success) ──► registry.add ──► tokio::spawn
//!
//! loop {
//!   ├─► stop if cancelled or attempt == max_attempts
//!   ├─► attempt += 1, publish AttemptStarting
//!   ├─► action.execute_and_wait()
//!   │       ├─ fast path: script reported within poll_tick
//!   │       └─ slow path: observer + select { cancel, signal, report }
//!   ├─► resolution_succeeded ─► on_success() once, publish Resolved, exit
//!   └─► publish AttemptFailed
//! }
//! cancelled ─► ResolutionCancelled
//! exhausted ─► tracing::error! once, RetriesExhausted
//! always    ─► registry.remove, ActionRemoved
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                      |
//! |-------------------|------------------------------------------------------------|-----------------------------------------|
//! | **Items**         | Media items, plugin detection, script results.             | [`MediaItem`], [`ResolvedItem`]         |
//! | **Scripts**       | Interface to the external script interpreter.              | [`ScriptRuntime`], [`ScriptHandle`]     |
//! | **Resolution**    | Cancellable attempts, bounded retries, stop-all.           | [`ResolveAction`], [`Executor`]         |
//! | **Messaging**     | Addressed request/reply delivery.                          | [`MessageBus`], [`Message`]             |
//! | **Subscriber API**| Hook into resolver events (logging, metrics, custom).      | [`Subscribe`]                           |
//! | **Errors**        | Typed errors for scripts, the bus and shutdown.            | [`ScriptError`], [`BusError`], [`RuntimeError`] |
//! | **Configuration** | Centralize resolver settings.                              | [`ResolverConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use plugin_resolver::{
//!     Executor, MediaItem, Message, MessageBus, ResolveRequest, ResolvedItem, ResolverConfig,
//!     ResultSink, ScriptError, ScriptId, ScriptRuntime,
//! };
//!
//! /// Resolves every plugin path instantly.
//! struct Instant;
//!
//! #[async_trait]
//! impl ScriptRuntime for Instant {
//!     fn launch(&self, _path: &str, _resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError> {
//!         sink.set_resolved(true, ResolvedItem::new("/media/movie.mkv"));
//!         Ok(ScriptId(1))
//!     }
//!     fn force_stop(&self, _id: ScriptId) {}
//!     async fn wait_exit(&self, _id: ScriptId) {}
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let messages = MessageBus::new();
//!     let mut player = messages.register("player", 8)?;
//!
//!     let exec = Executor::builder(ResolverConfig::default()).build(Arc::new(Instant));
//!     exec.initialize(&messages)?;
//!
//!     let item = MediaItem::new("plugin://plugin.video.example/?id=7").into_ref();
//!     let req = ResolveRequest::new(item, "player").with_player("video");
//!     messages.post(&Executor::target(), Message::ResolvePluginPath(req))?;
//!
//!     if let Some(Message::PluginPathResolved { item, .. }) = player.recv().await {
//!         assert_eq!(item.read().location(), "/media/movie.mkv");
//!     }
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod item;
mod messages;
mod script;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_TICK, ResolverConfig};
pub use crate::core::{
    ActionParams, AttemptOutcome, CompletionSignal, Executor, ExecutorBuilder, Resolution,
    ResolveAction,
};
pub use crate::error::{BusError, RuntimeError, ScriptError};
pub use crate::events::{Bus, Event, EventKind};
pub use crate::item::{ItemRef, MediaItem, PLUGIN_SCHEME, ResolvedItem, is_plugin_path};
pub use crate::messages::{Mailbox, Message, MessageBus, ResolveRequest, Target};
pub use crate::script::{
    ResultSink, ScriptExecutionInfo, ScriptHandle, ScriptId, ScriptObserver, ScriptRuntime,
};
pub use crate::subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use crate::subscribers::LogWriter;
