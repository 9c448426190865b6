//! # Executor: message-bus-facing resolution broker.
//!
//! The [`Executor`] owns the in-flight [`ActionRegistry`], applies the retry
//! policy and relays results back over the [`MessageBus`].
//!
//! ## Architecture
//! ```text
//! caller ──ResolvePluginPath──► MessageBus ──► listener ──► Executor::submit()
//!                                                              │
//!                                       registry.add(action) ◄─┤
//!                                                              ▼
//!                                                   tokio::spawn(retry loop)
//! loop {                                                       │
//!   ├─► attempt += 1 (≤ max_attempts, stop if cancelled)       │
//!   ├─► action.execute_and_wait()                              │
//!   ├─► resolution_succeeded ─► on_success() ─► PluginPathResolved ─► destination
//!   └─► else next attempt                                      │
//! }                                                            │
//! exhausted (not cancelled) ─► tracing::error! once            │
//! always ─► registry.remove(action) ◄──────────────────────────┘
//! ```
//!
//! ## Rules
//! - Resolutions are independent; nothing orders one against another.
//! - `stop_all` only flips cancellation flags; each loop notices on its own.
//! - No error crosses the message bus: a caller either gets
//!   `PluginPathResolved` or nothing, and must apply its own timeout.

use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::ResolverConfig;
use crate::core::action::{ActionParams, ResolveAction};
use crate::core::registry::ActionRegistry;
use crate::error::{BusError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::item::ItemRef;
use crate::messages::{Mailbox, Message, MessageBus, ResolveRequest, Target};
use crate::script::ScriptRuntime;
use crate::subscribers::SubscriberSet;

/// How a submitted retry loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The item got a concrete location on attempt `attempts`.
    Resolved {
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// The action was cancelled; nothing was reported.
    Cancelled {
        /// Attempts started before the loop noticed.
        attempts: u32,
    },
    /// Every attempt failed.
    Exhausted {
        /// Attempts made (the configured cap).
        attempts: u32,
    },
}

/// Resolution broker: registry, retry loop, message handling.
pub struct Executor {
    cfg: ResolverConfig,
    runtime: Arc<dyn ScriptRuntime>,
    bus: Bus,
    registry: Arc<ActionRegistry>,
    runtime_token: CancellationToken,
}

impl Executor {
    /// Message bus target the executor registers under.
    pub const TARGET: &'static str = "plugin-resolver";

    pub(crate) fn new_internal(
        cfg: ResolverConfig,
        runtime: Arc<dyn ScriptRuntime>,
        bus: Bus,
        subs: SubscriberSet,
    ) -> Arc<Self> {
        let me = Arc::new(Self {
            cfg,
            runtime,
            bus,
            registry: ActionRegistry::new(),
            runtime_token: CancellationToken::new(),
        });
        if !subs.is_empty() {
            me.subscriber_listener(subs);
        }
        me
    }

    /// The executor's message bus address.
    pub fn target() -> Target {
        Target::from(Self::TARGET)
    }

    /// Runtime configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.cfg
    }

    /// Event bus actions and retry loops publish to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Registers the executor on `messages` and starts handling requests.
    ///
    /// Fails with [`BusError::AlreadyRegistered`] if a resolver is already listening.
    pub fn initialize(self: &Arc<Self>, messages: &MessageBus) -> Result<(), BusError> {
        let mailbox = messages.register(Self::target(), self.cfg.mailbox_capacity_clamped())?;
        self.spawn_listener(mailbox, messages.clone());
        Ok(())
    }

    /// Builds an action for `item` wired to this executor's runtime and bus.
    pub fn new_action(&self, item: ItemRef, resume: bool) -> Arc<ResolveAction> {
        Arc::new(ResolveAction::new(
            item,
            ActionParams {
                resume,
                poll_tick: self.cfg.poll_tick,
            },
            Arc::clone(&self.runtime),
            self.bus.clone(),
        ))
    }

    /// Registers `action` and schedules its retry loop.
    ///
    /// `on_success` runs at most once, on the first attempt that leaves the item
    /// with a concrete location. The action leaves the registry when the loop
    /// ends, whatever the outcome.
    pub fn submit<F>(
        &self,
        path: impl Into<Arc<str>>,
        action: Arc<ResolveAction>,
        on_success: F,
    ) -> JoinHandle<Resolution>
    where
        F: FnOnce() + Send + 'static,
    {
        let path = path.into();
        let guard = self.registry.add(Arc::clone(&action));
        self.bus.publish(
            Event::new(EventKind::ActionAdded)
                .with_path(path.clone())
                .with_action(action.id()),
        );

        let bus = self.bus.clone();
        let max_attempts = self.cfg.attempts();
        tokio::spawn(async move {
            let id = action.id();
            let outcome = retry_loop(&bus, max_attempts, &path, &action, on_success).await;
            drop(guard);
            bus.publish(
                Event::new(EventKind::ActionRemoved)
                    .with_path(path)
                    .with_action(id),
            );
            outcome
        })
    }

    /// Cancels every in-flight action. Returns immediately; loops wind down on their own.
    pub fn stop_all(&self) {
        let n = self.registry.stop_all();
        self.bus.publish(
            Event::new(EventKind::StopAllRequested)
                .with_attempt(u32::try_from(n).unwrap_or(u32::MAX)),
        );
    }

    /// Returns true while any resolution is in flight.
    pub fn is_busy(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Number of in-flight resolutions.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Waits until no resolution is in flight.
    pub async fn wait_idle(&self) {
        self.registry.wait_empty().await;
    }

    /// Stops listening, cancels every action and waits up to `cfg.grace`.
    ///
    /// Returns [`RuntimeError::GraceExceeded`] with the stuck paths on timeout.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();
        self.stop_all();

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, self.registry.wait_empty()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded {
                    grace,
                    stuck: self.registry.paths(),
                })
            }
        }
    }

    /// Handles one `ResolvePluginPath` request.
    ///
    /// Returns `None` when the item no longer needs resolving.
    fn resolve(&self, req: ResolveRequest, messages: MessageBus) -> Option<JoinHandle<Resolution>> {
        let ResolveRequest {
            item,
            player,
            resume,
            destination,
        } = req;

        if !item.read().has_plugin_path() {
            debug!(path = %item.read().location(), "item already resolved, ignoring request");
            return None;
        }

        let action = self.new_action(Arc::clone(&item), resume);
        let path = action.path().to_string();
        Some(self.submit(path, action, move || {
            if item.read().has_plugin_path() {
                return;
            }
            let reply = Message::PluginPathResolved { item, player };
            if let Err(e) = messages.post(&destination, reply) {
                warn!(%destination, error = %e, "failed to deliver resolved item");
            }
        }))
    }

    fn handle_message(&self, msg: Message, messages: &MessageBus) {
        match msg {
            Message::ResolvePluginPath(req) => {
                self.resolve(req, messages.clone());
            }
            Message::StopAllResolutions => self.stop_all(),
            Message::PluginPathResolved { .. } => {
                debug!("resolver received a reply message, ignoring");
            }
        }
    }

    /// Spawns the mailbox listener. Holds only a weak reference to the executor.
    fn spawn_listener(self: &Arc<Self>, mut mailbox: Mailbox, messages: MessageBus) {
        let rt = self.runtime_token.clone();
        let me: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = rt.cancelled() => break,
                    msg = mailbox.recv() => {
                        let (Some(msg), Some(exec)) = (msg, me.upgrade()) else { break };
                        exec.handle_message(msg, &messages);
                    }
                }
            }
        });
    }

    /// Forwards bus events to the subscriber set (fire-and-forget).
    fn subscriber_listener(&self, subs: SubscriberSet) {
        let mut rx = self.bus.subscribe();
        let rt = self.runtime_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = rt.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "event listener lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            // Deliver whatever is still queued before the workers stop.
            while let Ok(ev) = rx.try_recv() {
                subs.emit(&ev);
            }
            subs.shutdown().await;
        });
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

/// Runs attempts until one resolves, the action is cancelled, or the cap is hit.
async fn retry_loop<F>(
    bus: &Bus,
    max_attempts: u32,
    path: &Arc<str>,
    action: &ResolveAction,
    on_success: F,
) -> Resolution
where
    F: FnOnce(),
{
    let event = |kind: EventKind, attempt: u32| {
        Event::new(kind)
            .with_path(path.clone())
            .with_action(action.id())
            .with_attempt(attempt)
    };

    let mut attempt: u32 = 0;
    while attempt < max_attempts && !action.is_cancelled() {
        attempt += 1;
        bus.publish(event(EventKind::AttemptStarting, attempt));

        action.execute_and_wait().await;

        if action.resolution_succeeded() {
            on_success();
            bus.publish(event(EventKind::Resolved, attempt));
            return Resolution::Resolved { attempts: attempt };
        }
        if !action.is_cancelled() {
            bus.publish(event(EventKind::AttemptFailed, attempt));
        }
    }

    if action.is_cancelled() {
        bus.publish(event(EventKind::ResolutionCancelled, attempt));
        return Resolution::Cancelled { attempts: attempt };
    }

    error!(path = %path, attempts = attempt, "failed to resolve plugin path after {attempt} attempts");
    bus.publish(event(EventKind::RetriesExhausted, attempt));
    Resolution::Exhausted { attempts: attempt }
}
