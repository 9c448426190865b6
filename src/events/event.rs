//! # Runtime events emitted by the executor and its actions.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Attempt events**: what one resolve attempt did (fast path, observer, force-stop)
//! - **Resolution events**: outcome of a submitted retry loop
//! - **Registry events**: actions entering and leaving the in-flight registry
//! - **Runtime events**: stop-all, shutdown, subscriber health
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use plugin_resolver::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AttemptFailed)
//!     .with_path("plugin://plugin.video.foo/?id=1")
//!     .with_action(3)
//!     .with_attempt(2);
//!
//! assert_eq!(ev.kind, EventKind::AttemptFailed);
//! assert_eq!(ev.path.as_deref(), Some("plugin://plugin.video.foo/?id=1"));
//! assert_eq!(ev.attempt, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::script::ScriptId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `path`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `path`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Registry events ===
    /// Action was registered and its retry loop scheduled.
    ///
    /// Sets: `path`, `action`
    ActionAdded,

    /// Action left the registry (resolved, exhausted or cancelled).
    ///
    /// Sets: `path`, `action`
    ActionRemoved,

    // === Attempt events ===
    /// Retry loop is starting an attempt.
    ///
    /// Sets: `path`, `action`, `attempt` (1-based)
    AttemptStarting,

    /// Script reported within the fast-path window; no observer was attached.
    ///
    /// Sets: `path`, `action`, `script`
    FastPathHit,

    /// Script missed the fast-path window; an observer now watches it.
    ///
    /// Sets: `path`, `action`, `script`
    ObserverAttached,

    /// Attempt was cancelled while the script was running; the script was stopped.
    ///
    /// Sets: `path`, `action`, `script`
    ScriptForceStopped,

    /// The script runtime could not start the script.
    ///
    /// Sets: `path`, `action`, `reason`
    LaunchFailed,

    /// Attempt finished without producing a concrete location.
    ///
    /// Sets: `path`, `action`, `attempt`
    AttemptFailed,

    // === Resolution events ===
    /// Item now has a concrete location; success callback invoked.
    ///
    /// Sets: `path`, `action`, `attempt`
    Resolved,

    /// Retry loop stopped because the action was cancelled (not an error).
    ///
    /// Sets: `path`, `action`, `attempt` (attempts made so far)
    ResolutionCancelled,

    /// Every attempt failed without cancellation.
    ///
    /// Sets: `path`, `action`, `attempt` (= attempt cap)
    RetriesExhausted,

    // === Runtime events ===
    /// Stop-all was requested; every registered action was cancelled.
    ///
    /// Sets: `attempt`: number of actions cancelled
    StopAllRequested,

    /// Executor shutdown requested.
    ShutdownRequested,

    /// All in-flight resolutions stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some resolutions did not stop in time.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Plugin path being resolved (or subscriber name for subscriber events).
    pub path: Option<Arc<str>>,
    /// Action id, if applicable.
    pub action: Option<u64>,
    /// Attempt number (starting from 1) or a count, depending on the kind.
    pub attempt: Option<u32>,
    /// Script id, if applicable.
    pub script: Option<ScriptId>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            path: None,
            action: None,
            attempt: None,
            script: None,
            reason: None,
        }
    }

    /// Attaches a plugin path.
    #[inline]
    pub fn with_path(mut self, path: impl Into<Arc<str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches an action id.
    #[inline]
    pub fn with_action(mut self, id: u64) -> Self {
        self.action = Some(id);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a script id.
    #[inline]
    pub fn with_script(mut self, id: ScriptId) -> Self {
        self.script = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_path(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_path(subscriber)
            .with_reason(info)
    }
}
