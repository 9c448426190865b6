//! # LogWriter: events to `tracing`
//!
//! A minimal subscriber that writes incoming [`Event`]s through `tracing`,
//! one line per event. Resolution failures are already logged by the executor
//! itself; this subscriber is for following a resolution step by step.
//!
//! ## Example output
//! ```text
//! DEBUG [attempt-starting] path=plugin://plugin.video.foo/?id=1 action=1 attempt=1
//! DEBUG [observer-attached] path=plugin://plugin.video.foo/?id=1 script=script#4
//! INFO  [resolved] path=plugin://plugin.video.foo/?id=1 attempt=2
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let path = e.path.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ActionAdded => debug!(path, action = ?e.action, "[action-added]"),
            EventKind::ActionRemoved => debug!(path, action = ?e.action, "[action-removed]"),
            EventKind::AttemptStarting => {
                debug!(path, action = ?e.action, attempt = ?e.attempt, "[attempt-starting]")
            }
            EventKind::FastPathHit => debug!(path, script = ?e.script, "[fast-path]"),
            EventKind::ObserverAttached => debug!(path, script = ?e.script, "[observer-attached]"),
            EventKind::ScriptForceStopped => {
                debug!(path, script = ?e.script, "[script-force-stopped]")
            }
            EventKind::LaunchFailed => warn!(path, reason = ?e.reason, "[launch-failed]"),
            EventKind::AttemptFailed => debug!(path, attempt = ?e.attempt, "[attempt-failed]"),
            EventKind::Resolved => info!(path, attempt = ?e.attempt, "[resolved]"),
            EventKind::ResolutionCancelled => {
                debug!(path, attempt = ?e.attempt, "[resolution-cancelled]")
            }
            EventKind::RetriesExhausted => warn!(path, attempts = ?e.attempt, "[retries-exhausted]"),
            EventKind::StopAllRequested => info!(cancelled = ?e.attempt, "[stop-all]"),
            EventKind::ShutdownRequested => info!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => info!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => warn!("[grace-exceeded]"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = path, reason = ?e.reason, "[subscriber-overflow]")
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = path, info = ?e.reason, "[subscriber-panicked]")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
