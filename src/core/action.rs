//! # ResolveAction: one cancellable resolve attempt.
//!
//! Wraps a single item and drives one script execution per
//! [`execute_and_wait`](ResolveAction::execute_and_wait) call.
//!
//! ## Attempt flow
//! ```text
//! run()
//!   ├─► signal.reset()
//!   ├─► handle.trigger_execution(path, resume)
//!   │       └─ Err ──────────────────────────────────► finish()  (LaunchFailed)
//!   ├─► wait ≤ poll_tick for the script's report
//!   │       └─ reported ─────────────────────────────► finish()  (FastPath)
//!   ├─► ScriptObserver::new(script id, fresh exit signal)
//!   ├─► select {
//!   │     cancel token    ─► force_stop(script) ─┐
//!   │     script exited   ───────────────────────┤
//!   │     script reported ───────────────────────┤
//!   │   }                                        ▼
//!   ├─► finish()                      (Observed | Cancelled)
//!   └─► observer.abort()
//!
//! finish()
//!   ├─► success = handle.succeeded() && !cancelled
//!   ├─► success → copy resolved fields into the item
//!   └─► signal.raise()   (always, so waiters unblock on failure too)
//! ```
//!
//! ## Rules
//! - Attempts of one action never overlap.
//! - Cancellation is monotonic and does not stop the script by itself; the
//!   running attempt force-stops it when it observes the token.
//! - Failure is reported through [`execution_succeeded`](ResolveAction::execution_succeeded)
//!   and [`resolution_succeeded`](ResolveAction::resolution_succeeded), never by panicking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::{select, sync::Mutex, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_POLL_TICK;
use crate::core::signal::CompletionSignal;
use crate::events::{Bus, Event, EventKind};
use crate::item::ItemRef;
use crate::script::{ScriptHandle, ScriptObserver, ScriptRuntime};

static ACTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Per-action parameters.
#[derive(Clone, Copy, Debug)]
pub struct ActionParams {
    /// Whether playback should resume; passed to the script.
    pub resume: bool,
    /// Fast-path window before an observer is attached.
    pub poll_tick: Duration,
}

impl ActionParams {
    /// Parameters with the default poll tick.
    pub fn new(resume: bool) -> Self {
        Self {
            resume,
            poll_tick: DEFAULT_POLL_TICK,
        }
    }
}

impl Default for ActionParams {
    fn default() -> Self {
        Self::new(false)
    }
}

/// How one attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The runtime could not start the script.
    LaunchFailed,
    /// The script reported within the fast-path window.
    FastPath,
    /// The script reported or exited while observed.
    Observed,
    /// The attempt was cancelled and the script force-stopped.
    Cancelled,
}

/// One cancellable unit of resolution work for one item.
pub struct ResolveAction {
    id: u64,
    path: Arc<str>,
    item: ItemRef,
    params: ActionParams,
    bus: Bus,
    handle: ScriptHandle,
    signal: CompletionSignal,
    success: AtomicBool,
    cancel: CancellationToken,
    running: Mutex<()>,
}

impl ResolveAction {
    /// Creates an action for `item`. Nothing runs and the item is untouched until
    /// [`execute_and_wait`](Self::execute_and_wait).
    pub fn new(
        item: ItemRef,
        params: ActionParams,
        runtime: Arc<dyn ScriptRuntime>,
        bus: Bus,
    ) -> Self {
        let path: Arc<str> = item.read().location().into();
        Self {
            id: ACTION_SEQ.fetch_add(1, Ordering::Relaxed),
            path,
            item,
            params,
            bus,
            handle: ScriptHandle::new(runtime),
            signal: CompletionSignal::new(),
            success: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            running: Mutex::new(()),
        }
    }

    /// Unique action id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Plugin path this action resolves.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Item being resolved.
    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    /// The last attempt succeeded and was not cancelled.
    pub fn execution_succeeded(&self) -> bool {
        self.success.load(Ordering::Acquire) && !self.is_cancelled()
    }

    /// The last attempt succeeded and the item now has a concrete location.
    ///
    /// Distinguishes "the script ran" from "the script produced something playable".
    pub fn resolution_succeeded(&self) -> bool {
        self.success.load(Ordering::Acquire) && !self.item.read().has_plugin_path()
    }

    /// Requests cancellation. Idempotent and non-blocking.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs one attempt on the calling task and returns
    /// [`execution_succeeded`](Self::execution_succeeded).
    pub async fn execute_and_wait(&self) -> bool {
        self.run().await;
        self.execution_succeeded()
    }

    /// Runs one attempt and reports how it ended.
    pub async fn execute(&self) -> AttemptOutcome {
        self.run().await
    }

    /// Waits until the current attempt has finished.
    pub async fn finished(&self) {
        self.signal.raised().await;
    }

    async fn run(&self) -> AttemptOutcome {
        let _running = self.running.lock().await;
        self.signal.reset();

        let mut info = match self.handle.trigger_execution(&self.path, self.params.resume) {
            Ok(info) => info,
            Err(e) => {
                warn!(path = %self.path, error = %e, "failed to start resolving script");
                self.bus.publish(
                    self.event(EventKind::LaunchFailed)
                        .with_reason(e.as_label()),
                );
                self.finish();
                return AttemptOutcome::LaunchFailed;
            }
        };

        if time::timeout(self.params.poll_tick, info.wait_completed())
            .await
            .is_ok()
        {
            self.bus
                .publish(self.event(EventKind::FastPathHit).with_script(info.id()));
            self.finish();
            return AttemptOutcome::FastPath;
        }

        // Per-attempt exit flag: an observer outliving its attempt can only raise its own.
        let exited = CompletionSignal::new();
        let observer = ScriptObserver::new(
            Arc::clone(self.handle.runtime()),
            info.id(),
            exited.clone(),
        );
        self.bus
            .publish(self.event(EventKind::ObserverAttached).with_script(info.id()));
        debug!(path = %self.path, script = %info.id(), "waiting for resolving script");

        let cancelled = select! {
            biased;
            _ = self.cancel.cancelled() => true,
            _ = exited.raised() => false,
            _ = info.wait_completed() => false,
        };

        if cancelled {
            self.handle.force_stop(&info);
            self.bus.publish(
                self.event(EventKind::ScriptForceStopped)
                    .with_script(info.id()),
            );
        }

        self.finish();
        observer.abort();

        if cancelled {
            AttemptOutcome::Cancelled
        } else {
            AttemptOutcome::Observed
        }
    }

    fn finish(&self) {
        let success = self.handle.succeeded() && !self.is_cancelled();
        if success {
            let mut item = self.item.write();
            if item.has_plugin_path() {
                self.handle.update_result_item(&mut item);
            }
        }
        self.success.store(success, Ordering::Release);
        self.signal.raise();
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_path(self.path.clone())
            .with_action(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::MediaItem;
    use crate::testing::{FakeRuntime, Step};

    const PLUGIN: &str = "plugin://plugin.video.foo/?id=1";

    fn action(runtime: Arc<FakeRuntime>, bus: &Bus) -> ResolveAction {
        ResolveAction::new(
            MediaItem::new(PLUGIN).into_ref(),
            ActionParams::new(false),
            runtime,
            bus.clone(),
        )
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn fast_script_skips_observer() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let runtime = Arc::new(FakeRuntime::new(vec![], Step::resolve(0, "/m/a.mkv")));
        let action = action(runtime, &bus);

        assert_eq!(action.execute().await, AttemptOutcome::FastPath);
        assert!(action.execution_succeeded());
        assert!(action.resolution_succeeded());
        assert_eq!(action.item().read().location(), "/m/a.mkv");

        let kinds = drain(&mut rx);
        assert!(kinds.contains(&EventKind::FastPathHit));
        assert!(!kinds.contains(&EventKind::ObserverAttached));
    }

    #[tokio::test]
    async fn slow_script_is_observed() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let runtime = Arc::new(FakeRuntime::new(vec![], Step::resolve(80, "/m/b.mkv")));
        let action = action(runtime, &bus);

        assert_eq!(action.execute().await, AttemptOutcome::Observed);
        assert!(action.resolution_succeeded());
        assert!(drain(&mut rx).contains(&EventKind::ObserverAttached));
    }

    #[tokio::test]
    async fn script_exit_without_report_fails() {
        let bus = Bus::new(64);
        let runtime = Arc::new(FakeRuntime::new(
            vec![],
            Step::Exit {
                after: Duration::from_millis(40),
            },
        ));
        let action = action(runtime, &bus);

        assert!(!action.execute_and_wait().await);
        assert!(!action.resolution_succeeded());
        assert!(action.item().read().has_plugin_path());
    }

    #[tokio::test]
    async fn reported_failure_leaves_item_untouched() {
        let bus = Bus::new(64);
        let runtime = Arc::new(FakeRuntime::new(vec![], Step::fail(0)));
        let action = action(runtime, &bus);

        assert!(!action.execute_and_wait().await);
        assert_eq!(action.item().read().location(), PLUGIN);
    }

    #[tokio::test]
    async fn launch_failure_is_a_failed_attempt() {
        let bus = Bus::new(64);
        let runtime = Arc::new(FakeRuntime::new(vec![], Step::FailLaunch));
        let action = action(runtime, &bus);

        assert_eq!(action.execute().await, AttemptOutcome::LaunchFailed);
        assert!(!action.execution_succeeded());
        // Waiters are released even on failure.
        action.finished().await;
    }

    #[tokio::test]
    async fn cancel_force_stops_hanging_script() {
        let bus = Bus::new(64);
        let runtime = Arc::new(FakeRuntime::new(vec![], Step::Hang));
        let action = Arc::new(action(runtime.clone(), &bus));

        let worker = {
            let action = action.clone();
            tokio::spawn(async move { action.execute().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        action.cancel();
        action.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("attempt ends after cancel")
            .expect("no panic");
        assert_eq!(outcome, AttemptOutcome::Cancelled);
        assert!(action.is_cancelled());
        assert!(!action.execution_succeeded());
        assert_eq!(runtime.stopped.lock().len(), 1);
        assert_eq!(action.item().read().location(), PLUGIN);
    }

    #[tokio::test]
    async fn cancelled_before_fast_report_is_not_success() {
        let bus = Bus::new(64);
        let runtime = Arc::new(FakeRuntime::new(vec![], Step::resolve(0, "/m/c.mkv")));
        let action = action(runtime, &bus);

        action.cancel();
        assert!(!action.execute_and_wait().await);
        assert!(!action.resolution_succeeded());
        assert!(action.item().read().has_plugin_path());
    }

    #[tokio::test]
    async fn retry_on_same_action_uses_fresh_session() {
        let bus = Bus::new(64);
        let runtime = Arc::new(FakeRuntime::new(
            vec![Step::fail(0)],
            Step::resolve(0, "/m/d.mkv"),
        ));
        let action = action(runtime.clone(), &bus);

        assert!(!action.execute_and_wait().await);
        assert!(action.execute_and_wait().await);
        assert!(action.resolution_succeeded());
        assert_eq!(runtime.launches(), 2);
    }

    #[tokio::test]
    async fn previous_observer_cannot_end_next_attempt() {
        for _ in 0..20 {
            let bus = Bus::new(64);
            let runtime = Arc::new(FakeRuntime::new(
                vec![Step::fail(30)],
                Step::resolve(60, "/m/e.mkv"),
            ));
            let action = action(runtime.clone(), &bus);

            assert_eq!(action.execute().await, AttemptOutcome::Observed);
            assert!(!action.execution_succeeded());

            assert_eq!(action.execute().await, AttemptOutcome::Observed);
            assert!(action.resolution_succeeded());
            assert_eq!(action.item().read().location(), "/m/e.mkv");
            assert!(runtime.stopped.lock().is_empty());
        }
    }
}
