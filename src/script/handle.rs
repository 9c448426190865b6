//! # Script execution handle.
//!
//! [`ScriptHandle`] is the resolver-side half of one script execution. Each
//! [`trigger_execution`](ScriptHandle::trigger_execution) opens a fresh session:
//!
//! ```text
//! ScriptHandle ──trigger──► Session { completed flag, report }
//!                              ▲                 │
//!                   ResultSink │                 └──► ScriptExecutionInfo { id, completed rx }
//!            (given to script) │
//!                   set_resolved(succeeded, item)
//! ```
//!
//! ## Rules
//! - The first report of a session wins; later reports are ignored.
//! - A sink from an older session reports into that session only, so a slow
//!   script from a previous attempt can never leak into the current one.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::ScriptError;
use crate::item::{MediaItem, ResolvedItem};
use crate::script::{ScriptId, ScriptRuntime};

/// What a script reported.
#[derive(Clone, Debug)]
struct Report {
    succeeded: bool,
    resolved: Option<ResolvedItem>,
}

/// State of one execution.
struct Session {
    completed: watch::Sender<bool>,
    report: Mutex<Option<Report>>,
}

impl Session {
    fn new() -> Arc<Self> {
        let (completed, _rx) = watch::channel(false);
        Arc::new(Self {
            completed,
            report: Mutex::new(None),
        })
    }

    fn report(&self, report: Report) -> bool {
        {
            let mut slot = self.report.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(report);
        }
        self.completed.send_replace(true);
        true
    }
}

/// Reporting end handed to the script runtime.
#[derive(Clone)]
pub struct ResultSink {
    session: Arc<Session>,
}

impl ResultSink {
    /// Reports the script's outcome and raises the fast-completion flag.
    ///
    /// Returns `false` if this execution already reported.
    pub fn set_resolved(&self, succeeded: bool, resolved: ResolvedItem) -> bool {
        self.session.report(Report {
            succeeded,
            resolved: Some(resolved),
        })
    }

    /// Reports a failure without any result data.
    pub fn set_failed(&self) -> bool {
        self.session.report(Report {
            succeeded: false,
            resolved: None,
        })
    }

    /// Returns true if this execution already reported.
    pub fn is_reported(&self) -> bool {
        self.session.report.lock().is_some()
    }
}

/// Id and fast-completion flag of a triggered execution.
pub struct ScriptExecutionInfo {
    id: ScriptId,
    completed: watch::Receiver<bool>,
}

impl ScriptExecutionInfo {
    /// Runtime-assigned script id.
    pub fn id(&self) -> ScriptId {
        self.id
    }

    /// Returns true once the script has reported.
    pub fn is_completed(&self) -> bool {
        *self.completed.borrow()
    }

    /// Waits until the script reports.
    pub async fn wait_completed(&mut self) {
        if self.completed.wait_for(|done| *done).await.is_err() {
            // Session dropped without a report: it will never complete.
            std::future::pending::<()>().await;
        }
    }
}

/// Resolver-side handle over script executions on one runtime.
pub struct ScriptHandle {
    runtime: Arc<dyn ScriptRuntime>,
    session: Mutex<Arc<Session>>,
}

impl ScriptHandle {
    /// Creates a handle on `runtime` with an empty session.
    pub fn new(runtime: Arc<dyn ScriptRuntime>) -> Self {
        Self {
            runtime,
            session: Mutex::new(Session::new()),
        }
    }

    /// Runtime the handle launches scripts on.
    pub fn runtime(&self) -> &Arc<dyn ScriptRuntime> {
        &self.runtime
    }

    /// Opens a new session and launches the script for `path`.
    pub fn trigger_execution(
        &self,
        path: &str,
        resume: bool,
    ) -> Result<ScriptExecutionInfo, ScriptError> {
        let session = Session::new();
        let completed = session.completed.subscribe();
        *self.session.lock() = Arc::clone(&session);

        let id = self.runtime.launch(path, resume, ResultSink { session })?;
        Ok(ScriptExecutionInfo { id, completed })
    }

    /// Force-stops the script behind `info`.
    pub fn force_stop(&self, info: &ScriptExecutionInfo) {
        self.runtime.force_stop(info.id);
    }

    /// Returns true if the current session reported success.
    pub fn succeeded(&self) -> bool {
        let session = self.session.lock().clone();
        let report = session.report.lock();
        report.as_ref().is_some_and(|r| r.succeeded)
    }

    /// Copies the current session's resolved fields into `item`.
    ///
    /// Returns `false` if there is nothing to copy.
    pub fn update_result_item(&self, item: &mut MediaItem) -> bool {
        let session = self.session.lock().clone();
        let report = session.report.lock();
        match report.as_ref().and_then(|r| r.resolved.as_ref()) {
            Some(resolved) => {
                item.apply(resolved);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex as PlMutex;

    /// Stores the sink so the test can report later.
    #[derive(Default)]
    struct Capture {
        sinks: PlMutex<Vec<ResultSink>>,
        stopped: PlMutex<Vec<ScriptId>>,
    }

    #[async_trait]
    impl ScriptRuntime for Capture {
        fn launch(&self, _path: &str, _resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError> {
            let mut sinks = self.sinks.lock();
            sinks.push(sink);
            Ok(ScriptId(sinks.len() as u64))
        }
        fn force_stop(&self, id: ScriptId) {
            self.stopped.lock().push(id);
        }
        async fn wait_exit(&self, _id: ScriptId) {}
    }

    #[test]
    fn first_report_wins() {
        let runtime = Arc::new(Capture::default());
        let handle = ScriptHandle::new(runtime.clone());
        let info = handle
            .trigger_execution("plugin://a/", false)
            .expect("launch");
        assert!(!info.is_completed());

        let sink = runtime.sinks.lock()[0].clone();
        assert!(sink.set_resolved(true, ResolvedItem::new("/a.mkv")));
        assert!(!sink.set_failed());
        assert!(info.is_completed());
        assert!(handle.succeeded());

        let mut item = MediaItem::new("plugin://a/");
        assert!(handle.update_result_item(&mut item));
        assert_eq!(item.location(), "/a.mkv");
    }

    #[test]
    fn stale_sink_does_not_leak_into_new_session() {
        let runtime = Arc::new(Capture::default());
        let handle = ScriptHandle::new(runtime.clone());
        let _first = handle
            .trigger_execution("plugin://a/", false)
            .expect("launch");
        let second = handle
            .trigger_execution("plugin://a/", false)
            .expect("launch");

        let stale = runtime.sinks.lock()[0].clone();
        stale.set_resolved(true, ResolvedItem::new("/stale.mkv"));

        assert!(!second.is_completed());
        assert!(!handle.succeeded());
        let mut item = MediaItem::new("plugin://a/");
        assert!(!handle.update_result_item(&mut item));
    }

    #[test]
    fn failure_report_has_no_result() {
        let runtime = Arc::new(Capture::default());
        let handle = ScriptHandle::new(runtime.clone());
        let info = handle
            .trigger_execution("plugin://a/", true)
            .expect("launch");
        runtime.sinks.lock()[0].set_failed();

        assert!(info.is_completed());
        assert!(!handle.succeeded());
    }

    #[test]
    fn force_stop_targets_the_triggered_script() {
        let runtime = Arc::new(Capture::default());
        let handle = ScriptHandle::new(runtime.clone());
        let _first = handle.trigger_execution("plugin://a/", false).expect("launch");
        let second = handle.trigger_execution("plugin://a/", false).expect("launch");

        handle.force_stop(&second);
        assert_eq!(*runtime.stopped.lock(), vec![second.id()]);
    }
}
