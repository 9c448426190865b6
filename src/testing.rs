//! Scripted in-process [`ScriptRuntime`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::ScriptError;
use crate::item::ResolvedItem;
use crate::script::{ResultSink, ScriptId, ScriptRuntime};

/// What the next launched script does.
#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Reports after `after`, then exits.
    Report {
        after: Duration,
        succeeded: bool,
        path: &'static str,
    },
    /// Exits after `after` without reporting.
    Exit { after: Duration },
    /// Never reports, never exits on its own.
    Hang,
    /// Launch itself fails.
    FailLaunch,
}

impl Step {
    pub(crate) fn resolve(after_ms: u64, path: &'static str) -> Self {
        Step::Report {
            after: Duration::from_millis(after_ms),
            succeeded: true,
            path,
        }
    }

    pub(crate) fn fail(after_ms: u64) -> Self {
        Step::Report {
            after: Duration::from_millis(after_ms),
            succeeded: false,
            path: "",
        }
    }
}

pub(crate) struct FakeRuntime {
    plan: Mutex<VecDeque<Step>>,
    fallback: Step,
    next_id: AtomicU64,
    exited: Mutex<HashMap<ScriptId, watch::Sender<bool>>>,
    tasks: Mutex<HashMap<ScriptId, JoinHandle<()>>>,
    pub(crate) launches: AtomicUsize,
    pub(crate) stopped: Mutex<Vec<ScriptId>>,
}

impl FakeRuntime {
    /// Runs `plan` in order, then repeats `fallback`.
    pub(crate) fn new(plan: Vec<Step>, fallback: Step) -> Self {
        Self {
            plan: Mutex::new(plan.into()),
            fallback,
            next_id: AtomicU64::new(1),
            exited: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            launches: AtomicUsize::new(0),
            stopped: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    fn mark_exited(&self, id: ScriptId) {
        if let Some(tx) = self.exited.lock().get(&id) {
            tx.send_replace(true);
        }
    }
}

#[async_trait]
impl ScriptRuntime for FakeRuntime {
    fn launch(&self, _path: &str, _resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let step = self
            .plan
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        if matches!(step, Step::FailLaunch) {
            return Err(ScriptError::Launch {
                reason: "scripted".into(),
            });
        }

        let id = ScriptId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, _rx) = watch::channel(false);
        let exit_tx = tx.clone();
        self.exited.lock().insert(id, tx);

        let task = tokio::spawn(async move {
            match step {
                Step::Report {
                    after,
                    succeeded,
                    path,
                } => {
                    tokio::time::sleep(after).await;
                    sink.set_resolved(succeeded, ResolvedItem::new(path));
                }
                Step::Exit { after } => tokio::time::sleep(after).await,
                Step::Hang | Step::FailLaunch => std::future::pending::<()>().await,
            }
            exit_tx.send_replace(true);
        });
        self.tasks.lock().insert(id, task);
        Ok(id)
    }

    fn force_stop(&self, id: ScriptId) {
        self.stopped.lock().push(id);
        if let Some(task) = self.tasks.lock().remove(&id) {
            task.abort();
        }
        self.mark_exited(id);
    }

    async fn wait_exit(&self, id: ScriptId) {
        let rx = self.exited.lock().get(&id).map(|tx| tx.subscribe());
        if let Some(mut rx) = rx {
            let _ = rx.wait_for(|exited| *exited).await;
        }
    }
}
