//! Shared fixtures: a scripted script runtime and an event recorder.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use plugin_resolver::{
    Event, EventKind, ResolvedItem, ResultSink, ScriptError, ScriptId, ScriptRuntime, Subscribe,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};

pub const PLUGIN: &str = "plugin://plugin.video.example/?id=42";

/// Behaviour of one launched script.
#[derive(Clone, Debug)]
pub enum Script {
    /// Reports `path` as resolved after `after`.
    Resolves { after: Duration, path: &'static str },
    /// Reports failure after `after`.
    Fails { after: Duration },
    /// Never reports and never exits until force-stopped.
    Hangs,
}

impl Script {
    pub fn resolves(after_ms: u64, path: &'static str) -> Self {
        Script::Resolves {
            after: Duration::from_millis(after_ms),
            path,
        }
    }

    pub fn fails(after_ms: u64) -> Self {
        Script::Fails {
            after: Duration::from_millis(after_ms),
        }
    }
}

/// Runs scripted behaviours in launch order, then repeats the fallback.
pub struct ScriptedRuntime {
    plan: Mutex<VecDeque<Script>>,
    fallback: Script,
    next_id: AtomicU64,
    launches: AtomicUsize,
    running: Mutex<HashMap<ScriptId, (JoinHandle<()>, watch::Sender<bool>)>>,
    stopped: Mutex<Vec<ScriptId>>,
}

impl ScriptedRuntime {
    pub fn new(plan: Vec<Script>, fallback: Script) -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(plan.into()),
            fallback,
            next_id: AtomicU64::new(1),
            launches: AtomicUsize::new(0),
            running: Mutex::new(HashMap::new()),
            stopped: Mutex::new(Vec::new()),
        })
    }

    pub fn always(script: Script) -> Arc<Self> {
        Self::new(Vec::new(), script)
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn force_stops(&self) -> usize {
        self.stopped.lock().len()
    }
}

#[async_trait]
impl ScriptRuntime for ScriptedRuntime {
    fn launch(&self, _path: &str, _resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let script = self
            .plan
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let id = ScriptId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (exit_tx, _) = watch::channel(false);
        let exited = exit_tx.clone();
        let task = tokio::spawn(async move {
            match script {
                Script::Resolves { after, path } => {
                    tokio::time::sleep(after).await;
                    sink.set_resolved(true, ResolvedItem::new(path).with_mime_type("video/x-matroska"));
                }
                Script::Fails { after } => {
                    tokio::time::sleep(after).await;
                    sink.set_failed();
                }
                Script::Hangs => std::future::pending::<()>().await,
            }
            exited.send_replace(true);
        });
        self.running.lock().insert(id, (task, exit_tx));
        Ok(id)
    }

    fn force_stop(&self, id: ScriptId) {
        self.stopped.lock().push(id);
        if let Some((task, exit_tx)) = self.running.lock().get(&id) {
            task.abort();
            exit_tx.send_replace(true);
        }
    }

    async fn wait_exit(&self, id: ScriptId) {
        let rx = self.running.lock().get(&id).map(|(_, tx)| tx.subscribe());
        if let Some(mut rx) = rx {
            let _ = rx.wait_for(|exited| *exited).await;
        }
    }
}

/// Records every event it receives.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Waits until at least `n` events of `kind` arrived, or one second passed.
    pub async fn wait_for(&self, kind: EventKind, n: usize) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while tokio::time::Instant::now() < deadline {
            if self.count(kind) >= n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Collects every ERROR-level `tracing` record as `name=value` pairs.
#[derive(Clone, Default)]
pub struct ErrorLog {
    records: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    pub fn records(&self) -> Vec<String> {
        self.records.lock().clone()
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != tracing::Level::ERROR {
            return;
        }
        let mut line = String::new();
        event.record(&mut FieldWriter(&mut line));
        self.records.lock().push(line);
    }
}

struct FieldWriter<'a>(&'a mut String);

impl Visit for FieldWriter<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}
