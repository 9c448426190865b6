//! # Example: resolve_demo
//!
//! Resolves two plugin items through the message bus with the built-in
//! [`LogWriter`] attached, then stops a third one that never finishes.
//!
//! Shows how to:
//! - Implement [`ScriptRuntime`] for an in-process interpreter.
//! - Wire [`LogWriter`] into [`Executor::builder`].
//! - Request resolution with `ResolvePluginPath` and cancel with `StopAllResolutions`.
//!
//! ## Flow
//! ```text
//! player ──ResolvePluginPath──► MessageBus ──► Executor
//!                                                ├─► ResolveAction::execute_and_wait()
//!                                                │     └─► DemoRuntime::launch()
//!                                                └─► PluginPathResolved ──► player
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example resolve_demo --features logging
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use plugin_resolver::{
    Executor, LogWriter, MediaItem, Message, MessageBus, ResolveRequest, ResolvedItem,
    ResolverConfig, ResultSink, ScriptError, ScriptId, ScriptRuntime, Subscribe,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Pretends to run plugin scripts: `slow` plugins take a while, `stuck` ones never answer.
#[derive(Default)]
struct DemoRuntime {
    next: AtomicU64,
    scripts: Mutex<HashMap<ScriptId, (CancellationToken, watch::Sender<bool>)>>,
}

#[async_trait]
impl ScriptRuntime for DemoRuntime {
    fn launch(&self, path: &str, _resume: bool, sink: ResultSink) -> Result<ScriptId, ScriptError> {
        if !path.contains("plugin.video.") {
            return Err(ScriptError::NotFound { path: path.into() });
        }
        let id = ScriptId(self.next.fetch_add(1, Ordering::Relaxed));
        let stop = CancellationToken::new();
        let (exited, _) = watch::channel(false);
        self.scripts.lock().insert(id, (stop.clone(), exited.clone()));

        let delay = if path.contains("slow") {
            Some(Duration::from_millis(300))
        } else if path.contains("stuck") {
            None
        } else {
            Some(Duration::from_millis(5))
        };
        let target = format!("https://cdn.example.org/{}.mp4", id.0);

        tokio::spawn(async move {
            let work = async {
                match delay {
                    Some(d) => {
                        tokio::time::sleep(d).await;
                        sink.set_resolved(true, ResolvedItem::new(target).with_mime_type("video/mp4"));
                    }
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = stop.cancelled() => {}
                _ = work => {}
            }
            exited.send_replace(true);
        });
        Ok(id)
    }

    fn force_stop(&self, id: ScriptId) {
        if let Some((stop, _)) = self.scripts.lock().get(&id) {
            stop.cancel();
        }
    }

    async fn wait_exit(&self, id: ScriptId) {
        let rx = self.scripts.lock().get(&id).map(|(_, tx)| tx.subscribe());
        if let Some(mut rx) = rx {
            let _ = rx.wait_for(|done| *done).await;
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let exec = Executor::builder(ResolverConfig::default())
        .with_subscribers(subs)
        .build(Arc::new(DemoRuntime::default()));

    let messages = MessageBus::new();
    let mut player = messages.register("player", 16)?;
    exec.initialize(&messages)?;

    for path in [
        "plugin://plugin.video.fast/?id=1",
        "plugin://plugin.video.slow/?id=2",
    ] {
        let req = ResolveRequest::new(MediaItem::new(path).into_ref(), "player").with_player("video");
        messages.post(&Executor::target(), Message::ResolvePluginPath(req))?;
    }

    for _ in 0..2 {
        if let Some(Message::PluginPathResolved { item, player }) = player.recv().await {
            let item = item.read();
            println!("{} -> {} ({:?})", item.path, item.location(), player);
        }
    }

    let stuck = ResolveRequest::new(MediaItem::new("plugin://plugin.video.stuck/").into_ref(), "player");
    messages.post(&Executor::target(), Message::ResolvePluginPath(stuck))?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("busy before stop: {}", exec.is_busy());

    messages.post(&Executor::target(), Message::StopAllResolutions)?;
    exec.wait_idle().await;
    println!("busy after stop: {}", exec.is_busy());

    exec.shutdown().await?;
    Ok(())
}
