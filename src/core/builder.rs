use std::sync::Arc;

use crate::{
    config::ResolverConfig,
    events::Bus,
    script::ScriptRuntime,
    subscribers::{Subscribe, SubscriberSet},
};
use super::executor::Executor;

/// Builder for constructing an [`Executor`] with optional subscribers.
pub struct ExecutorBuilder {
    cfg: ResolverConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ExecutorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ResolverConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive resolver events (attempts, fast-path hits, retries
    /// exhausted) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the executor on top of `runtime`.
    ///
    /// Must be called inside a Tokio runtime when subscribers are set, since
    /// their workers are spawned here.
    pub fn build(self, runtime: Arc<dyn ScriptRuntime>) -> Arc<Executor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        Executor::new_internal(self.cfg, runtime, bus, subs)
    }
}

impl Executor {
    /// Starts building an executor with `cfg`.
    pub fn builder(cfg: ResolverConfig) -> ExecutorBuilder {
        ExecutorBuilder::new(cfg)
    }
}
