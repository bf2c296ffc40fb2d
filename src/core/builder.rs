use std::sync::Arc;

use crate::{config::ExecutorConfig, subscribers::Subscribe};

use super::executor::Executor;

/// Builder for constructing an [`Executor`] with optional features.
pub struct ExecutorBuilder {
    cfg: ExecutorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ExecutorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ExecutorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (pool sizing, worker lifecycle, item
    /// failures, aborts) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the executor.
    ///
    /// Nothing is spawned here; every run creates its own bus, queues and tasks.
    pub fn build(self) -> Executor {
        Executor::from_parts(self.cfg, self.subscribers)
    }
}
