use std::sync::Arc;

use super::{config::Config, orchestrator::Orchestrator};
use crate::events::{Bridge, EventStore};

/// Builder for constructing an [`Orchestrator`] with optional features.
pub struct OrchestratorBuilder {
    cfg: Config,
    store: Option<EventStore>,
    bridge: Option<Arc<dyn Bridge>>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            store: None,
            bridge: None,
        }
    }

    /// Uses an existing event store instead of creating one.
    ///
    /// `Config::id_prefix` is then ignored; the store keeps its own prefix. If
    /// the store already holds an event with the ready id, that event is reused.
    pub fn with_store(mut self, store: EventStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the bridge receiving fires of remote events.
    pub fn with_bridge(mut self, bridge: Arc<dyn Bridge>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Builds and returns the orchestrator.
    ///
    /// This consumes the builder and initializes:
    /// - the event store (given or fresh) and its bridge
    /// - the stateful ready event
    /// - the built-in event module (if enabled)
    pub fn build(self) -> Orchestrator {
        let store = self
            .store
            .unwrap_or_else(|| EventStore::with_id_prefix(self.cfg.id_prefix.clone()));
        if let Some(bridge) = self.bridge {
            store.set_bridge(bridge);
        }
        Orchestrator::new_internal(self.cfg, store)
    }
}
