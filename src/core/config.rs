//! # Orchestrator configuration.
//!
//! Provides [`Config`] centralized settings for an [`Orchestrator`](crate::Orchestrator).
//!
//! Config is used once, at construction:
//! `Orchestrator::builder(config).build()` or `Orchestrator::with_config(config)`.

/// Name under which the built-in event module is installed.
pub const EVENT_MODULE: &str = "event";

/// Capability name of the event store exported by the built-in event module.
pub const EVENT_STORE_EXPORT: &str = "store";

/// Settings of an orchestrator.
///
/// ## Field semantics
/// - `ready_event`: id of the stateful event fired when the first configuration pass completes
/// - `event_module`: install the built-in `"event"` module exporting the event store
/// - `id_prefix`: prefix of generated event ids (ignored when an existing store is supplied)
#[derive(Clone, Debug)]
pub struct Config {
    /// Id of the internal ready event.
    ///
    /// Listeners registered on it after completion still observe it: the event is
    /// stateful and replays.
    pub ready_event: String,

    /// Whether the built-in event module is installed at construction.
    ///
    /// It has no configuration step; it makes the event store reachable as
    /// `orchestrator.export::<EventStore>("event", "store")` and shows up in
    /// `modules()`.
    pub event_module: bool,

    /// Prefix of generated event ids.
    pub id_prefix: String,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `ready_event = "orchestrator/ready"`
    /// - `event_module = true`
    /// - `id_prefix = "event-"`
    fn default() -> Self {
        Self {
            ready_event: "orchestrator/ready".to_string(),
            event_module: true,
            id_prefix: crate::events::DEFAULT_ID_PREFIX.to_string(),
        }
    }
}
