//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] reports every delivery it receives through `tracing`, at `INFO`
//! under the `modvisor::events` target.
//!
//! ## Output format
//! ```text
//! INFO modvisor::events: [fired] event=app/ready stateful=true data=Some(Null)
//! INFO modvisor::events: [fired] event=cart/add stateful=false data=Some(Number(3))
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use modvisor::{EventStore, LogWriter};
//!
//! let store = EventStore::new();
//! let evt = store.add("cart/add").unwrap();
//! evt.listen(Arc::new(LogWriter));
//! evt.fire(None).unwrap();
//! ```

use serde_json::Value;

use super::event::Event;
use super::listener::Listener;

/// `tracing`-backed logging listener.
///
/// Enabled via the `logging` feature. Not intended for production use:
/// implement a custom [`Listener`] for structured logging or metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl Listener for LogWriter {
    fn on_fire(&self, event: &Event, data: Option<&Value>) {
        tracing::info!(
            target: "modvisor::events",
            "[fired] event={} stateful={} data={:?}",
            event.id(),
            event.is_stateful(),
            data
        );
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::events::EventStore;

    #[traced_test]
    #[test]
    fn logs_each_delivery() {
        let store = EventStore::new();
        let evt = store.add("cart/add").unwrap();
        evt.listen(Arc::new(LogWriter));
        evt.fire(Some(json!(3))).unwrap();
        assert!(logs_contain("[fired] event=cart/add stateful=false"));
    }
}
