//! # Remote bridge
//!
//! Events created with `remote: true` are eligible for propagation across a process
//! or page boundary. The transport itself lives outside this crate: install a
//! [`Bridge`] on the [`EventStore`](crate::EventStore) and it is handed every fire of
//! a remote event, before local listeners run.

use serde_json::Value;

use super::event::Event;

/// Receiver of remote event fires.
pub trait Bridge: Send + Sync + 'static {
    /// Forwards one fire.
    ///
    /// Called synchronously from [`Event::fire`]; implementations should queue
    /// rather than block.
    fn forward(&self, event: &Event, data: Option<&Value>);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::events::{EventSpec, EventStore};

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl Bridge for Outbox {
        fn forward(&self, event: &Event, data: Option<&Value>) {
            self.sent.lock().push((event.id().to_string(), data.cloned()));
        }
    }

    #[test]
    fn only_remote_events_are_forwarded() {
        let outbox = Arc::new(Outbox::default());
        let store = EventStore::new().with_bridge(outbox.clone());
        let remote = store.add(EventSpec::new().id("r").remote(true)).unwrap();
        let local = store.add("l").unwrap();

        remote.fire(Some(json!({"k": 1}))).unwrap();
        local.fire(Some(json!(2))).unwrap();

        assert_eq!(
            *outbox.sent.lock(),
            vec![("r".to_string(), Some(json!({"k": 1})))]
        );
    }
}
