//! # Listener registry: deduplicated, insertion-ordered listeners of one event.
//!
//! ## Rules
//! - **Identity dedup**: a handle already present is not added again.
//! - **Insertion order**: `dispatch` calls listeners in the order they were added.
//! - **Once listeners** are detached when dispatch reaches them, right before their
//!   callback, so a re-entrant `fire` never delivers to them twice.
//! - **Snapshot dispatch**: listeners added during a dispatch wait for the next one;
//!   listeners (once or not) removed during a dispatch are skipped if not reached yet.
//! - No lock is held while callbacks run.

use parking_lot::Mutex;
use serde_json::Value;

use super::event::Event;
use super::listener::{ListenerRef, same_listener};

struct Entry {
    listener: ListenerRef,
    once: bool,
}

/// Listener collection owned by an [`Event`].
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Mutex<Vec<Entry>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `listener` unless already present. Returns true if it was added.
    pub fn add(&self, listener: ListenerRef) -> bool {
        self.insert(listener, false)
    }

    /// Like [`add`](Self::add), but the listener is removed after its first delivery.
    pub fn add_once(&self, listener: ListenerRef) -> bool {
        self.insert(listener, true)
    }

    fn insert(&self, listener: ListenerRef, once: bool) -> bool {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| same_listener(&e.listener, &listener)) {
            return false;
        }
        entries.push(Entry { listener, once });
        true
    }

    /// Removes `listener` by identity. Returns true if it was present.
    pub fn remove(&self, listener: &ListenerRef) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| !same_listener(&e.listener, listener));
        entries.len() != before
    }

    /// Returns true if `listener` is registered.
    pub fn contains(&self, listener: &ListenerRef) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| same_listener(&e.listener, listener))
    }

    /// Delivers `data` to every registered listener, in insertion order.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &Event, data: Option<&Value>) -> usize {
        let snapshot: Vec<(ListenerRef, bool)> = self
            .entries
            .lock()
            .iter()
            .map(|e| (ListenerRef::clone(&e.listener), e.once))
            .collect();

        let mut delivered = 0;
        for (listener, once) in snapshot {
            if !self.claim(&listener, once) {
                continue;
            }
            listener.on_fire(event, data);
            delivered += 1;
        }
        delivered
    }

    /// Checks that a snapshot entry is still registered when dispatch reaches it.
    ///
    /// A once entry is detached here, before its callback runs, so a nested
    /// dispatch cannot deliver it a second time.
    fn claim(&self, listener: &ListenerRef, once: bool) -> bool {
        let mut entries = self.entries.lock();
        let Some(index) = entries
            .iter()
            .position(|e| same_listener(&e.listener, listener))
        else {
            return false;
        };
        if once {
            if !entries[index].once {
                return false;
            }
            entries.remove(index);
        }
        true
    }

    /// Detaches every listener.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::events::{EventStore, ListenerFn};

    fn counter(hits: &Arc<AtomicUsize>) -> ListenerRef {
        let hits = Arc::clone(hits);
        ListenerFn::arc("counter", move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn same_handle_is_added_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let l = counter(&hits);
        let reg = ListenerRegistry::new();
        assert!(reg.add(l.clone()));
        assert!(!reg.add(l.clone()));
        assert!(!reg.add_once(l.clone()));
        assert_eq!(reg.len(), 1);

        let evt = EventStore::new().add("x").unwrap();
        assert_eq!(reg.dispatch(&evt, None), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn once_entries_are_detached_by_dispatch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let reg = ListenerRegistry::new();
        reg.add_once(counter(&hits));
        let evt = EventStore::new().add("x").unwrap();
        reg.dispatch(&evt, None);
        reg.dispatch(&evt, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn removal_is_by_identity() {
        let hits = Arc::new(AtomicUsize::new(0));
        let a = counter(&hits);
        let b = counter(&hits);
        let reg = ListenerRegistry::new();
        reg.add(a.clone());
        reg.add(b.clone());
        assert!(reg.remove(&a));
        assert!(!reg.remove(&a));
        assert!(reg.contains(&b));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn listener_added_during_dispatch_waits_for_next_fire() {
        let store = EventStore::new();
        let evt = store.add("x").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let late = counter(&hits);

        let adder: ListenerRef = ListenerFn::arc("adder", move |evt, _| {
            evt.listen(ListenerRef::clone(&late));
        });
        evt.listen(adder);

        evt.fire(None).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        evt.fire(None).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_removed_before_being_reached_is_skipped() {
        let store = EventStore::new();
        let evt = store.add("x").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let victim = counter(&hits);
        let once_victim = counter(&hits);

        let targets = [ListenerRef::clone(&victim), ListenerRef::clone(&once_victim)];
        let remover: ListenerRef = ListenerFn::arc("remover", move |evt, _| {
            for target in &targets {
                evt.remove(target);
            }
        });
        evt.listen(remover);
        evt.listen(victim);
        evt.once(once_victim);

        assert_eq!(evt.listener_count(), 3);
        evt.fire(None).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(evt.listener_count(), 1);
    }

    #[test]
    fn once_listener_survives_reentrant_fire_with_single_delivery() {
        let store = EventStore::new();
        let evt = store.add("x").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let depth = Arc::new(AtomicUsize::new(0));

        let refire: ListenerRef = ListenerFn::arc("refire", move |evt, _| {
            if depth.fetch_add(1, Ordering::SeqCst) == 0 {
                evt.fire(None).unwrap();
            }
        });
        evt.listen(refire);
        evt.once(counter(&hits));

        evt.fire(None).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(evt.listener_count(), 1);
    }
}
