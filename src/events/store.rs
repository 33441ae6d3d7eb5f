//! # Event store: id → event mapping.
//!
//! [`EventStore`] creates events, looks them up (creating on demand), and hands
//! out [`EventGroup`]s over several of them.
//!
//! ## Rules
//! - Ids are unique within one store; `add` with a taken id fails with
//!   [`EventError::Duplicate`].
//! - Omitted ids are generated from [`Config::id_prefix`](crate::Config::id_prefix)
//!   and a per-store sequence, skipping ids already taken.
//! - A destroyed id may be reused by a later `add`.
//! - Cloning the store is cheap; clones share the same events.
//!
//! ## Example
//! ```rust
//! use modvisor::{EventSpec, EventStore};
//!
//! let store = EventStore::new();
//! let all = store
//!     .add_all(vec!["my/evt1".into(), EventSpec::new().id("my/evt2").stateful(true).into()])
//!     .unwrap();
//! assert!(store.find("my/evt1").unwrap().ptr_eq(&all[0]));
//! assert!(store.get("my/evt2").is_stateful());
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::bridge::Bridge;
use super::event::{Event, EventInit, EventSpec};
use super::group::EventGroup;
use crate::error::EventError;

/// Default prefix of generated ids.
pub(crate) const DEFAULT_ID_PREFIX: &str = "event-";

pub(crate) struct StoreShared {
    events: Mutex<HashMap<String, Event>>,
    seq: AtomicU64,
    id_prefix: String,
    bridge: Mutex<Option<Arc<dyn Bridge>>>,
}

impl StoreShared {
    pub(crate) fn bridge(&self) -> Option<Arc<dyn Bridge>> {
        self.bridge.lock().clone()
    }

    /// Removes `event` only if it is still the one registered under its id.
    pub(crate) fn remove_exact(&self, event: &Event) -> bool {
        let mut events = self.events.lock();
        match events.get(event.id()) {
            Some(current) if current.ptr_eq(event) => {
                events.remove(event.id());
                tracing::trace!(event = %event, "event destroyed");
                true
            }
            _ => false,
        }
    }
}

/// Shared mapping from event id to [`Event`].
#[derive(Clone)]
pub struct EventStore {
    shared: Arc<StoreShared>,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    /// Creates an empty store with the default id prefix.
    pub fn new() -> Self {
        Self::with_id_prefix(DEFAULT_ID_PREFIX)
    }

    /// Creates an empty store generating ids as `<prefix><n>`.
    pub fn with_id_prefix(prefix: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                events: Mutex::new(HashMap::new()),
                seq: AtomicU64::new(0),
                id_prefix: prefix.into(),
                bridge: Mutex::new(None),
            }),
        }
    }

    /// Installs the bridge receiving fires of remote events (replaces any previous one).
    pub fn set_bridge(&self, bridge: Arc<dyn Bridge>) {
        *self.shared.bridge.lock() = Some(bridge);
    }

    /// Builder-style [`set_bridge`](Self::set_bridge).
    pub fn with_bridge(self, bridge: Arc<dyn Bridge>) -> Self {
        self.set_bridge(bridge);
        self
    }

    /// Creates a new event.
    ///
    /// ### Errors
    /// [`EventError::Duplicate`] if the id is taken.
    pub fn add(&self, init: impl Into<EventInit>) -> Result<Event, EventError> {
        let mut events = self.shared.events.lock();
        self.insert_locked(&mut events, init.into().into_spec())
    }

    /// Creates several events at once, returned in the given order.
    ///
    /// ### Errors
    /// [`EventError::Duplicate`] if an id is taken or listed twice; nothing is
    /// created then.
    pub fn add_all(&self, inits: Vec<EventInit>) -> Result<EventGroup, EventError> {
        self.add_all_with(&EventSpec::default(), inits)
    }

    /// Like [`add_all`](Self::add_all), with `defaults` filling every option an
    /// entry leaves unset.
    ///
    /// ### Errors
    /// [`EventError::Duplicate`] if an id is taken or listed twice; nothing is
    /// created then.
    pub fn add_all_with(
        &self,
        defaults: &EventSpec,
        inits: Vec<EventInit>,
    ) -> Result<EventGroup, EventError> {
        let specs: Vec<EventSpec> = inits
            .into_iter()
            .map(|init| init.into_spec().or(defaults))
            .collect();

        let mut events = self.shared.events.lock();
        let mut reserved: HashSet<String> = HashSet::new();
        for id in specs.iter().filter_map(|spec| spec.id.as_deref()) {
            if events.contains_key(id) || !reserved.insert(id.to_string()) {
                return Err(EventError::Duplicate { id: id.to_string() });
            }
        }

        let mut created = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = match spec.id.clone() {
                Some(id) => id,
                None => self.next_free_id(|id| events.contains_key(id) || reserved.contains(id)),
            };
            created.push(self.create_locked(&mut events, id, spec));
        }
        Ok(EventGroup::new(created))
    }

    fn insert_locked(
        &self,
        events: &mut HashMap<String, Event>,
        spec: EventSpec,
    ) -> Result<Event, EventError> {
        let id = match spec.id.clone() {
            Some(id) if events.contains_key(&id) => return Err(EventError::Duplicate { id }),
            Some(id) => id,
            None => self.next_free_id(|id| events.contains_key(id)),
        };
        Ok(self.create_locked(events, id, spec))
    }

    /// Creates and registers an event under an id known to be free.
    fn create_locked(
        &self,
        events: &mut HashMap<String, Event>,
        id: String,
        spec: EventSpec,
    ) -> Event {
        let event = Event::new(
            id.clone(),
            spec.state.unwrap_or(false),
            spec.remote.unwrap_or(false),
            spec.context.unwrap_or_default(),
            Arc::downgrade(&self.shared),
        );
        tracing::trace!(event = %id, stateful = event.is_stateful(), "event added");
        events.insert(id, event.clone());
        event
    }

    fn next_free_id(&self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let n = self.shared.seq.fetch_add(1, Ordering::Relaxed);
            let id = format!("{}{n}", self.shared.id_prefix);
            if !taken(&id) {
                return id;
            }
        }
    }

    /// Returns true if an event with `id` exists.
    pub fn has(&self, id: &str) -> bool {
        self.shared.events.lock().contains_key(id)
    }

    /// Looks an event up without creating it.
    pub fn find(&self, id: &str) -> Option<Event> {
        self.shared.events.lock().get(id).cloned()
    }

    /// Returns the event `id`, creating a stateless one if absent.
    pub fn get(&self, id: &str) -> Event {
        self.get_with(id, EventSpec::default())
    }

    /// Returns the event `id`, creating it from `spec` if absent.
    ///
    /// `spec.id` is ignored; `id` always wins.
    pub fn get_with(&self, id: &str, spec: EventSpec) -> Event {
        let mut events = self.shared.events.lock();
        if let Some(evt) = events.get(id) {
            return evt.clone();
        }
        self.create_locked(&mut events, id.to_string(), spec)
    }

    /// Returns a group over `ids`, creating missing events.
    ///
    /// Order and duplicates are preserved position by position.
    pub fn get_all<I, S>(&self, ids: I) -> EventGroup
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        EventGroup::new(ids.into_iter().map(|id| self.get(id.as_ref())).collect())
    }

    /// Resets the event `id`. Returns false if unknown.
    pub fn reset(&self, id: &str) -> bool {
        match self.find(id) {
            Some(evt) => {
                evt.reset();
                true
            }
            None => false,
        }
    }

    /// Destroys the event `id`. Returns false if unknown.
    pub fn destroy(&self, id: &str) -> bool {
        match self.find(id) {
            Some(evt) => {
                evt.destroy();
                true
            }
            None => false,
        }
    }

    /// Returns sorted list of event ids.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.events.lock().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.shared.events.lock().len()
    }

    /// Returns true if the store holds no event.
    pub fn is_empty(&self) -> bool {
        self.shared.events.lock().is_empty()
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore").field("ids", &self.ids()).finish()
    }
}
