//! # Named events with optional state.
//!
//! An [`Event`] is a cheap-to-clone handle to one unit of notification. It owns
//! its fire state (`time`, `data`) and a [`ListenerRegistry`].
//!
//! ## State machine
//! ```text
//! stateless:  unfired ──fire──► fired ──fire──► fired ...           (never terminal)
//! stateful:   unfired ──fire──► fired ──fire──► Err(AlreadyFired)
//!                                 └──reset──► unfired
//! ```
//!
//! A stateful event keeps the fired value in `data` (or `Value::Null` when fired
//! without one) and replays it to every listener registered after the fire.
//!
//! ## Example
//! ```rust
//! use modvisor::{EventSpec, EventStore};
//! use serde_json::json;
//!
//! let store = EventStore::new();
//! let evt = store.add(EventSpec::new().stateful(true)).unwrap();
//!
//! evt.fire(Some(json!("a"))).unwrap();
//! assert_eq!(evt.data(), Some(json!("a")));
//! assert!(evt.fire(Some(json!("again"))).is_err());
//!
//! evt.reset();
//! evt.fire(Some(json!("b"))).unwrap();
//! assert_eq!(evt.data(), Some(json!("b")));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde_json::Value;

use super::listener::{Context, ListenerRef};
use super::registry::ListenerRegistry;
use super::store::StoreShared;
use crate::error::EventError;

/// Options record used to create an event.
///
/// Unset fields fall back to defaults (stateless, local, no context, generated id)
/// or, in [`EventStore::add_all_with`](crate::EventStore::add_all_with), to the
/// shared defaults record.
#[derive(Clone, Debug, Default)]
pub struct EventSpec {
    /// Event id; generated when `None`.
    pub id: Option<String>,
    /// Stateful flag.
    pub state: Option<bool>,
    /// Remote flag.
    pub remote: Option<bool>,
    /// Context bound for listeners.
    pub context: Option<Context>,
}

impl EventSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the stateful flag.
    pub fn stateful(mut self, state: bool) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the remote flag.
    pub fn remote(mut self, remote: bool) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Binds a context.
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Fills every unset field from `defaults` (the id is never inherited).
    pub fn or(self, defaults: &EventSpec) -> Self {
        Self {
            id: self.id,
            state: self.state.or(defaults.state),
            remote: self.remote.or(defaults.remote),
            context: self.context.or_else(|| defaults.context.clone()),
        }
    }
}

/// Input accepted by [`EventStore::add`](crate::EventStore::add): a bare id,
/// an options record, or nothing at all.
#[derive(Clone, Debug, Default)]
pub enum EventInit {
    /// Generated id, default options.
    #[default]
    Anonymous,
    /// Given id, default options.
    Id(String),
    /// Full options record.
    Spec(EventSpec),
}

impl EventInit {
    /// Normalizes into an options record.
    pub fn into_spec(self) -> EventSpec {
        match self {
            EventInit::Anonymous => EventSpec::default(),
            EventInit::Id(id) => EventSpec::new().id(id),
            EventInit::Spec(spec) => spec,
        }
    }
}

impl From<&str> for EventInit {
    fn from(id: &str) -> Self {
        EventInit::Id(id.to_string())
    }
}

impl From<String> for EventInit {
    fn from(id: String) -> Self {
        EventInit::Id(id)
    }
}

impl From<EventSpec> for EventInit {
    fn from(spec: EventSpec) -> Self {
        EventInit::Spec(spec)
    }
}

#[derive(Default)]
struct FireState {
    time: Option<SystemTime>,
    data: Option<Value>,
}

struct EventInner {
    id: String,
    stateful: bool,
    remote: bool,
    context: Context,
    state: Mutex<FireState>,
    listeners: ListenerRegistry,
    store: Weak<StoreShared>,
}

/// Handle to one event of an [`EventStore`](crate::EventStore).
///
/// Clones share the same event; use [`Event::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

/// Non-owning handle to an [`Event`].
#[derive(Clone)]
pub(crate) struct WeakEvent(Weak<EventInner>);

impl WeakEvent {
    pub(crate) fn upgrade(&self) -> Option<Event> {
        self.0.upgrade().map(|inner| Event { inner })
    }
}

impl Event {
    pub(crate) fn new(
        id: String,
        stateful: bool,
        remote: bool,
        context: Context,
        store: Weak<StoreShared>,
    ) -> Self {
        Self {
            inner: Arc::new(EventInner {
                id,
                stateful,
                remote,
                context,
                state: Mutex::new(FireState::default()),
                listeners: ListenerRegistry::new(),
                store,
            }),
        }
    }

    /// Event id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// True if the event keeps its last value and refuses a second fire.
    pub fn is_stateful(&self) -> bool {
        self.inner.stateful
    }

    /// True if fires are forwarded to the store's [`Bridge`](crate::Bridge).
    pub fn is_remote(&self) -> bool {
        self.inner.remote
    }

    /// Context bound at creation.
    pub fn context(&self) -> &Context {
        &self.inner.context
    }

    /// Time of the last fire, `None` before the first fire or after `reset`.
    pub fn time(&self) -> Option<SystemTime> {
        self.inner.state.lock().time
    }

    /// Stored value of a fired stateful event. Always `None` for stateless events.
    pub fn data(&self) -> Option<Value> {
        self.inner.state.lock().data.clone()
    }

    /// True once fired (until `reset`).
    pub fn is_fired(&self) -> bool {
        self.inner.state.lock().time.is_some()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub(crate) fn downgrade(&self) -> WeakEvent {
        WeakEvent(Arc::downgrade(&self.inner))
    }

    /// True if both handles point to the same event.
    pub fn ptr_eq(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Fires the event with an optional argument.
    ///
    /// ### Errors
    /// [`EventError::AlreadyFired`] on a stateful event fired since the last `reset`.
    pub fn fire(&self, arg: Option<Value>) -> Result<(), EventError> {
        {
            let mut state = self.inner.state.lock();
            if self.inner.stateful {
                if state.time.is_some() {
                    return Err(EventError::AlreadyFired {
                        id: self.inner.id.clone(),
                    });
                }
                state.data = Some(arg.clone().unwrap_or(Value::Null));
            }
            state.time = Some(SystemTime::now());
        }

        if self.inner.remote {
            if let Some(bridge) = self.inner.store.upgrade().and_then(|s| s.bridge()) {
                bridge.forward(self, arg.as_ref());
            }
        }

        let delivered = self.inner.listeners.dispatch(self, arg.as_ref());
        tracing::trace!(event = %self.inner.id, delivered, "event fired");
        Ok(())
    }

    /// Fires the event from a positional argument list.
    ///
    /// ### Errors
    /// - [`EventError::Arity`] with more than one argument
    /// - anything [`fire`](Self::fire) returns
    pub fn fire_args(&self, args: Vec<Value>) -> Result<(), EventError> {
        if args.len() > 1 {
            return Err(EventError::Arity { count: args.len() });
        }
        self.fire(args.into_iter().next())
    }

    /// Value to replay to late listeners, if any.
    fn replay(&self) -> Option<Value> {
        if !self.inner.stateful {
            return None;
        }
        let state = self.inner.state.lock();
        state.time.and(state.data.clone())
    }

    /// Registers a listener; a fired stateful event replays its value to it at once.
    pub fn listen(&self, listener: ListenerRef) -> &Self {
        if self.inner.listeners.add(ListenerRef::clone(&listener)) {
            if let Some(data) = self.replay() {
                listener.on_fire(self, Some(&data));
            }
        }
        self
    }

    /// Registers a listener for the next fire only.
    ///
    /// On a fired stateful event the stored value is delivered immediately and the
    /// listener is not registered.
    pub fn once(&self, listener: ListenerRef) -> &Self {
        match self.replay() {
            Some(data) => listener.on_fire(self, Some(&data)),
            None => {
                self.inner.listeners.add_once(listener);
            }
        }
        self
    }

    /// Removes a listener by identity.
    pub fn remove(&self, listener: &ListenerRef) -> &Self {
        self.inner.listeners.remove(listener);
        self
    }

    /// Clears `time` and `data`, allowing a stateful event to fire again.
    pub fn reset(&self) -> &Self {
        let mut state = self.inner.state.lock();
        state.time = None;
        state.data = None;
        self
    }

    /// Detaches every listener and removes the event from its store.
    ///
    /// Destroying twice is a no-op; a newer event registered under the same id
    /// is left untouched.
    pub fn destroy(&self) {
        self.inner.listeners.clear();
        if let Some(store) = self.inner.store.upgrade() {
            store.remove_exact(self);
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.id)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("stateful", &self.inner.stateful)
            .field("remote", &self.inner.remote)
            .field("fired", &self.is_fired())
            .finish()
    }
}
