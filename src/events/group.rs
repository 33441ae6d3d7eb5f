//! # Event groups and barriers.
//!
//! [`EventGroup`] is an ordered, non-owning view over several events. Every
//! group operation fans out to the members in order; [`EventGroup::sync`] and
//! [`EventGroup::sync_once`] add a barrier across them.
//!
//! ## Barrier
//! ```text
//! group [a, b, c] ── sync(cb)
//!
//!   a.fire("1")   fired={a}      values=["1", _, _]
//!   a.fire("1'")  fired={a}      values=["1'", _, _]     (same member: no count)
//!   b.fire("2")   fired={a,b}    values=["1'", "2", _]
//!   c.fire("3")   fired={a,b,c}  values=["1'", "2", "3"] ──► cb(["1'", "2", "3"])
//!   b.fire("22")  covered        values=["1'", "22", "3"] ──► cb(["1'", "22", "3"])
//! ```
//!
//! - Coverage is tracked per position: an event listed twice counts twice.
//! - Once every position fired, each further member fire invokes the callback
//!   again with refreshed values (`sync`), or nothing happens (`sync_once`,
//!   whose registration detaches after the first call).
//! - Stateful members that already fired replay into the barrier on registration.
//! - A registration lives as long as a member still holds one of its slots or
//!   its [`SyncHandle`] is alive; destroying every member releases it.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use super::event::{Event, WeakEvent};
use super::listener::{Listener, ListenerRef};
use crate::error::EventError;

type SyncCallback = Box<dyn Fn(&[Option<Value>]) + Send + Sync>;

/// Ordered list of events with group-level operations.
#[derive(Clone, Default)]
pub struct EventGroup {
    events: Vec<Event>,
}

impl EventGroup {
    /// Creates a group over `events`, in order.
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Member at `index`.
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Registers `listener` on every member.
    pub fn listen(&self, listener: ListenerRef) -> &Self {
        for evt in &self.events {
            evt.listen(ListenerRef::clone(&listener));
        }
        self
    }

    /// Registers `listener` for the next fire of every member.
    pub fn once(&self, listener: ListenerRef) -> &Self {
        for evt in &self.events {
            evt.once(ListenerRef::clone(&listener));
        }
        self
    }

    /// Removes `listener` from every member.
    pub fn remove(&self, listener: &ListenerRef) -> &Self {
        for evt in &self.events {
            evt.remove(listener);
        }
        self
    }

    /// Fires every member with `arg`, stopping at the first error.
    pub fn fire(&self, arg: Option<Value>) -> Result<(), EventError> {
        for evt in &self.events {
            evt.fire(arg.clone())?;
        }
        Ok(())
    }

    /// Fires every member from a positional argument list, stopping at the first error.
    pub fn fire_args(&self, args: Vec<Value>) -> Result<(), EventError> {
        if args.len() > 1 {
            return Err(EventError::Arity { count: args.len() });
        }
        self.fire(args.into_iter().next())
    }

    /// Resets every member.
    pub fn reset(&self) -> &Self {
        for evt in &self.events {
            evt.reset();
        }
        self
    }

    /// Destroys every member.
    pub fn destroy(&self) {
        for evt in &self.events {
            evt.destroy();
        }
    }

    /// Calls `callback` with each member's latest value once every member fired,
    /// then again on every further member fire.
    pub fn sync<F>(&self, callback: F) -> SyncHandle
    where
        F: Fn(&[Option<Value>]) + Send + Sync + 'static,
    {
        self.register(Box::new(callback), false)
    }

    /// Like [`sync`](Self::sync), but `callback` runs at most once.
    pub fn sync_once<F>(&self, callback: F) -> SyncHandle
    where
        F: Fn(&[Option<Value>]) + Send + Sync + 'static,
    {
        self.register(Box::new(callback), true)
    }

    fn register(&self, callback: SyncCallback, once: bool) -> SyncHandle {
        let barrier = Arc::new(Barrier {
            state: Mutex::new(BarrierState {
                fired: vec![false; self.events.len()],
                values: vec![None; self.events.len()],
                pending: self.events.len(),
                retired: false,
            }),
            bindings: Mutex::new(Vec::with_capacity(self.events.len())),
            callback,
            once,
        });

        let slots: Vec<(Event, ListenerRef)> = self
            .events
            .iter()
            .enumerate()
            .map(|(position, evt)| {
                let slot: ListenerRef = Arc::new(Slot {
                    barrier: Arc::clone(&barrier),
                    position,
                });
                (evt.clone(), slot)
            })
            .collect();
        barrier.bindings.lock().extend(
            slots
                .iter()
                .map(|(evt, slot)| (evt.downgrade(), Arc::downgrade(slot))),
        );

        // Replays from fired stateful members may complete (and retire) the barrier
        // before every slot is attached.
        for (evt, slot) in slots {
            if barrier.is_retired() {
                break;
            }
            evt.listen(slot);
        }

        SyncHandle { barrier }
    }
}

impl Deref for EventGroup {
    type Target = [Event];

    fn deref(&self) -> &[Event] {
        &self.events
    }
}

impl From<Vec<Event>> for EventGroup {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

impl IntoIterator for EventGroup {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl fmt::Display for EventGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, evt) in self.events.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{evt}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for EventGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events.iter()).finish()
    }
}

struct BarrierState {
    fired: Vec<bool>,
    values: Vec<Option<Value>>,
    /// Positions that have not fired yet.
    pending: usize,
    retired: bool,
}

struct Barrier {
    state: Mutex<BarrierState>,
    /// Non-owning: members own their slots, slots own the barrier.
    bindings: Mutex<Vec<(WeakEvent, Weak<dyn Listener>)>>,
    callback: SyncCallback,
    once: bool,
}

impl Barrier {
    fn arrive(&self, position: usize, data: Option<&Value>) {
        let args = {
            let mut state = self.state.lock();
            if state.retired {
                return;
            }
            state.values[position] = data.cloned();
            if !state.fired[position] {
                state.fired[position] = true;
                state.pending -= 1;
            }
            if state.pending > 0 {
                return;
            }
            if self.once {
                state.retired = true;
            }
            state.values.clone()
        };

        (self.callback)(&args);

        if self.once {
            self.detach();
        }
    }

    fn is_retired(&self) -> bool {
        self.state.lock().retired
    }

    fn detach(&self) {
        let bindings = std::mem::take(&mut *self.bindings.lock());
        for (evt, slot) in bindings {
            if let (Some(evt), Some(slot)) = (evt.upgrade(), slot.upgrade()) {
                evt.remove(&slot);
            }
        }
    }
}

/// Per-position listener feeding a [`Barrier`].
struct Slot {
    barrier: Arc<Barrier>,
    position: usize,
}

impl Listener for Slot {
    fn on_fire(&self, _event: &Event, data: Option<&Value>) {
        self.barrier.arrive(self.position, data);
    }

    fn name(&self) -> &str {
        "sync"
    }
}

/// Registration returned by [`EventGroup::sync`] / [`EventGroup::sync_once`].
///
/// Dropping the handle keeps the registration alive; call [`cancel`](Self::cancel)
/// to detach it.
pub struct SyncHandle {
    barrier: Arc<Barrier>,
}

impl SyncHandle {
    /// Detaches the registration from every member.
    pub fn cancel(&self) {
        self.barrier.state.lock().retired = true;
        self.barrier.detach();
    }

    /// True once cancelled, or after a `sync_once` completed.
    pub fn is_retired(&self) -> bool {
        self.barrier.is_retired()
    }
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("once", &self.barrier.once)
            .field("retired", &self.is_retired())
            .finish()
    }
}
