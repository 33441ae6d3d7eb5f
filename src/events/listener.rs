//! # Listener contract
//!
//! [`Listener`] is the extension point for reacting to fired events. Listeners
//! are shared as [`ListenerRef`] (`Arc<dyn Listener>`) and identified by
//! pointer: registering the same handle twice on one event is a no-op.
//!
//! ## Contract
//! - Called synchronously from [`Event::fire`](crate::Event::fire), in
//!   registration order, on the firing thread.
//! - No lock is held while a listener runs: it may fire events, register or
//!   remove listeners, install modules.
//!
//! ## Example
//! ```rust
//! use modvisor::{EventStore, ListenerFn, ListenerRef};
//! use serde_json::json;
//!
//! let store = EventStore::new();
//! let evt = store.add("greeting").unwrap();
//!
//! let printer: ListenerRef = ListenerFn::arc("printer", |evt, data| {
//!     println!("{evt}: {data:?}");
//! });
//! evt.listen(printer);
//! evt.fire(Some(json!("hello"))).unwrap();
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::event::Event;

/// Contract for event listeners.
pub trait Listener: Send + Sync + 'static {
    /// Handles one delivery.
    ///
    /// # Parameters
    /// - `event`: the event being fired (its [`Event::context`] is the bound receiver)
    /// - `data`: the fired argument, `None` when fired without one
    fn on_fire(&self, event: &Event, data: Option<&Value>);

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared listener handle.
pub type ListenerRef = Arc<dyn Listener>;

/// Compares two listener handles by identity.
#[inline]
pub(crate) fn same_listener(a: &ListenerRef, b: &ListenerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Closure-backed listener.
pub struct ListenerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ListenerFn<F>
where
    F: Fn(&Event, Option<&Value>) + Send + Sync + 'static,
{
    /// Creates a new closure-backed listener.
    ///
    /// Prefer [`ListenerFn::arc`] when you immediately need a [`ListenerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the listener as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Listener for ListenerFn<F>
where
    F: Fn(&Event, Option<&Value>) + Send + Sync + 'static,
{
    fn on_fire(&self, event: &Event, data: Option<&Value>) {
        (self.f)(event, data)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for ListenerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerFn").field("name", &self.name).finish()
    }
}

/// Arbitrary value bound to an event at creation and handed to its listeners.
///
/// Cheap to clone; compares by identity.
#[derive(Clone, Default)]
pub struct Context(Option<Arc<dyn Any + Send + Sync>>);

impl Context {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    /// Wraps an already shared value (keeps its identity).
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(Some(value))
    }

    /// Returns true if a value is bound.
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Borrows the bound value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    /// True when both contexts are empty or share the same value.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => f.write_str("Context(..)"),
            None => f.write_str("Context(None)"),
        }
    }
}
