//! Event bus: named events, listeners, groups and barriers.
//!
//! This module groups the event **data model** and the **store** used to
//! create, look up and group events.
//!
//! ## Contents
//! - [`Listener`], [`ListenerFn`], [`ListenerRef`], [`Context`] listener contract
//! - [`ListenerRegistry`] deduplicated, ordered listeners of one event
//! - [`Event`], [`EventSpec`], [`EventInit`] one unit of notification
//! - [`EventStore`] id → event mapping
//! - [`EventGroup`], [`SyncHandle`] group fan-out and `sync`/`sync_once` barriers
//! - [`Bridge`] hook for remote events
//!
//! ## Quick reference
//! ```text
//! EventStore ──add/get──► Event ──listen/once──► ListenerRegistry
//!      │                    │
//!      │                    └──fire(arg)──► Bridge (remote only) ──► listeners (in order)
//!      └──get_all/add_all──► EventGroup ──sync(cb)──► Slot per position ──► Barrier ──► cb(values)
//! ```

mod bridge;
mod event;
mod group;
mod listener;
#[cfg(feature = "logging")]
mod log;
mod registry;
mod store;

pub use bridge::Bridge;
pub use event::{Event, EventInit, EventSpec};
pub use group::{EventGroup, SyncHandle};
pub use listener::{Context, Listener, ListenerFn, ListenerRef};
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use registry::ListenerRegistry;
pub use store::EventStore;
pub(crate) use store::DEFAULT_ID_PREFIX;
