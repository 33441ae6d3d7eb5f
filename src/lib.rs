//! # modvisor
//!
//! **Modvisor** is a lightweight in-process module registry with a stateful
//! event bus.
//!
//! Applications are assembled from named modules. Each module declares the
//! modules it requires, an optional configuration step and a set of exported
//! capabilities. An [`Orchestrator`] configures them in installation order,
//! stops at the first failure and resumes from that point on the next pass.
//! Modules talk to each other through named [`Event`]s kept in an
//! [`EventStore`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  ModuleSpec  │   │  ModuleSpec  │   │  ModuleSpec  │
//!     │   "router"   │   │    "auth"    │   │     "app"    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ install          ▼ install          ▼ install (requires router, auth)
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - ModuleRegistry (ordered entries, lifecycle flags, cursor)      │
//! │  - options records per module                                     │
//! │  - EventStore + stateful ready event                              │
//! │  - built-in "event" module exporting the store                    │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   configure(next,    configure(next,    configure(next,
//!     opts, orch)        opts, orch)        opts, orch)
//!        │                  │                  │
//!        └──── events ──────┴──── events ──────┘
//!                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventStore: id → Event                                           │
//! │  Event: listeners (ordered, deduplicated), stateful replay,       │
//! │         remote forwarding through a Bridge                        │
//! │  EventGroup: fan-out, sync / sync_once barriers                   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! configure(opts)
//!   ├─► store options records
//!   ├─► for module in registry from cursor (Uninitialized | Failed):
//!   │       ├─ Initializing
//!   │       ├─ configure step (Ok / Err / deferred Completion / panic)
//!   │       ├─ Ok  ──► Ready, cursor moves on
//!   │       └─ Err ──► Failed, cursor stays ──► onerror(err) ──► return Err
//!   └─► configured = true ──► onconfigure() ──► ready.fire()
//!
//! install(spec) after configured ──► configure step runs immediately
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Modules**       | Describe feature units, their dependencies and exports.          | [`ModuleSpec`], [`Module`], [`Exports`]     |
//! | **Configuration** | Ordered, resumable pass with sync or deferred completion.        | [`Orchestrator`], [`Next`], [`Completion`]  |
//! | **Events**        | Named events with listeners, stateful replay and remote bridge.  | [`EventStore`], [`Event`], [`Bridge`]       |
//! | **Barriers**      | Wait for every event of a group before running a callback.      | [`EventGroup`], [`SyncHandle`]              |
//! | **Errors**        | Typed errors with stable messages and labels.                    | [`OrchestratorError`], [`EventError`]       |
//! | **Settings**      | Ready event id, built-in event module, generated id prefix.      | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] listener _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use modvisor::{ConfigureOptions, ModuleSpec, Orchestrator};
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::new();
//!
//!     orch.install(ModuleSpec::new("greeter").with_setup(|orch, opts| {
//!         let greeting = opts.get("greeting").cloned();
//!         orch.events().get("greeter/ready").fire(greeting).ok();
//!         Ok(())
//!     }))?;
//!
//!     orch.ready(|| println!("all modules configured"));
//!     orch.configure(ConfigureOptions::new().module("greeter", json!({"greeting": "hello"})))?;
//!
//!     assert!(orch.is_configured());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod modules;

// ---- Public re-exports ----

pub use crate::core::{
    default_instance, Config, ModuleState, Orchestrator, OrchestratorBuilder, EVENT_MODULE,
    EVENT_STORE_EXPORT,
};
pub use error::{EventError, ModuleError, OrchestratorError};
pub use events::{
    Bridge, Context, Event, EventGroup, EventInit, EventSpec, EventStore, Listener, ListenerFn,
    ListenerRef, ListenerRegistry, SyncHandle,
};
pub use modules::{
    Completion, ConfigureHook, ConfigureOptions, ErrorHook, Exports, Module, ModuleFn,
    ModuleOptions, ModuleRef, ModuleSpec, Next, SetupFn,
};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use events::LogWriter;
