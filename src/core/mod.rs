//! Runtime core: module registry and configuration pass.
//!
//! The public API from this module is [`Orchestrator`], its [`OrchestratorBuilder`],
//! its [`Config`], the [`ModuleState`] lifecycle flag and the optional
//! process-wide [`default_instance`].
//!
//! Internal modules:
//! - [`registry`]: ordered module entries, lifecycle flags and the pass cursor;
//! - [`orchestrator`]: install/uninstall, the resumable pass, ready notification;
//! - [`builder`]: construction with a custom config, store or bridge;
//! - [`global`]: lazily built default instance.

mod builder;
mod config;
mod global;
mod orchestrator;
mod registry;

pub use builder::OrchestratorBuilder;
pub use config::{Config, EVENT_MODULE, EVENT_STORE_EXPORT};
pub use global::default_instance;
pub use orchestrator::Orchestrator;
pub use registry::ModuleState;
