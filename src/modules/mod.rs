//! # Module descriptors and the module contract.
//!
//! This module provides the module-related types:
//! - [`ModuleSpec`] - descriptor (name, requirements, configuration step, exports)
//! - [`Module`] - trait for a configuration step
//! - [`ModuleFn`], [`SetupFn`] - closure-backed steps (full and compact forms)
//! - [`Next`], [`Completion`] - continuation for deferred completion
//! - [`ConfigureOptions`], [`ModuleOptions`] - options of a configuration pass

mod module;
mod next;
mod options;
mod spec;

pub use module::{Module, ModuleFn, ModuleRef, SetupFn};
pub use next::{Completion, Next};
pub use options::{ConfigureHook, ConfigureOptions, ErrorHook, ModuleOptions};
pub use spec::{Exports, ModuleSpec};
