//! # Module configuration contract and closure-backed implementations.
//!
//! [`Module`] is the configuration step of a feature unit. It receives a
//! continuation ([`Next`]), the module's options and the orchestrator.
//!
//! Two closure adapters are provided:
//! - [`ModuleFn`]: full form `(next, options, orchestrator)`
//! - [`SetupFn`]: compact form `(orchestrator, options)`, always synchronous
//!
//! ## Example
//! ```rust
//! use modvisor::{ModuleFn, ModuleRef, ModuleError};
//!
//! let m: ModuleRef = ModuleFn::arc(|_next, opts, _orch| {
//!     if opts.get("fail").is_some() {
//!         return Err(ModuleError::msg("asked to fail"));
//!     }
//!     Ok(())
//! });
//! # let _ = m;
//! ```

use std::sync::Arc;

use super::next::Next;
use super::options::ModuleOptions;
use crate::core::Orchestrator;
use crate::error::ModuleError;

/// Configuration step of a module.
pub trait Module: Send + Sync + 'static {
    /// Configures the module.
    ///
    /// Return `Ok(())` for synchronous success, `Err(..)` for failure, or call
    /// [`Next::defer`] and resolve the returned completion later.
    fn configure(
        &self,
        next: Next,
        options: &ModuleOptions,
        orchestrator: &Orchestrator,
    ) -> Result<(), ModuleError>;
}

/// Shared module handle.
pub type ModuleRef = Arc<dyn Module>;

/// Closure-backed module, full signature.
pub struct ModuleFn<F> {
    f: F,
}

impl<F> ModuleFn<F>
where
    F: Fn(Next, &ModuleOptions, &Orchestrator) -> Result<(), ModuleError> + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> Module for ModuleFn<F>
where
    F: Fn(Next, &ModuleOptions, &Orchestrator) -> Result<(), ModuleError> + Send + Sync + 'static,
{
    fn configure(
        &self,
        next: Next,
        options: &ModuleOptions,
        orchestrator: &Orchestrator,
    ) -> Result<(), ModuleError> {
        (self.f)(next, options, orchestrator)
    }
}

/// Closure-backed module, compact signature `(orchestrator, options)`.
pub struct SetupFn<F> {
    f: F,
}

impl<F> SetupFn<F>
where
    F: Fn(&Orchestrator, &ModuleOptions) -> Result<(), ModuleError> + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> Module for SetupFn<F>
where
    F: Fn(&Orchestrator, &ModuleOptions) -> Result<(), ModuleError> + Send + Sync + 'static,
{
    fn configure(
        &self,
        _next: Next,
        options: &ModuleOptions,
        orchestrator: &Orchestrator,
    ) -> Result<(), ModuleError> {
        (self.f)(orchestrator, options)
    }
}
