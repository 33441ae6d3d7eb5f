//! # Module descriptor.
//!
//! Defines [`ModuleSpec`], the record describing one feature unit: its name,
//! the modules it requires, its configuration step and its exported
//! capabilities. A spec is handed to
//! [`Orchestrator::install`](crate::Orchestrator::install) and is immutable once
//! stored.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use modvisor::{ModuleSpec, Orchestrator};
//!
//! struct Router { base: &'static str }
//!
//! let orch = Orchestrator::new();
//! orch.install(ModuleSpec::new("router").with_export("router", Router { base: "/" })).unwrap();
//! orch.install(
//!     ModuleSpec::new("app")
//!         .require("router")
//!         .with_setup(|orch, _opts| {
//!             let router: Arc<Router> = orch.export("router", "router").unwrap();
//!             assert_eq!(router.base, "/");
//!             Ok(())
//!         }),
//! )
//! .unwrap();
//! orch.init().unwrap();
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::module::{ModuleFn, ModuleRef, SetupFn};
use super::next::Next;
use super::options::ModuleOptions;
use crate::core::Orchestrator;
use crate::error::ModuleError;

/// Capabilities exported by a module, by name.
#[derive(Clone, Default)]
pub struct Exports {
    items: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Exports {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces capability `name`.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.items.insert(name.into(), Arc::new(value));
    }

    /// Adds or replaces capability `name` with an already shared value.
    pub fn insert_arc(&mut self, name: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.items.insert(name.into(), value);
    }

    /// Capability `name` as `T`, if present with that type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.items.get(name).cloned()?.downcast::<T>().ok()
    }

    /// Returns true if capability `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Sorted capability names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.items.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of capabilities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is exported.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Descriptor of one module.
#[derive(Clone, Default)]
pub struct ModuleSpec {
    name: String,
    requires: Vec<String>,
    module: Option<ModuleRef>,
    exports: Exports,
}

impl ModuleSpec {
    /// Creates a descriptor with no dependency, no configuration step and no export.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds one required module.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    /// Adds several required modules, in order.
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration step.
    pub fn with_module(mut self, module: ModuleRef) -> Self {
        self.module = Some(module);
        self
    }

    /// Sets the configuration step from a full-form closure.
    pub fn with_configure<F>(self, f: F) -> Self
    where
        F: Fn(Next, &ModuleOptions, &Orchestrator) -> Result<(), ModuleError>
            + Send
            + Sync
            + 'static,
    {
        self.with_module(ModuleFn::arc(f))
    }

    /// Sets the configuration step from a compact-form closure.
    pub fn with_setup<F>(self, f: F) -> Self
    where
        F: Fn(&Orchestrator, &ModuleOptions) -> Result<(), ModuleError> + Send + Sync + 'static,
    {
        self.with_module(SetupFn::arc(f))
    }

    /// Exports capability `name`.
    pub fn with_export<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.exports.insert(name, value);
        self
    }

    /// Replaces the whole export set.
    pub fn with_exports(mut self, exports: Exports) -> Self {
        self.exports = exports;
        self
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Required module names, in declared order.
    pub fn required(&self) -> &[String] {
        &self.requires
    }

    /// Configuration step, if any.
    pub fn module(&self) -> Option<&ModuleRef> {
        self.module.as_ref()
    }

    /// Exported capabilities.
    pub fn exports(&self) -> &Exports {
        &self.exports
    }
}

impl fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSpec")
            .field("name", &self.name)
            .field("requires", &self.requires)
            .field("configure", &self.module.is_some())
            .field("exports", &self.exports)
            .finish()
    }
}
