//! # Options of a configuration pass.
//!
//! [`ConfigureOptions`] carries the per-module options records and the two
//! optional hooks of a pass (`onerror`, `onconfigure`). Options are stored by
//! the orchestrator when a pass runs and handed, read-only, to each module.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::Orchestrator;
use crate::error::OrchestratorError;

/// Hook invoked when a pass fails.
pub type ErrorHook = Arc<dyn Fn(&Orchestrator, &OrchestratorError) + Send + Sync>;

/// Hook invoked when a pass completes.
pub type ConfigureHook = Arc<dyn Fn(&Orchestrator) + Send + Sync>;

/// Options record of one module.
///
/// Wraps a JSON value; an empty object by default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleOptions(Value);

impl Default for ModuleOptions {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl ModuleOptions {
    /// Wraps a value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Field `key` of an object record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserializes the record into a typed options struct.
    ///
    /// # Example
    /// ```
    /// use modvisor::ModuleOptions;
    /// use serde::Deserialize;
    /// use serde_json::json;
    ///
    /// #[derive(Deserialize)]
    /// struct Opts { myopt: String }
    ///
    /// let opts = ModuleOptions::new(json!({"myopt": "myvalue"}));
    /// assert_eq!(opts.parse::<Opts>().unwrap().myopt, "myvalue");
    /// ```
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// The raw value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ModuleOptions {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Options of one [`Orchestrator::configure`] call.
///
/// ## Example
/// ```rust
/// use modvisor::{ConfigureOptions, Orchestrator};
/// use serde_json::json;
///
/// let orch = Orchestrator::new();
/// orch.configure(
///     ConfigureOptions::new()
///         .module("module-2", json!({"myopt": "myvalue"}))
///         .on_configure(|_orch| println!("configured"))
///         .on_error(|_orch, err| eprintln!("failed: {err}")),
/// )
/// .unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ConfigureOptions {
    pub(crate) onerror: Option<ErrorHook>,
    pub(crate) onconfigure: Option<ConfigureHook>,
    pub(crate) modules: HashMap<String, ModuleOptions>,
}

impl ConfigureOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the options record of module `name`.
    pub fn module(mut self, name: impl Into<String>, options: impl Into<ModuleOptions>) -> Self {
        self.modules.insert(name.into(), options.into());
        self
    }

    /// Sets the hook called with the error when the pass fails.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Orchestrator, &OrchestratorError) + Send + Sync + 'static,
    {
        self.onerror = Some(Arc::new(f));
        self
    }

    /// Sets the hook called when the pass completes.
    pub fn on_configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&Orchestrator) + Send + Sync + 'static,
    {
        self.onconfigure = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ConfigureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureOptions")
            .field("onerror", &self.onerror.is_some())
            .field("onconfigure", &self.onconfigure.is_some())
            .field("modules", &self.modules)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_record_is_empty_object() {
        let opts = ModuleOptions::default();
        assert_eq!(opts.as_value(), &json!({}));
        assert!(opts.get("missing").is_none());
    }

    #[test]
    fn module_records_are_keyed_by_name() {
        let opts = ConfigureOptions::new()
            .module("a", json!({"x": 1}))
            .module("a", json!({"x": 2}));
        assert_eq!(opts.modules.len(), 1);
        assert_eq!(opts.modules["a"].get("x"), Some(&json!(2)));
        assert!(opts.onerror.is_none());
    }
}
