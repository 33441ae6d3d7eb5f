//! # Orchestrator: module registry plus the resumable configuration pass.
//!
//! The [`Orchestrator`] owns:
//! - the ordered [`ModuleRegistry`] with its lifecycle flags and pass cursor,
//! - the options records stored by `configure`,
//! - an [`EventStore`] and the stateful **ready** event.
//!
//! ## Architecture
//! ```text
//! install(spec) ──► missing deps? ──► Err(MissingDependencies)
//!                        │
//!                        ▼
//!                   registry.insert ──► configured? ──► run step now
//!
//! configure(opts) ──► running or configured? ──► no-op
//!        │
//!        ▼
//!   loop: registry.next_pending()  (from cursor)
//!            │
//!            ├─ run step (lock released, panics caught, deferred completion awaited)
//!            │     ├─ Ok  ─► Ready, cursor past module
//!            │     └─ Err ─► Failed, cursor frozen ─► onerror ─► Err
//!            └─ none left ─► configured = true ─► onconfigure ─► ready.fire()
//! ```
//!
//! ## Rules
//! - The state lock is never held while a module's configuration step runs, so a
//!   step may call back into the orchestrator (install, export lookups, events).
//! - A `configure` call made while a pass is running, or after the first pass
//!   completed, does nothing.
//! - After the first pass, `install` configures the new module immediately; a
//!   failure marks it `Failed` and is returned, `configured` stays true.
//! - The outcome of a step whose module was replaced or removed while it ran is
//!   dropped: it neither fails the pass nor marks the newcomer.
//! - `ready(f)` runs `f` once: right away if the ready event already fired,
//!   otherwise when it fires.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::builder::OrchestratorBuilder;
use super::config::{Config, EVENT_MODULE, EVENT_STORE_EXPORT};
use super::registry::{ModuleRegistry, ModuleState, Step};
use crate::error::{ModuleError, OrchestratorError};
use crate::events::{Event, EventSpec, EventStore, ListenerFn};
use crate::modules::{ConfigureOptions, Exports, ModuleOptions, ModuleSpec, Next};

#[derive(Default)]
struct State {
    registry: ModuleRegistry,
    options: HashMap<String, ModuleOptions>,
    configured: bool,
    running: bool,
}

impl State {
    fn options_for(&self, name: &str) -> ModuleOptions {
        self.options.get(name).cloned().unwrap_or_default()
    }
}

/// Module registry with a resumable, ordered configuration pass.
///
/// Construct with [`Orchestrator::new`] or [`Orchestrator::builder`]; the
/// process-wide instance is available through
/// [`default_instance`](crate::default_instance).
pub struct Orchestrator {
    cfg: Config,
    events: EventStore,
    ready: Event,
    state: Mutex<State>,
}

impl Orchestrator {
    /// Creates an orchestrator with [`Config::default`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an orchestrator with a custom config and a fresh event store.
    pub fn with_config(cfg: Config) -> Self {
        let events = EventStore::with_id_prefix(cfg.id_prefix.clone());
        Self::new_internal(cfg, events)
    }

    /// Returns a builder for custom construction (shared store, bridge).
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, events: EventStore) -> Self {
        let ready = events.get_with(
            &cfg.ready_event,
            EventSpec::new().id(cfg.ready_event.clone()).stateful(true),
        );
        let mut state = State::default();
        if cfg.event_module {
            state.registry.insert(
                ModuleSpec::new(EVENT_MODULE).with_export(EVENT_STORE_EXPORT, events.clone()),
            );
        }
        Self {
            cfg,
            events,
            ready,
            state: Mutex::new(state),
        }
    }

    /// Configuration this orchestrator was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event store owned by this orchestrator.
    pub fn events(&self) -> &EventStore {
        &self.events
    }

    /// The stateful ready event.
    pub fn ready_event(&self) -> &Event {
        &self.ready
    }

    /// Registers a module.
    ///
    /// Every required module must already be installed. Re-installing a name
    /// replaces the previous spec in place and resets it to
    /// [`ModuleState::Uninitialized`]. Once the first pass has completed, the
    /// module is configured before this call returns.
    ///
    /// # Errors
    /// - [`OrchestratorError::MissingName`] if the name is empty;
    /// - [`OrchestratorError::MissingDependencies`] listing every missing module;
    /// - [`OrchestratorError::Configure`] if the immediate configuration failed.
    pub fn install(&self, spec: ModuleSpec) -> Result<(), OrchestratorError> {
        if spec.name().is_empty() {
            return Err(OrchestratorError::MissingName);
        }
        let name = spec.name().to_string();

        let step = {
            let mut state = self.state.lock();
            let missing = state.registry.missing(spec.required());
            if !missing.is_empty() {
                warn!(module = %name, missing = ?missing, "install rejected: missing modules");
                return Err(OrchestratorError::MissingDependencies {
                    module: name,
                    missing,
                });
            }
            let replaced = state.registry.insert(spec);
            debug!(module = %name, replaced, "module installed");

            if state.configured {
                let State {
                    registry, options, ..
                } = &mut *state;
                registry.begin(&name, |n| options.get(n).cloned().unwrap_or_default())
            } else {
                None
            }
        };

        match step {
            Some(step) => self.run_step(step, false),
            None => Ok(()),
        }
    }

    /// Unregisters a module. Unknown names are ignored.
    ///
    /// Modules depending on it are not affected.
    ///
    /// # Errors
    /// [`OrchestratorError::MissingName`] if the name is empty.
    pub fn uninstall(&self, name: &str) -> Result<(), OrchestratorError> {
        if name.is_empty() {
            return Err(OrchestratorError::MissingName);
        }
        if self.state.lock().registry.remove(name) {
            debug!(module = %name, "module uninstalled");
        }
        Ok(())
    }

    /// Installed module names, in installation order.
    pub fn modules(&self) -> Vec<String> {
        self.state.lock().registry.names()
    }

    /// Returns true if module `name` is installed.
    pub fn is_installed(&self, name: &str) -> bool {
        self.state.lock().registry.contains(name)
    }

    /// Lifecycle flag of module `name`.
    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.state.lock().registry.state(name)
    }

    /// Exports of module `name`.
    pub fn exports(&self, name: &str) -> Option<Exports> {
        self.state
            .lock()
            .registry
            .spec(name)
            .map(|spec| spec.exports().clone())
    }

    /// Capability `capability` exported by module `module`, typed as `T`.
    ///
    /// # Example
    /// ```
    /// use modvisor::{EventStore, Orchestrator};
    ///
    /// let orch = Orchestrator::new();
    /// let store = orch.export::<EventStore>("event", "store").unwrap();
    /// assert!(store.has("orchestrator/ready"));
    /// ```
    pub fn export<T: Any + Send + Sync>(&self, module: &str, capability: &str) -> Option<Arc<T>> {
        self.state
            .lock()
            .registry
            .spec(module)
            .and_then(|spec| spec.exports().get::<T>(capability))
    }

    /// Options record stored for module `name` (empty object if none).
    pub fn options(&self, name: &str) -> ModuleOptions {
        self.state.lock().options_for(name)
    }

    /// Returns true once the first pass has completed.
    pub fn is_configured(&self) -> bool {
        self.state.lock().configured
    }

    /// Runs the configuration pass.
    ///
    /// Stores the options records, then configures every pending module from
    /// the cursor onwards, in installation order, one at a time. On failure the
    /// cursor stays on the failing module, `onerror` is called and the error is
    /// returned; a later call resumes from there. On success `onconfigure` is
    /// called and the ready event fires.
    ///
    /// Does nothing if the first pass already completed or a pass is running.
    ///
    /// # Errors
    /// [`OrchestratorError::Configure`] carrying the failing module's error.
    pub fn configure(&self, options: ConfigureOptions) -> Result<(), OrchestratorError> {
        let ConfigureOptions {
            onerror,
            onconfigure,
            modules,
        } = options;

        {
            let mut state = self.state.lock();
            if state.configured {
                debug!("configure skipped: already configured");
                return Ok(());
            }
            if state.running {
                debug!("configure skipped: pass already running");
                return Ok(());
            }
            state.running = true;
            state.options.extend(modules);
        }

        let result = self.run_pass();

        match result {
            Ok(()) => {
                let total = {
                    let mut state = self.state.lock();
                    state.running = false;
                    state.configured = true;
                    state.registry.len()
                };
                info!(modules = total, "configuration pass completed");
                if let Some(hook) = onconfigure {
                    hook(self);
                }
                if let Err(err) = self.ready.fire(None) {
                    warn!(error = %err, label = err.as_label(), "ready event not fired");
                }
                Ok(())
            }
            Err(err) => {
                self.state.lock().running = false;
                warn!(
                    module = err.module().unwrap_or_default(),
                    error = %err,
                    label = err.as_label(),
                    "configuration pass halted"
                );
                if let Some(hook) = onerror {
                    hook(self, &err);
                }
                Err(err)
            }
        }
    }

    /// Runs the configuration pass with empty options.
    pub fn init(&self) -> Result<(), OrchestratorError> {
        self.configure(ConfigureOptions::default())
    }

    /// Runs `f` once the first pass has completed.
    ///
    /// Runs it immediately if that already happened.
    pub fn ready<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.ready.once(ListenerFn::arc("ready", move |_, _| f()));
    }

    fn run_pass(&self) -> Result<(), OrchestratorError> {
        loop {
            let step = {
                let mut state = self.state.lock();
                let State {
                    registry, options, ..
                } = &mut *state;
                registry.next_pending(|n| options.get(n).cloned().unwrap_or_default())
            };
            match step {
                Some(step) => self.run_step(step, true)?,
                None => return Ok(()),
            }
        }
    }

    /// Runs one configuration step with the state lock released and records its outcome.
    fn run_step(&self, step: Step, advance: bool) -> Result<(), OrchestratorError> {
        debug!(module = %step.name, "configuring module");
        let outcome = match &step.module {
            Some(module) => {
                let (next, pending) = Next::channel();
                let returned =
                    panic::catch_unwind(AssertUnwindSafe(|| module.configure(next, &step.options, self)))
                        .unwrap_or_else(|payload| {
                            Err(ModuleError::Panicked {
                                info: panic_info(payload.as_ref()),
                            })
                        });
                pending.settle(returned)
            }
            None => Ok(()),
        };

        let applied = self
            .state
            .lock()
            .registry
            .settle(&step, outcome.is_ok(), advance);
        if !applied {
            // The pass moves on to whatever now sits at the cursor.
            debug!(
                module = %step.name,
                ok = outcome.is_ok(),
                "module replaced or removed during its configuration, outcome dropped"
            );
            return Ok(());
        }

        match outcome {
            Ok(()) => {
                debug!(module = %step.name, "module ready");
                Ok(())
            }
            Err(error) => {
                warn!(module = %step.name, error = %error, label = error.as_label(), "module failed");
                Err(OrchestratorError::Configure {
                    module: step.name,
                    error,
                })
            }
        }
    }
}

fn panic_info(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Orchestrator")
            .field("modules", &state.registry.names())
            .field("configured", &state.configured)
            .field("running", &state.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn counting(name: &str, hits: &Arc<AtomicUsize>) -> ModuleSpec {
        let hits = Arc::clone(hits);
        ModuleSpec::new(name).with_setup(move |_, _| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn bare() -> Orchestrator {
        Orchestrator::with_config(Config {
            event_module: false,
            ..Config::default()
        })
    }

    #[test]
    fn event_module_is_installed_by_default() {
        let orch = Orchestrator::new();
        assert_eq!(orch.modules(), vec!["event"]);
        assert!(bare().modules().is_empty());
    }

    #[test]
    fn install_rejects_empty_name_and_missing_deps() {
        let orch = bare();
        let err = orch.install(ModuleSpec::new("")).unwrap_err();
        assert_eq!(err.to_string(), "Module name is missing");

        let err = orch
            .install(ModuleSpec::new("m").requires(["a", "b"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Error loading module 'm': missing modules: a,b");
        assert!(orch.modules().is_empty());
    }

    #[test]
    fn second_configure_is_a_noop() {
        let orch = bare();
        let hits = Arc::new(AtomicUsize::new(0));
        orch.install(counting("m", &hits)).unwrap();
        orch.init().unwrap();
        orch.init().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(orch.is_configured());
        assert_eq!(orch.state("m"), Some(ModuleState::Ready));
    }

    #[test]
    fn options_reach_the_module() {
        let orch = bare();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        orch.install(ModuleSpec::new("m").with_setup(move |_, opts| {
            *sink.lock() = opts.get("myopt").cloned();
            Ok(())
        }))
        .unwrap();
        orch.configure(ConfigureOptions::new().module("m", json!({"myopt": "myvalue"})))
            .unwrap();
        assert_eq!(*seen.lock(), Some(json!("myvalue")));
        assert_eq!(orch.options("m").get("myopt"), Some(&json!("myvalue")));
    }

    #[test]
    fn panicking_module_fails_the_pass() {
        let orch = bare();
        orch.install(ModuleSpec::new("boom").with_setup(|_, _| panic!("kaboom")))
            .unwrap();
        let err = orch.init().unwrap_err();
        assert_eq!(err.as_label(), "module_configure_failed");
        assert_eq!(err.to_string(), "configuration panicked: kaboom");
        assert_eq!(orch.state("boom"), Some(ModuleState::Failed));
        assert!(!orch.is_configured());
    }

    #[test]
    fn reentrant_configure_is_ignored() {
        let orch = bare();
        let inner = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&inner);
        orch.install(ModuleSpec::new("m").with_setup(move |orch, _| {
            *sink.lock() = Some(orch.init().is_ok());
            Ok(())
        }))
        .unwrap();
        orch.init().unwrap();
        assert_eq!(*inner.lock(), Some(true));
        assert!(orch.is_configured());
    }

    #[test]
    fn install_after_pass_configures_immediately() {
        let orch = bare();
        orch.init().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        orch.install(counting("late", &hits)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(orch.state("late"), Some(ModuleState::Ready));

        let err = orch
            .install(ModuleSpec::new("bad").with_setup(|_, _| Err(ModuleError::msg("nope"))))
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(orch.state("bad"), Some(ModuleState::Failed));
        assert!(orch.is_configured());
    }

    #[test]
    fn uninstall_unknown_is_ignored() {
        let orch = bare();
        assert!(orch.uninstall("ghost").is_ok());
        assert!(orch.uninstall("").is_err());
    }

    #[test]
    fn stale_failure_of_replaced_module_is_dropped() {
        let orch = bare();
        let hits = Arc::new(AtomicUsize::new(0));
        let replacement = counting("m", &hits);
        orch.install(ModuleSpec::new("m").with_setup(move |orch, _| {
            orch.install(replacement.clone())
                .map_err(|e| ModuleError::msg(e.to_string()))?;
            Err(ModuleError::msg("stale failure"))
        }))
        .unwrap();

        orch.init().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(orch.state("m"), Some(ModuleState::Ready));
        assert!(orch.is_configured());
    }
}
