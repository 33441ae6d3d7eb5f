//! Error types used by the orchestrator, the event bus and modules.
//!
//! This module defines three error enums:
//!
//! - [`OrchestratorError`]: errors raised by module installation and the configuration pass.
//! - [`EventError`]: errors raised by the event store and by individual events.
//! - [`ModuleError`]: errors raised by a module's own configuration step.
//!
//! All of them provide `as_label` for logging. Message texts are stable: callers
//! and test suites are allowed to match on them.

use thiserror::Error;

/// # Errors produced by the orchestrator.
///
/// Validation and dependency errors never change registry state. A
/// [`OrchestratorError::Configure`] error leaves the pass cursor frozen on the
/// failing module so that the next pass resumes there.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// `install`/`uninstall` called without a module name.
    #[error("Module name is missing")]
    MissingName,

    /// `install` referenced modules that are not installed yet.
    #[error("Error loading module '{module}': missing modules: {}", .missing.join(","))]
    MissingDependencies {
        /// Name of the module being installed.
        module: String,
        /// Missing module names, in declared order.
        missing: Vec<String>,
    },

    /// A module's configuration step failed.
    ///
    /// Displays the module's own error message unchanged.
    #[error("{error}")]
    Configure {
        /// Name of the failing module.
        module: String,
        /// The module's failure.
        #[source]
        error: ModuleError,
    },
}

impl OrchestratorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::OrchestratorError;
    ///
    /// assert_eq!(OrchestratorError::MissingName.as_label(), "module_name_missing");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestratorError::MissingName => "module_name_missing",
            OrchestratorError::MissingDependencies { .. } => "module_missing_dependencies",
            OrchestratorError::Configure { .. } => "module_configure_failed",
        }
    }

    /// Returns the name of the module the error is about, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            OrchestratorError::MissingName => None,
            OrchestratorError::MissingDependencies { module, .. }
            | OrchestratorError::Configure { module, .. } => Some(module),
        }
    }
}

/// # Errors produced by events and the event store.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// An event with the same id already exists in the store.
    #[error("Duplicate event: {id}")]
    Duplicate {
        /// The conflicting id.
        id: String,
    },

    /// A stateful event was fired again without an intervening `reset()`.
    #[error(
        "fire() cannot be called again on a stateful event. If needed, reset() must be called before or stateful flag must be removed."
    )]
    AlreadyFired {
        /// Id of the stateful event.
        id: String,
    },

    /// `fire` received more than one argument.
    #[error("fire() only accept at most one argument")]
    Arity {
        /// Number of arguments received.
        count: usize,
    },
}

impl EventError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::EventError;
    ///
    /// let err = EventError::Arity { count: 2 };
    /// assert_eq!(err.as_label(), "event_arity");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::Duplicate { .. } => "event_duplicate",
            EventError::AlreadyFired { .. } => "event_already_fired",
            EventError::Arity { .. } => "event_arity",
        }
    }
}

/// # Errors produced by a module's configuration step.
///
/// Returned from [`Module::configure`](crate::Module::configure), passed to
/// [`Completion::fail`](crate::Completion::fail), or synthesized by the
/// orchestrator when a step panics or abandons its completion handle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ModuleError {
    /// The module reported a failure.
    #[error("{message}")]
    Failed {
        /// The module's message.
        message: String,
    },

    /// A deferred completion was dropped without being resolved.
    #[error("configuration abandoned before completion")]
    Abandoned,

    /// The configuration step panicked.
    #[error("configuration panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl ModuleError {
    /// Builds a [`ModuleError::Failed`] from any message.
    ///
    /// # Example
    /// ```
    /// use modvisor::ModuleError;
    ///
    /// let err = ModuleError::msg("exception");
    /// assert_eq!(err.to_string(), "exception");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        ModuleError::Failed {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ModuleError::Failed { .. } => "module_failed",
            ModuleError::Abandoned => "module_abandoned",
            ModuleError::Panicked { .. } => "module_panicked",
        }
    }
}
