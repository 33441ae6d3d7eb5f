//! # Module registry: ordered entries, lifecycle flags and the pass cursor.
//!
//! ## Rules
//! - Insertion order is the configuration order and the order of [`ModuleRegistry::names`].
//! - Re-installing a name replaces the entry **in place**, resets it to
//!   [`ModuleState::Uninitialized`] and gives it a new generation.
//! - The cursor is the first position the next pass inspects:
//!   ```text
//!   [ m1:Ready | failing:Failed | m2:Uninitialized ]
//!                  ▲ cursor
//!   uninstall(failing)  → [ m1:Ready | m2:Uninitialized ]   cursor still 1 → m2
//!   replace(m1) pre-pass → [ m1':Uninitialized | ... ]      cursor pulled back to 0
//!   ```
//! - A step is settled only if its entry still has the generation it started with;
//!   a module replaced or removed during its own step leaves the newcomer untouched.
//!
//! The registry is plain data: the orchestrator guards it with its lock and never
//! holds that lock while a step runs.

use crate::modules::{ModuleOptions, ModuleRef, ModuleSpec};

/// Lifecycle flag of an installed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Installed, configuration step not run yet.
    Uninitialized,
    /// Configuration step running (or waiting on a deferred completion).
    Initializing,
    /// Configuration step succeeded.
    Ready,
    /// Configuration step failed; retried by the next pass.
    Failed,
}

impl ModuleState {
    /// Whether a pass should run this module.
    #[inline]
    fn is_pending(self) -> bool {
        matches!(self, ModuleState::Uninitialized | ModuleState::Failed)
    }
}

struct Entry {
    spec: ModuleSpec,
    state: ModuleState,
    generation: u64,
}

/// One configuration step taken out of the registry.
pub(crate) struct Step {
    pub(crate) name: String,
    pub(crate) module: Option<ModuleRef>,
    pub(crate) options: ModuleOptions,
    generation: u64,
}

/// Ordered module entries plus the pass cursor.
#[derive(Default)]
pub(crate) struct ModuleRegistry {
    entries: Vec<Entry>,
    cursor: usize,
    generation: u64,
}

impl ModuleRegistry {
    /// Installed names, in insertion order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.spec.name().to_string()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.spec.name() == name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub(crate) fn spec(&self, name: &str) -> Option<&ModuleSpec> {
        self.position(name).map(|i| &self.entries[i].spec)
    }

    pub(crate) fn state(&self, name: &str) -> Option<ModuleState> {
        self.position(name).map(|i| self.entries[i].state)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Required names that are not installed, in declared order, without repeats.
    pub(crate) fn missing(&self, required: &[String]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in required {
            if !self.contains(name) && !missing.contains(name) {
                missing.push(name.clone());
            }
        }
        missing
    }

    /// Stores `spec`. Returns true if it replaced an entry of the same name.
    pub(crate) fn insert(&mut self, spec: ModuleSpec) -> bool {
        self.generation += 1;
        let entry = Entry {
            spec,
            state: ModuleState::Uninitialized,
            generation: self.generation,
        };
        match self.position(entry.spec.name()) {
            Some(index) => {
                self.entries[index] = entry;
                self.cursor = self.cursor.min(index);
                true
            }
            None => {
                self.entries.push(entry);
                false
            }
        }
    }

    /// Removes `name`. Returns true if it was installed.
    pub(crate) fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                if index < self.cursor {
                    self.cursor -= 1;
                }
                true
            }
            None => false,
        }
    }

    /// Takes the first pending module at or after the cursor, moving the cursor onto it.
    pub(crate) fn next_pending(&mut self, options: impl Fn(&str) -> ModuleOptions) -> Option<Step> {
        let index = (self.cursor..self.entries.len()).find(|&i| self.entries[i].state.is_pending())?;
        self.cursor = index;
        Some(self.start(index, options))
    }

    /// Takes module `name` regardless of the cursor (install after the first pass).
    pub(crate) fn begin(&mut self, name: &str, options: impl Fn(&str) -> ModuleOptions) -> Option<Step> {
        let index = self.position(name)?;
        Some(self.start(index, options))
    }

    fn start(&mut self, index: usize, options: impl Fn(&str) -> ModuleOptions) -> Step {
        let entry = &mut self.entries[index];
        entry.state = ModuleState::Initializing;
        Step {
            name: entry.spec.name().to_string(),
            module: entry.spec.module().cloned(),
            options: options(entry.spec.name()),
            generation: entry.generation,
        }
    }

    /// Records the outcome of `step`.
    ///
    /// With `advance`, a success moves the cursor past the module and a failure
    /// leaves it on the module. Returns false if the entry was replaced or
    /// removed meanwhile.
    pub(crate) fn settle(&mut self, step: &Step, ok: bool, advance: bool) -> bool {
        let Some(index) = self
            .entries
            .iter()
            .position(|e| e.spec.name() == step.name && e.generation == step.generation)
        else {
            return false;
        };
        self.entries[index].state = if ok {
            ModuleState::Ready
        } else {
            ModuleState::Failed
        };
        if advance {
            self.cursor = if ok { index + 1 } else { index };
        }
        true
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.cursor
    }
}
