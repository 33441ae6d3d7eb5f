//! Process-wide default orchestrator.
//!
//! Built lazily on first access with [`Config::default`]. Code that wants
//! isolation (tests, embedded hosts) creates its own [`Orchestrator`] instead.

use std::sync::{Arc, OnceLock};

use super::orchestrator::Orchestrator;
#[cfg(doc)]
use super::config::Config;

static DEFAULT: OnceLock<Arc<Orchestrator>> = OnceLock::new();

/// Returns the shared default orchestrator, creating it on first call.
pub fn default_instance() -> Arc<Orchestrator> {
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(Orchestrator::new())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_instance_every_time() {
        assert!(Arc::ptr_eq(&default_instance(), &default_instance()));
        assert!(default_instance().is_installed("event"));
    }
}
