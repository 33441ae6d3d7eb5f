//! # Event barrier
//!
//! Demonstrates:
//! - `EventGroup::sync` waiting for several events
//! - `sync_once` for one-time initialization
//! - Stateful events replaying to late listeners
//! - The built-in [`LogWriter`] listener
//!
//! Run with: `cargo run --example barrier --features logging`

use std::sync::Arc;

use modvisor::{EventSpec, EventStore, ListenerRef, LogWriter};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modvisor=info".into()),
        )
        .init();

    let store = EventStore::new();
    let group = store.add_all_with(
        &EventSpec::new().stateful(true),
        vec!["config".into(), "db".into(), "cache".into()],
    )?;

    let log: ListenerRef = Arc::new(LogWriter::default());
    group.listen(log);

    group.sync_once(|values| println!("🎬 first time everything is up: {values:?}"));
    group.sync(|values| println!("🔁 snapshot: {values:?}"));

    group[0].fire(Some(json!({"env": "dev"})))?;
    group[1].fire(Some(json!("postgres")))?;
    group[2].fire(Some(json!("redis")))?;

    // Stateful: a second fire needs a reset first.
    if let Err(err) = group[2].fire(Some(json!("memcached"))) {
        println!("⚠️  {err}");
    }
    group[2].reset();
    group[2].fire(Some(json!("memcached")))?;

    store.get("config").listen(modvisor::ListenerFn::arc("late", |evt, data| {
        println!("🕰️  late listener on {evt} got {data:?}");
    }));
    Ok(())
}
