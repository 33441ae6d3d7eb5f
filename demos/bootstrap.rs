//! # Application bootstrap
//!
//! Demonstrates basic modvisor features:
//! - Modules with dependencies and exports
//! - Per-module options
//! - A failing module halting the pass, then resuming after the fix
//! - The ready notification
//!
//! Run with: `cargo run --example bootstrap`

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use modvisor::{ConfigureOptions, EventStore, ModuleError, ModuleSpec, Orchestrator};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct DbOptions {
    url: String,
}

struct Database {
    online: AtomicBool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modvisor=debug".into()),
        )
        .init();

    let orch = Orchestrator::new();
    let db = Arc::new(Database {
        online: AtomicBool::new(false),
    });

    let handle = Arc::clone(&db);
    orch.install(
        ModuleSpec::new("db")
            .with_export("db", Arc::clone(&db))
            .with_setup(move |_, opts| {
                let opts: DbOptions = opts.parse().map_err(|e| ModuleError::msg(e.to_string()))?;
                if !handle.online.load(Ordering::SeqCst) {
                    return Err(ModuleError::msg(format!("database at {} is offline", opts.url)));
                }
                println!("🗄️  db: connected to {}", opts.url);
                Ok(())
            }),
    )?;

    orch.install(
        ModuleSpec::new("http")
            .requires(["db", "event"])
            .with_setup(|orch, _| {
                let store = orch
                    .export::<EventStore>("event", "store")
                    .ok_or_else(|| ModuleError::msg("event store not exported"))?;
                store
                    .get("http/listening")
                    .fire(Some(json!({"port": 8080})))
                    .map_err(|e| ModuleError::msg(e.to_string()))?;
                println!("🌐 http: listening");
                Ok(())
            }),
    )?;

    orch.ready(|| println!("✅ all modules configured"));

    let options = ConfigureOptions::new()
        .module("db", json!({"url": "postgres://localhost/app"}))
        .on_error(|_, err| println!("❌ pass halted at {:?}: {err}", err.module()));

    if orch.configure(options.clone()).is_err() {
        println!("🔧 bringing the database online and resuming");
        db.online.store(true, Ordering::SeqCst);
        orch.configure(options)?;
    }

    println!("modules: {:?}", orch.modules());
    Ok(())
}
