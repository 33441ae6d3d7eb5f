//! # Deferred module configuration
//!
//! A module whose configuration finishes later, on a tokio task. The
//! configuration pass blocks until the completion handle is resolved, so it
//! runs on a blocking thread.
//!
//! Run with: `cargo run --example deferred_module`

use std::sync::Arc;
use std::time::Duration;

use modvisor::{ModuleSpec, Orchestrator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modvisor=debug".into()),
        )
        .init();

    let orch = Arc::new(Orchestrator::new());

    orch.install(ModuleSpec::new("cache").with_configure(|next, _, _| {
        let completion = next.defer();
        tokio::runtime::Handle::current().spawn(async move {
            println!("⏳ cache: warming up");
            tokio::time::sleep(Duration::from_millis(500)).await;
            println!("🔥 cache: warm");
            completion.complete();
        });
        Ok(())
    }))?;

    orch.install(
        ModuleSpec::new("api")
            .require("cache")
            .with_setup(|_, _| {
                println!("🚀 api: started after cache");
                Ok(())
            }),
    )?;

    orch.ready(|| println!("✅ ready"));

    let runner = Arc::clone(&orch);
    tokio::task::spawn_blocking(move || runner.init()).await??;
    Ok(())
}
