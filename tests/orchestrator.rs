use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use modvisor::{
    Config, ConfigureOptions, EventStore, ModuleError, ModuleSpec, ModuleState, Orchestrator,
    OrchestratorError,
};
use parking_lot::Mutex;
use serde_json::json;

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn recording(name: &'static str, log: &Journal) -> ModuleSpec {
    let log = Arc::clone(log);
    ModuleSpec::new(name).with_setup(move |_, _| {
        log.lock().push(name.to_string());
        Ok(())
    })
}

fn failing(name: &'static str, log: &Journal) -> ModuleSpec {
    let log = Arc::clone(log);
    ModuleSpec::new(name).with_setup(move |_, _| {
        log.lock().push(name.to_string());
        Err(ModuleError::msg("failing module"))
    })
}

fn bare() -> Orchestrator {
    Orchestrator::with_config(Config {
        event_module: false,
        ..Config::default()
    })
}

#[test]
fn repeated_install_replaces_instead_of_duplicating() {
    let orch = Orchestrator::new();
    let log = journal();
    for _ in 0..3 {
        orch.install(recording("x", &log)).unwrap();
    }
    orch.install(recording("y", &log)).unwrap();
    orch.install(recording("x", &log)).unwrap();
    assert_eq!(orch.modules(), vec!["event", "x", "y"]);
}

#[test]
fn validation_messages() {
    let orch = bare();
    let err = orch.install(ModuleSpec::default()).unwrap_err();
    assert!(matches!(err, OrchestratorError::MissingName));
    assert_eq!(err.to_string(), "Module name is missing");
    assert_eq!(orch.uninstall("").unwrap_err().to_string(), "Module name is missing");

    let err = orch.install(ModuleSpec::new("x").require("y")).unwrap_err();
    assert_eq!(err.to_string(), "Error loading module 'x': missing modules: y");
    assert_eq!(err.module(), Some("x"));
}

#[test]
fn second_pass_invokes_nothing() {
    let orch = bare();
    let log = journal();
    orch.install(recording("a", &log)).unwrap();
    orch.install(recording("b", &log)).unwrap();
    orch.init().unwrap();
    orch.init().unwrap();
    orch.configure(ConfigureOptions::new()).unwrap();
    assert_eq!(*log.lock(), vec!["a", "b"]);
}

#[test]
fn pass_resumes_after_failing_module_is_removed() {
    let orch = bare();
    let log = journal();
    orch.install(recording("m1", &log)).unwrap();
    orch.install(failing("failing", &log)).unwrap();
    orch.install(recording("m2", &log)).unwrap();

    let err = orch.init().unwrap_err();
    assert_eq!(err.to_string(), "failing module");
    assert_eq!(err.module(), Some("failing"));
    assert_eq!(*log.lock(), vec!["m1", "failing"]);
    assert_eq!(orch.state("m2"), Some(ModuleState::Uninitialized));
    assert!(!orch.is_configured());

    orch.uninstall("failing").unwrap();
    orch.init().unwrap();
    assert_eq!(*log.lock(), vec!["m1", "failing", "m2"]);
    assert!(orch.is_configured());
}

#[test]
fn failed_module_is_retried_by_next_pass() {
    let orch = bare();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    orch.install(ModuleSpec::new("flaky").with_setup(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ModuleError::msg("first attempt"))
        } else {
            Ok(())
        }
    }))
    .unwrap();

    assert!(orch.init().is_err());
    assert_eq!(orch.state("flaky"), Some(ModuleState::Failed));
    orch.init().unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(orch.state("flaky"), Some(ModuleState::Ready));
}

#[test]
fn replaced_module_before_cursor_runs_on_resume() {
    let orch = bare();
    let log = journal();
    orch.install(recording("a", &log)).unwrap();
    orch.install(failing("b", &log)).unwrap();
    assert!(orch.init().is_err());

    orch.install(recording("a", &log)).unwrap();
    orch.install(recording("b", &log)).unwrap();
    orch.init().unwrap();
    assert_eq!(*log.lock(), vec!["a", "b", "a", "b"]);
}

#[test]
fn hooks_are_invoked() {
    let orch = bare();
    let log = journal();
    orch.install(failing("bad", &log)).unwrap();

    let seen = journal();
    let on_err = Arc::clone(&seen);
    let result = orch.configure(ConfigureOptions::new().on_error(move |_, err| {
        on_err.lock().push(format!("error:{err}"));
    }));
    assert!(result.is_err());

    orch.uninstall("bad").unwrap();
    let on_done = Arc::clone(&seen);
    orch.configure(ConfigureOptions::new().on_configure(move |orch| {
        on_done.lock().push(format!("configured:{}", orch.is_configured()));
    }))
    .unwrap();

    assert_eq!(*seen.lock(), vec!["error:failing module", "configured:true"]);
}

#[test]
fn options_are_delivered_per_module() {
    #[derive(serde::Deserialize)]
    struct Opts {
        myopt: String,
    }

    let orch = bare();
    let got = journal();
    let sink = Arc::clone(&got);
    orch.install(ModuleSpec::new("module-2").with_setup(move |_, opts| {
        let opts: Opts = opts.parse().map_err(|e| ModuleError::msg(e.to_string()))?;
        sink.lock().push(opts.myopt);
        Ok(())
    }))
    .unwrap();
    orch.configure(ConfigureOptions::new().module("module-2", json!({"myopt": "myvalue"})))
        .unwrap();
    assert_eq!(*got.lock(), vec!["myvalue"]);
}

#[test]
fn ready_before_and_after_completion() {
    let orch = bare();
    let hits = Arc::new(AtomicUsize::new(0));

    let early = Arc::clone(&hits);
    orch.ready(move || {
        early.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    orch.init().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let late = Arc::clone(&hits);
    orch.ready(move || {
        late.fetch_add(10, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 11);

    orch.init().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 11);
}

#[test]
fn deferred_completion_from_a_thread() {
    let orch = bare();
    let log = journal();
    orch.install(ModuleSpec::new("slow").with_configure(|next, _, _| {
        let completion = next.defer();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            completion.complete();
        });
        Ok(())
    }))
    .unwrap();
    orch.install(recording("after", &log)).unwrap();

    orch.init().unwrap();
    assert_eq!(orch.state("slow"), Some(ModuleState::Ready));
    assert_eq!(*log.lock(), vec!["after"]);
}

#[test]
fn deferred_failure_and_abandonment() {
    let orch = bare();
    orch.install(ModuleSpec::new("late").with_configure(|next, _, _| {
        let completion = next.defer();
        thread::spawn(move || completion.fail(ModuleError::msg("late failure")));
        Ok(())
    }))
    .unwrap();
    assert_eq!(orch.init().unwrap_err().to_string(), "late failure");

    orch.uninstall("late").unwrap();
    orch.install(ModuleSpec::new("dropped").with_configure(|next, _, _| {
        drop(next.defer());
        Ok(())
    }))
    .unwrap();
    let err = orch.init().unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Configure {
            error: ModuleError::Abandoned,
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deferred_completion_from_async_task() {
    let orch = Arc::new(bare());
    orch.install(ModuleSpec::new("async").with_configure(|next, _, _| {
        let completion = next.defer();
        tokio::runtime::Handle::current().spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            completion.complete();
        });
        Ok(())
    }))
    .unwrap();

    let runner = Arc::clone(&orch);
    tokio::task::spawn_blocking(move || runner.init())
        .await
        .unwrap()
        .unwrap();
    assert!(orch.is_configured());
}

#[test]
fn panicking_module_is_resumable() {
    let orch = bare();
    let log = journal();
    orch.install(ModuleSpec::new("boom").with_setup(|_, _| panic!("exploded")))
        .unwrap();
    orch.install(recording("next", &log)).unwrap();

    let err = orch.init().unwrap_err();
    assert_eq!(err.to_string(), "configuration panicked: exploded");
    assert!(log.lock().is_empty());

    orch.uninstall("boom").unwrap();
    orch.init().unwrap();
    assert_eq!(*log.lock(), vec!["next"]);
}

#[test]
fn install_after_configuration_runs_immediately() {
    let orch = bare();
    orch.init().unwrap();
    let log = journal();
    orch.install(recording("late", &log)).unwrap();
    assert_eq!(*log.lock(), vec!["late"]);
    assert_eq!(orch.state("late"), Some(ModuleState::Ready));
}

#[test]
fn modules_installed_during_a_pass_are_configured_by_it() {
    let orch = bare();
    let log = journal();
    let inner_log = Arc::clone(&log);
    orch.install(ModuleSpec::new("loader").with_setup(move |orch, _| {
        orch.install(recording("plugin", &inner_log))
            .map_err(|e| ModuleError::msg(e.to_string()))
    }))
    .unwrap();
    orch.init().unwrap();
    assert_eq!(orch.modules(), vec!["loader", "plugin"]);
    assert_eq!(*log.lock(), vec!["plugin"]);
}

#[test]
fn exports_and_builtin_event_module() {
    struct Router {
        prefix: &'static str,
    }

    let orch = Orchestrator::new();
    orch.install(ModuleSpec::new("router").with_export("router", Router { prefix: "/api" }))
        .unwrap();
    orch.install(
        ModuleSpec::new("app")
            .require("router")
            .require("event")
            .with_setup(|orch, _| {
                let router = orch
                    .export::<Router>("router", "router")
                    .ok_or_else(|| ModuleError::msg("router not exported"))?;
                let store = orch
                    .export::<EventStore>("event", "store")
                    .ok_or_else(|| ModuleError::msg("store not exported"))?;
                store
                    .get("app/mounted")
                    .fire(Some(json!(router.prefix)))
                    .map_err(|e| ModuleError::msg(e.to_string()))
            }),
    )
    .unwrap();

    let mounted = journal();
    let sink = Arc::clone(&mounted);
    orch.events().get("app/mounted").listen(modvisor::ListenerFn::arc(
        "mounted",
        move |_, data| {
            sink.lock().push(data.and_then(|v| v.as_str()).unwrap_or_default().to_string());
        },
    ));

    orch.init().unwrap();
    assert_eq!(*mounted.lock(), vec!["/api"]);
    assert!(orch.exports("router").unwrap().contains("router"));
    assert!(orch.exports("missing").is_none());
    assert!(orch.export::<u32>("router", "router").is_none());
}

#[test]
fn uninstall_removes_exports() {
    let orch = bare();
    orch.install(ModuleSpec::new("cfg").with_export("answer", 42u32))
        .unwrap();
    assert_eq!(orch.export::<u32>("cfg", "answer").as_deref(), Some(&42));
    orch.uninstall("cfg").unwrap();
    assert!(orch.export::<u32>("cfg", "answer").is_none());
    assert!(!orch.is_installed("cfg"));
}

#[test]
fn default_instance_is_shared() {
    let a = modvisor::default_instance();
    let b = modvisor::default_instance();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.modules().contains(&"event".to_string()));
}
