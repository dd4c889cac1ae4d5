use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::*;
use crate::compiler::{ArtifactStore, ReloadEvent};
use crate::logger::Console;

fn config(root: &Path) -> ProjectConfig {
    let mut config = ProjectConfig::default().with_root(root);
    config.watch.debounce_ms = 100;
    config.watch.retry_ms = 100;
    config
}

fn project(root: &Path) -> Project {
    let config = config(root);
    fs::create_dir_all(config.script_root()).unwrap();
    Project::from_config(&config)
}

fn coordinator(root: &Path) -> Coordinator {
    let config = config(root);
    let compiler = ScriptCompiler::new(ArtifactStore::new(root.join("obj")), Console::new());
    Coordinator::with_config(&config, compiler)
}

async fn wait_for_event(
    rx: &crossbeam::channel::Receiver<ReloadEvent>,
    limit: Duration,
    pred: impl Fn(&ReloadEvent) -> bool,
) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if rx.try_iter().any(|e| pred(&e)) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_triggers_reload() {
    let dir = TempDir::new().unwrap();
    let project = project(dir.path());
    let script = project.script_root().join("Player.nes");
    fs::write(&script, "component Player { hp: int = 3; }").unwrap();

    let handle = coordinator(dir.path()).start();
    let events = handle.compiler().lock().events().subscribe();
    handle.set_project(Some(project)).await.unwrap();
    assert_eq!(handle.flush().await.unwrap().compiles, 1);

    fs::write(&script, "component Player { hp: int = 3; mana: int; }").unwrap();
    let reloaded = wait_for_event(&events, Duration::from_secs(5), |e| {
        matches!(e, ReloadEvent::CompileSucceeded(_))
    })
    .await;
    assert!(reloaded);
    assert_eq!(handle.flush().await.unwrap().compiles, 2);

    handle.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_switching_project_drops_old_watcher() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    let a = project(dir_a.path());
    let b = project(dir_b.path());
    fs::write(a.script_root().join("A.nes"), "component A { x: int; }").unwrap();
    fs::write(b.script_root().join("B.nes"), "component B { y: int; }").unwrap();
    let old_script = a.script_root().join("A.nes");

    let handle = coordinator(dir_a.path()).start();
    handle.set_project(Some(a)).await.unwrap();
    handle.set_project(Some(b)).await.unwrap();
    let before = handle.flush().await.unwrap();
    assert_eq!(before.compiles, 2);
    assert!(handle.compiler().lock().type_handle("B").is_some());

    fs::write(&old_script, "component A { x: int; z: int; }").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(handle.flush().await.unwrap(), before);

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_signal_stops_run() {
    let dir = TempDir::new().unwrap();
    let project = project(dir.path());
    let (tx, rx) = crossbeam::channel::bounded(1);

    let run = tokio::spawn(coordinator(dir.path()).with_shutdown_signal(rx).run(project));
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), run).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}
