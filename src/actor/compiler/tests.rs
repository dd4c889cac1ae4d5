use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

use super::CompilerActor;
use crate::actor::messages::CompilerMsg;
use crate::actor::project::Project;
use crate::compiler::{ArtifactStore, CompileStats, ReloadEvent, ScriptCompiler};
use crate::logger::{Console, LogLevel};
use crate::watch::{ChangeBatch, ChangeKind};

fn setup(dir: &TempDir) -> (Project, Arc<Mutex<ScriptCompiler>>) {
    let assets = dir.path().join("assets");
    fs::create_dir_all(&assets).unwrap();
    let store = ArtifactStore::new(dir.path().join("obj"));
    let compiler = ScriptCompiler::new(store, Console::new());
    (
        Project::new(dir.path(), assets, "nes"),
        Arc::new(Mutex::new(compiler)),
    )
}

fn changed(path: PathBuf) -> CompilerMsg {
    CompilerMsg::ScriptsChanged(ChangeBatch(vec![(path, ChangeKind::Modified)]))
}

async fn flush(tx: &mpsc::Sender<CompilerMsg>) -> CompileStats {
    let (reply, rx) = oneshot::channel();
    tx.send(CompilerMsg::Flush(reply)).await.unwrap();
    rx.await.unwrap()
}

#[tokio::test]
async fn test_set_project_compiles() {
    let dir = TempDir::new().unwrap();
    let (project, compiler) = setup(&dir);
    fs::write(project.script_root().join("Player.nes"), "component Player { hp: int = 3; }").unwrap();

    let (tx, rx) = mpsc::channel(32);
    let actor = CompilerActor::new(rx, Arc::clone(&compiler));
    let handle = tokio::spawn(actor.run());

    tx.send(CompilerMsg::SetProject(Some(project))).await.unwrap();
    let stats = flush(&tx).await;
    assert_eq!(stats.compiles, 1);
    assert!(compiler.lock().current_unit().is_some());

    tx.send(CompilerMsg::Shutdown).await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_changes_during_compile_are_coalesced() {
    let dir = TempDir::new().unwrap();
    let (project, compiler) = setup(&dir);
    let script = project.script_root().join("Player.nes");
    fs::write(&script, "component Player { hp: int = 3; }").unwrap();
    let events = compiler.lock().events().subscribe();

    // Everything is queued before the actor runs, so the three changes all
    // arrive while the first compile is in flight.
    let (tx, rx) = mpsc::channel(32);
    tx.send(CompilerMsg::SetProject(Some(project))).await.unwrap();
    for _ in 0..3 {
        tx.send(changed(script.clone())).await.unwrap();
    }
    let (reply, stats_rx) = oneshot::channel();
    tx.send(CompilerMsg::Flush(reply)).await.unwrap();

    let handle = tokio::spawn(CompilerActor::new(rx, Arc::clone(&compiler)).run());
    let stats = stats_rx.await.unwrap();
    assert_eq!(stats.compiles + stats.cache_hits, 2);
    assert_eq!(stats.compiles, 1);

    let scripts_changed = events
        .try_iter()
        .filter(|e| matches!(e, ReloadEvent::ScriptsChanged))
        .count();
    assert_eq!(scripts_changed, 3);

    drop(tx);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_no_project_no_compile() {
    let dir = TempDir::new().unwrap();
    let (project, compiler) = setup(&dir);

    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(CompilerActor::new(rx, Arc::clone(&compiler)).run());

    tx.send(changed(project.script_root().join("Player.nes"))).await.unwrap();
    tx.send(CompilerMsg::CompileNow).await.unwrap();
    assert_eq!(flush(&tx).await, CompileStats::default());

    tx.send(CompilerMsg::Shutdown).await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_empty_project_is_nothing_to_compile() {
    let dir = TempDir::new().unwrap();
    let (project, compiler) = setup(&dir);

    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(CompilerActor::new(rx, Arc::clone(&compiler)).run());

    tx.send(CompilerMsg::SetProject(Some(project))).await.unwrap();
    assert_eq!(flush(&tx).await, CompileStats::default());
    assert!(compiler.lock().console().contains(LogLevel::Info, "nothing to compile"));

    tx.send(CompilerMsg::Shutdown).await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_closing_project_unloads() {
    let dir = TempDir::new().unwrap();
    let (project, compiler) = setup(&dir);
    fs::write(project.script_root().join("Player.nes"), "component Player { hp: int; }").unwrap();

    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(CompilerActor::new(rx, Arc::clone(&compiler)).run());

    tx.send(CompilerMsg::SetProject(Some(project))).await.unwrap();
    flush(&tx).await;
    tx.send(CompilerMsg::SetProject(None)).await.unwrap();
    flush(&tx).await;
    assert!(compiler.lock().current_unit().is_none());

    // No project: further changes are ignored.
    tx.send(CompilerMsg::CompileNow).await.unwrap();
    assert_eq!(flush(&tx).await.compiles, 1);

    tx.send(CompilerMsg::Shutdown).await.unwrap();
    handle.await.unwrap();
}
