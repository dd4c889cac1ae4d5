use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actor::messages::{CompilerMsg, CoordinatorMsg};
use crate::actor::project::Project;
use crate::watch::{ChangeDetector, WatchOptions};

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Coordinator loop: owns the change detector and forwards requests.
pub(super) async fn run(
    mut rx: mpsc::Receiver<CoordinatorMsg>,
    compiler_tx: mpsc::Sender<CompilerMsg>,
    compiler_handle: JoinHandle<()>,
    watch: WatchOptions,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut detector: Option<ChangeDetector> = None;

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                None | Some(CoordinatorMsg::Shutdown) => break,
                Some(CoordinatorMsg::SetProject(project)) => {
                    if let Some(old) = detector.take() {
                        crate::debug!("watch"; "disposing watcher for {}", old.root().display());
                        old.shutdown().await;
                    }
                    detector = project
                        .as_ref()
                        .map(|p| start_detector(p, &watch, compiler_tx.clone()));
                    if compiler_tx.send(CompilerMsg::SetProject(project)).await.is_err() {
                        break;
                    }
                }
                Some(CoordinatorMsg::CompileNow) => {
                    if compiler_tx.send(CompilerMsg::CompileNow).await.is_err() {
                        break;
                    }
                }
                Some(CoordinatorMsg::Flush(reply)) => {
                    if compiler_tx.send(CompilerMsg::Flush(reply)).await.is_err() {
                        break;
                    }
                }
            },
            _ = wait_shutdown(shutdown_rx.as_ref()) => {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
        }
    }

    // Unsubscribe before the compiler goes away.
    if let Some(detector) = detector.take() {
        detector.shutdown().await;
    }
    let _ = compiler_tx.send(CompilerMsg::Shutdown).await;
    let _ = compiler_handle.await;
    crate::debug!("actor"; "stopped");
}

fn start_detector(
    project: &Project,
    watch: &WatchOptions,
    compiler_tx: mpsc::Sender<CompilerMsg>,
) -> ChangeDetector {
    let options = WatchOptions {
        extension: project.extension().to_string(),
        ..watch.clone()
    };
    let detector = ChangeDetector::initialize(project.script_root(), options, compiler_tx);
    crate::debug!("watch"; "{} ({})", project.script_root().display(), detector.state());
    detector
}

/// Resolves once the shutdown signal fires; never without a receiver.
async fn wait_shutdown(rx: Option<&Receiver<()>>) {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        if rx.try_recv().is_ok() {
            return;
        }
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }
}
