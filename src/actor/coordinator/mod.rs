//! Actor Coordinator - wires up the reload actor system.
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Spawns the compiler actor
//! - Owns the change detector, replacing it when the project changes

mod runtime;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::compiler::CompilerActor;
use super::messages::{CompilerMsg, CoordinatorMsg};
use super::project::Project;
use crate::compiler::{CompileStats, ScriptCompiler};
use crate::config::ProjectConfig;
use crate::watch::WatchOptions;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    watch: WatchOptions,
    compiler: Arc<Mutex<ScriptCompiler>>,
    shutdown_rx: Option<Receiver<()>>,
    show_status: bool,
}

impl Coordinator {
    /// Build a coordinator and its compiler from a loaded configuration.
    pub fn with_config(config: &ProjectConfig, compiler: ScriptCompiler) -> Self {
        Self {
            watch: config.watch_options(),
            compiler: Arc::new(Mutex::new(compiler)),
            shutdown_rx: None,
            show_status: false,
        }
    }

    /// Set shutdown signal receiver (Ctrl+C).
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Print a watch status block after every compile.
    pub fn with_status(mut self, show: bool) -> Self {
        self.show_status = show;
        self
    }

    pub fn compiler(&self) -> Arc<Mutex<ScriptCompiler>> {
        Arc::clone(&self.compiler)
    }

    /// Spawn the actors. Must be called inside a tokio runtime.
    pub fn start(self) -> CoordinatorHandle {
        let (compiler_tx, compiler_rx) = mpsc::channel::<CompilerMsg>(CHANNEL_BUFFER);
        let (tx, rx) = mpsc::channel::<CoordinatorMsg>(CHANNEL_BUFFER);

        let compiler_actor =
            CompilerActor::new(compiler_rx, Arc::clone(&self.compiler)).with_status(self.show_status);
        let compiler_handle = tokio::spawn(compiler_actor.run());

        crate::debug!("actor"; "start");
        let task = tokio::spawn(runtime::run(
            rx,
            compiler_tx,
            compiler_handle,
            self.watch,
            self.shutdown_rx,
        ));

        CoordinatorHandle {
            tx,
            task,
            compiler: self.compiler,
        }
    }

    /// Open `project` and run until the shutdown signal fires.
    pub async fn run(self, project: Project) -> Result<()> {
        let handle = self.start();
        handle.set_project(Some(project)).await?;
        handle.wait().await
    }
}

/// Control surface of a running coordinator.
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorMsg>,
    task: JoinHandle<()>,
    compiler: Arc<Mutex<ScriptCompiler>>,
}

impl CoordinatorHandle {
    pub fn compiler(&self) -> &Arc<Mutex<ScriptCompiler>> {
        &self.compiler
    }

    /// Switch project. The old watcher is disposed before the new one starts.
    pub async fn set_project(&self, project: Option<Project>) -> Result<()> {
        self.send(CoordinatorMsg::SetProject(project)).await
    }

    pub async fn compile_now(&self) -> Result<()> {
        self.send(CoordinatorMsg::CompileNow).await
    }

    /// Wait until every request sent so far has been compiled.
    pub async fn flush(&self) -> Result<CompileStats> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorMsg::Flush(reply)).await?;
        rx.await.context("compiler actor stopped")
    }

    /// Dispose the watcher, finish the in-flight compile, stop.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.tx.send(CoordinatorMsg::Shutdown).await;
        self.task.await.context("coordinator task failed")
    }

    /// Wait for the coordinator to stop on its own (shutdown signal).
    pub async fn wait(self) -> Result<()> {
        self.task.await.context("coordinator task failed")
    }

    async fn send(&self, msg: CoordinatorMsg) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| anyhow!("coordinator stopped"))
    }
}
