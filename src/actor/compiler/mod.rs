//! Compiler Actor - serializes compile/swap sequences.
//!
//! Compiles run on the blocking pool so the async loop keeps draining
//! notifications. Changes that arrive while a compile is in flight are
//! coalesced into one follow-up compile; nothing is interleaved.

mod tasks;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::messages::CompilerMsg;
use super::project::Project;
use crate::compiler::{CompileResult, EventBus, ReloadEvent, ScriptCompiler};
use crate::logger::{Console, status_error, status_success, status_unchanged};
use tasks::{CompileTask, TaskOutcome, join, wait_task};

/// Diagnostics shown under a failed watch status line.
const STATUS_DETAIL_LINES: usize = 5;

pub struct CompilerActor {
    rx: mpsc::Receiver<CompilerMsg>,
    compiler: Arc<Mutex<ScriptCompiler>>,
    events: Arc<EventBus>,
    console: Console,
    project: Option<Project>,
    /// A compile was requested while another was in flight.
    pending: bool,
    show_status: bool,
}

impl CompilerActor {
    pub fn new(rx: mpsc::Receiver<CompilerMsg>, compiler: Arc<Mutex<ScriptCompiler>>) -> Self {
        let (events, console) = {
            let guard = compiler.lock();
            (Arc::clone(guard.events()), guard.console().clone())
        };
        Self {
            rx,
            compiler,
            events,
            console,
            project: None,
            pending: false,
            show_status: false,
        }
    }

    /// Print a one-block watch status after every compile.
    pub fn with_status(mut self, show: bool) -> Self {
        self.show_status = show;
        self
    }

    /// Main event loop.
    pub async fn run(mut self) {
        let mut task: Option<CompileTask> = None;

        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => {
                    let Some(msg) = msg else { break };
                    if !self.dispatch(msg, &mut task).await {
                        break;
                    }
                }

                outcome = wait_task(&mut task) => {
                    task = None;
                    self.on_compile_done(outcome);
                    if std::mem::take(&mut self.pending) {
                        task = self.spawn_compile();
                    }
                }
            }
        }

        // Never abandon a swap halfway.
        self.drain(&mut task).await;
        crate::debug!("compile"; "compiler actor stopped");
    }

    /// Handle one message. Returns `false` on shutdown.
    async fn dispatch(&mut self, msg: CompilerMsg, task: &mut Option<CompileTask>) -> bool {
        match msg {
            CompilerMsg::ScriptsChanged(batch) => {
                for (path, kind) in &batch.0 {
                    crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                }
                self.events.emit(ReloadEvent::ScriptsChanged);
                self.request_compile(task);
            }
            CompilerMsg::CompileNow => self.request_compile(task),
            CompilerMsg::SetProject(project) => {
                self.drain(task).await;
                self.project = project;
                match &self.project {
                    Some(project) => {
                        crate::debug!("compile"; "project: {}", project.root().display());
                        *task = self.spawn_compile();
                    }
                    None => {
                        let compiler = Arc::clone(&self.compiler);
                        let _ = tokio::task::spawn_blocking(move || compiler.lock().unload_current()).await;
                    }
                }
            }
            CompilerMsg::Flush(reply) => {
                self.drain(task).await;
                let _ = reply.send(self.compiler.lock().stats());
            }
            CompilerMsg::Shutdown => {
                crate::debug!("compile"; "shutting down");
                return false;
            }
        }
        true
    }

    fn request_compile(&mut self, task: &mut Option<CompileTask>) {
        if task.is_some() {
            crate::debug!("compile"; "compile in flight, queued");
            self.pending = true;
        } else {
            *task = self.spawn_compile();
        }
    }

    fn spawn_compile(&self) -> Option<CompileTask> {
        let Some(project) = &self.project else {
            crate::debug!("compile"; "no project open");
            return None;
        };
        Some(tasks::spawn_compile(project.clone(), Arc::clone(&self.compiler)))
    }

    /// Finish the in-flight compile and any queued follow-up.
    async fn drain(&mut self, task: &mut Option<CompileTask>) {
        loop {
            if let Some(mut handle) = task.take() {
                let outcome = join(&mut handle).await;
                self.on_compile_done(outcome);
            }
            if !std::mem::take(&mut self.pending) {
                break;
            }
            *task = self.spawn_compile();
            if task.is_none() {
                break;
            }
        }
    }

    fn on_compile_done(&self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::NoScripts => {
                self.console.editor_log("[Compiler] nothing to compile");
                if self.show_status {
                    status_unchanged("no scripts to compile");
                }
            }
            TaskOutcome::Panicked(e) => {
                self.console
                    .editor_error(format!("[Compiler] compile task failed: {e}"));
                if self.show_status {
                    status_error("compile task failed", &e);
                }
            }
            TaskOutcome::Done {
                result,
                files,
                elapsed,
            } => {
                if !self.show_status {
                    return;
                }
                let files = crate::utils::plural::plural_count(files, "script");
                match result {
                    CompileResult::Compiled(unit) => {
                        status_success(&format!("reloaded {} from {files} in {elapsed:?}", unit.name()))
                    }
                    CompileResult::Cached(unit) => {
                        status_unchanged(&format!("{} unchanged, loaded from cache", unit.name()))
                    }
                    CompileResult::Failed(diagnostics) => {
                        let errors: Vec<_> = diagnostics
                            .iter()
                            .filter(|d| d.is_error())
                            .take(STATUS_DETAIL_LINES)
                            .map(|d| d.to_string())
                            .collect();
                        status_error("compile failed, previous unit kept", &errors.join("\n"));
                    }
                }
            }
        }
    }
}
