use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::actor::project::Project;
use crate::compiler::{CompileResult, ScriptCompiler};

pub(super) type CompileTask = JoinHandle<TaskOutcome>;

pub(super) enum TaskOutcome {
    /// The project has no scripts (or no script root yet).
    NoScripts,
    Done {
        result: CompileResult,
        files: usize,
        elapsed: Duration,
    },
    Panicked(String),
}

/// Scan the project and compile it on the blocking pool.
pub(super) fn spawn_compile(project: Project, compiler: Arc<Mutex<ScriptCompiler>>) -> CompileTask {
    tokio::task::spawn_blocking(move || {
        let paths = project.script_paths();
        if paths.is_empty() {
            return TaskOutcome::NoScripts;
        }
        let start = Instant::now();
        let result = compiler.lock().compile(&paths);
        TaskOutcome::Done {
            result,
            files: paths.len(),
            elapsed: start.elapsed(),
        }
    })
}

/// Wait for the compile task (blocks forever if None).
///
/// The handle stays in `task`, so losing the race in `select!` does not
/// detach it; the caller clears the slot once this resolves.
pub(super) async fn wait_task(task: &mut Option<CompileTask>) -> TaskOutcome {
    match task.as_mut() {
        Some(handle) => join(handle).await,
        None => std::future::pending().await,
    }
}

pub(super) async fn join(handle: &mut CompileTask) -> TaskOutcome {
    handle
        .await
        .unwrap_or_else(|e| TaskOutcome::Panicked(e.to_string()))
}
