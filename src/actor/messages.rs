//! Actor Message Definitions
//!
//! ```text
//! ChangeDetector --ScriptsChanged--> CompilerActor
//! Coordinator    --SetProject/CompileNow/Shutdown--> CompilerActor
//! ```

use tokio::sync::oneshot;

use super::project::Project;
use crate::compiler::CompileStats;
use crate::watch::ChangeBatch;

/// Messages to the compiler actor
#[derive(Debug)]
pub enum CompilerMsg {
    /// A settled burst of script edits
    ScriptsChanged(ChangeBatch),
    /// Compile every script of the current project
    CompileNow,
    /// Switch project; `None` closes it and unloads the current unit
    SetProject(Option<Project>),
    /// Report counters once every earlier message has been handled
    Flush(oneshot::Sender<CompileStats>),
    /// Stop after the in-flight compile, if any
    Shutdown,
}

/// Messages to the coordinator
#[derive(Debug)]
pub enum CoordinatorMsg {
    SetProject(Option<Project>),
    CompileNow,
    Flush(oneshot::Sender<CompileStats>),
    Shutdown,
}
