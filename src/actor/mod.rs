//! Actor system for live script reload.
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! ChangeDetector --ScriptsChanged--> CompilerActor --ReloadEvent--> subscribers
//!   (watch)                     (compile, swap, migrate)   (console, inspector)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `project` - Script discovery for the open project
//! - `compiler` - Serialized compile/swap sequences
//! - `coordinator` - Wires up and runs actors, owns the watcher lifecycle

pub mod compiler;
pub mod coordinator;
pub mod messages;
pub mod project;

pub use coordinator::{Coordinator, CoordinatorHandle};
pub use messages::CompilerMsg;
pub use project::Project;
