//! Command-line interface module.

mod args;
pub mod build;
pub mod clean;
pub mod common;
pub mod init;
pub mod types;
pub mod watch;

pub use args::{Cli, Commands, ProjectArgs};
