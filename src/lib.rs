//! reloadkit - live script hot-reload core for a 3D scene editor.
//!
//! # Module Structure
//!
//! ```text
//! watch      change detector: notify watcher, debouncer, retry on missing root
//! freshness  blake3 content fingerprints
//! script     component declaration language front-end
//! unit       compiled units, artifact images, isolated load context
//! compiler   compile or reuse, swap, migrate, retire, reload events
//! scene      tracked objects, state migration, leak audit
//! actor      tokio coordinator and compiler actor
//! config     reloadkit.toml
//! cli        command implementations
//! ```

#[macro_use]
pub mod logger;

pub mod actor;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod core;
pub mod freshness;
pub mod scene;
pub mod script;
pub mod unit;
pub mod utils;
pub mod watch;
