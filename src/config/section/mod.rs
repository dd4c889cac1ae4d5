//! Configuration section definitions.
//!
//! Each module corresponds to a section in `reloadkit.toml`:
//!
//! | Module     | TOML Section   | Purpose                              |
//! |------------|----------------|--------------------------------------|
//! | `scripts`  | `[scripts]`    | Script root and tracked extension    |
//! | `watch`    | `[watch]`      | Debounce and retry intervals         |
//! | `compiler` | `[compiler]`   | Artifact cache and debug copies      |

mod compiler;
mod scripts;
mod watch;

pub use compiler::CompilerConfig;
pub use scripts::ScriptsConfig;
pub use watch::WatchConfig;
