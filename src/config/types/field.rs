//! Config field path used in validation messages.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path of a config field, e.g. `watch.debounce_ms`.
///
/// Sections expose one constant per validated field:
///
/// ```ignore
/// diag.error(WatchConfig::DEBOUNCE_MS, "must be greater than 0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}
