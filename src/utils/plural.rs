//! Pluralization helpers for log lines.

/// Return "s" suffix for plural counts.
#[inline]
pub fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Format count with noun: `plural_count(3, "script")` -> `"3 scripts"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, plural_s(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "script"), "0 scripts");
        assert_eq!(plural_count(1, "script"), "1 script");
        assert_eq!(plural_count(2, "error"), "2 errors");
    }
}
