use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress informational CLI output when `DIALOGUE_QUIET` is set
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("DIALOGUE_QUIET")
            .map(|v| quiet_flag(&v))
            .unwrap_or(false)
    })
}

fn quiet_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::quiet_flag;

    #[test]
    fn test_quiet_flag_values() {
        assert!(quiet_flag("1"));
        assert!(quiet_flag("TRUE"));
        assert!(quiet_flag(" true "));
        assert!(!quiet_flag("0"));
        assert!(!quiet_flag(""));
    }
}
