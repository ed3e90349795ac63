use grid_engine::MutationError;

/// Format a store failure for the error panel, with a recovery hint where
/// one exists.
pub fn format_store_error(error: &MutationError) -> String {
    match error {
        MutationError::Network(detail) => {
            format!("{detail}\nIs the fleet API reachable? (FLEET_API_URL, or run with --demo)")
        }
        MutationError::Server(detail) => detail.clone(),
    }
}

/// Shorten a string to at most `max` characters, appending an ASCII
/// ellipsis when truncated.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_carry_a_hint() {
        let msg = format_store_error(&MutationError::Network("connection refused".to_string()));
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("--demo"));
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("a very long message", 10), "a very ...");
    }
}
