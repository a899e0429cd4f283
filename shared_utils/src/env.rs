//! Environment variable access.

/// Reads an optional override. Missing, non-unicode and blank values all map to `None`,
/// so `FOO= ` in a shell profile does not silently override a configured value.
pub fn optional_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_optional_is_none() {
        assert!(optional_env_var("SHARED_UTILS_TEST_ANOTHER_UNSET_VAR").is_none());
    }
}
