//! Admin identity configuration loaded from environment variables.
//!
//! Exactly one operator identity is privileged. It is read from `ADMIN_USER_ID`
//! and compared by exact string match; if the variable is unset, nobody is admin.

/// Environment variable holding the operator's chat user ID.
pub const ADMIN_USER_ID_VAR: &str = "ADMIN_USER_ID";

/// Gets the configured operator user ID, if any.
///
/// Empty or whitespace-only values are treated as unset.
#[must_use]
pub fn get_admin_user_id() -> Option<String> {
    std::env::var(ADMIN_USER_ID_VAR)
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Checks `user_id` against the operator identity `admin_id`.
///
/// # Arguments
///
/// * `admin_id` - The configured operator ID, `None` if not configured
/// * `user_id` - The chat user ID of the caller
///
/// # Returns
///
/// `true` only for an exact match with a configured operator.
#[must_use]
pub fn is_admin(admin_id: Option<&str>, user_id: &str) -> bool {
    admin_id.is_some_and(|admin| admin == user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin_requires_exact_match() {
        assert!(is_admin(Some("42"), "42"));
        assert!(!is_admin(Some("42"), "420"));
        assert!(!is_admin(Some("42"), " 42"));
        assert!(!is_admin(None, "42"));
    }
}
