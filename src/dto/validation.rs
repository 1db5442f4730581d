//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a nickname is 1-20 characters and not just whitespace.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.trim().is_empty() {
        let mut err = ValidationError::new("nickname_blank");
        err.message = Some("Nickname must not be blank".into());
        return Err(err);
    }

    if nickname.chars().count() > 20 {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!(
                "Nickname must be at most 20 characters (got {})",
                nickname.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}
