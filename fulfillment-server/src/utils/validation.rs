//! Input validation helpers shared by the API handlers

use shared::AppError;

/// Maximum length for free-text fields (reasons, notes)
pub const MAX_TEXT_LEN: usize = 500;

/// Maximum length for identifiers arriving from clients
pub const MAX_ID_LEN: usize = 128;

/// Validate a client-supplied identifier
pub fn validate_id(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > MAX_ID_LEN {
        return Err(AppError::validation(format!(
            "{field} exceeds {MAX_ID_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate an optional free-text field
pub fn validate_optional_text(value: Option<&str>, field: &str) -> Result<(), AppError> {
    if let Some(text) = value
        && text.len() > MAX_TEXT_LEN
    {
        return Err(AppError::validation(format!(
            "{field} exceeds {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a postal code (loose: printable, bounded length)
pub fn validate_postal_code(value: &str) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 16 {
        return Err(AppError::validation("invalid postal code"));
    }
    Ok(())
}
