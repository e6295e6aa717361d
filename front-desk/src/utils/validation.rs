//! Input validation helpers
//!
//! Centralized text length constants and validation functions.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Names: guests, tables
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, color keys
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords
pub const MAX_PASSWORD_LEN: usize = 128;

/// Minimum password length accepted on change
pub const MIN_PASSWORD_LEN: usize = 8;

/// Phone numbers carry between these many digits
pub const MIN_PHONE_DIGITS: usize = 6;
pub const MAX_PHONE_DIGITS: usize = 20;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty"))
            .with_detail("field", field));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Phone: digits with an optional leading `+`, spaces and dashes allowed
/// between groups, 6 to 20 digits in total.
pub fn validate_phone(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "phone", MAX_SHORT_TEXT_LEN)?;
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let well_formed = body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        && body.starts_with(|c: char| c.is_ascii_digit())
        && body.ends_with(|c: char| c.is_ascii_digit());
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !well_formed || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(AppError::validation("phone must be a valid phone number")
            .with_detail("field", "phone"));
    }
    Ok(())
}

/// Email: one `@`, non-empty local part, dotted domain without spaces
pub fn validate_email(value: &str) -> Result<(), AppError> {
    validate_required_text(value, "email", MAX_EMAIL_LEN)?;
    let trimmed = value.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !trimmed.contains(char::is_whitespace)
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains("..")
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("email must be a valid email address")
            .with_detail("field", "email"));
    }
    Ok(())
}
