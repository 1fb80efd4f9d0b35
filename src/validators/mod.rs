/// Form-field validation rules shared by signup and profile editing.
use validator::ValidationError;

/// Username format: starts with an alphanumeric character, then
/// alphanumerics, underscore or hyphen. Length is checked separately by
/// the form's `length` rule.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let first_char_valid = username
        .chars()
        .next()
        .map(|c| c.is_alphanumeric())
        .unwrap_or(false);

    if !first_char_valid {
        return Err(ValidationError::new("username_start"));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::new("username_chars"));
    }

    Ok(())
}

/// Rejects values that are empty once surrounding whitespace is stripped.
/// Length rules alone let a whitespace-only submission through.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
