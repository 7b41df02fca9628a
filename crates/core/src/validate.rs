//! Field-level validation helpers shared by the input types.

use crate::error::ValidationError;

/// Require a non-blank string of at most `max_len` characters.
pub fn required_text(field: &str, value: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "this field is required"));
    }
    optional_text(field, value, max_len)
}

/// Allow any string of at most `max_len` characters, including empty.
pub fn optional_text(field: &str, value: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    Ok(())
}

/// Require a strictly positive count.
pub fn positive(field: &str, value: i32) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(field, format!("{field} must be > 0")));
    }
    Ok(())
}

/// Require a count that is zero or more.
pub fn non_negative(field: &str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(
            field,
            format!("{field} cannot be negative"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank() {
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "ok", 10).is_ok());
    }

    #[test]
    fn text_length_counts_chars() {
        assert!(optional_text("name", "ééé", 3).is_ok());
        assert!(optional_text("name", "éééé", 3).is_err());
    }

    #[test]
    fn counts() {
        assert!(positive("units", 0).is_err());
        assert!(positive("units", 1).is_ok());
        assert!(non_negative("units", 0).is_ok());
        let err = non_negative("units", -1).unwrap_err();
        assert_eq!(err.message, "units cannot be negative");
    }
}
