//! Validation functions for paths.

use thiserror::Error;

/// Size limits enforced on client supplied paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerLimits {
    /// Maximum pointer string length.
    pub max_pointer_length: usize,
    /// Maximum number of components.
    pub max_depth: usize,
}

impl Default for PointerLimits {
    fn default() -> Self {
        Self {
            max_pointer_length: 1024,
            max_depth: 256,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("Path too long")]
    PathTooLong,
}

/// Validates a pointer string against `limits`.
///
/// # Errors
///
/// - non-empty pointer without a leading `/`
/// - pointer longer than `limits.max_pointer_length`
///
/// ```
/// use folders_pointer::{validate_json_pointer, PointerLimits};
///
/// let limits = PointerLimits::default();
/// validate_json_pointer("", &limits).unwrap();
/// validate_json_pointer("/1/name", &limits).unwrap();
/// validate_json_pointer("1/name", &limits).unwrap_err();
/// ```
pub fn validate_json_pointer(pointer: &str, limits: &PointerLimits) -> Result<(), ValidationError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with(crate::SEPARATOR) {
        return Err(ValidationError::PointerInvalid);
    }
    if pointer.len() > limits.max_pointer_length {
        return Err(ValidationError::PointerTooLong);
    }
    Ok(())
}

/// Validates the depth of a parsed path.
pub fn validate_path(path: &[String], limits: &PointerLimits) -> Result<(), ValidationError> {
    if path.len() > limits.max_depth {
        return Err(ValidationError::PathTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_pointer_is_invalid() {
        let limits = PointerLimits::default();
        assert_eq!(
            validate_json_pointer("foo", &limits),
            Err(ValidationError::PointerInvalid)
        );
    }

    #[test]
    fn long_pointer_is_rejected() {
        let limits = PointerLimits {
            max_pointer_length: 8,
            ..PointerLimits::default()
        };
        assert_eq!(
            validate_json_pointer("/abcdefghij", &limits),
            Err(ValidationError::PointerTooLong)
        );
    }

    #[test]
    fn depth_limit() {
        let limits = PointerLimits::default();
        let ok: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let too_deep: Vec<String> = (0..257).map(|i| i.to_string()).collect();
        assert!(validate_path(&ok, &limits).is_ok());
        assert_eq!(validate_path(&too_deep, &limits), Err(ValidationError::PathTooLong));
    }
}
