// ⚠️ Store Errors
// Everything the expense store can reject or fail with

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store errors.
///
/// - [`Validation`] a field is empty or not a usable number.
/// - [`ConstraintViolation`] the name is already taken (only with unique names).
/// - [`NotFound`] an update targeted an identity that is not stored.
/// - [`Persistence`] the underlying SQLite database failed.
///
///  [`Validation`]: StoreError::Validation
///  [`ConstraintViolation`]: StoreError::ConstraintViolation
///  [`NotFound`]: StoreError::NotFound
///  [`Persistence`]: StoreError::Persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("an expense named \"{0}\" already exists")]
    ConstraintViolation(String),
    #[error("expense {0} not found")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl PartialEq for StoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Validation { field: a, message: m },
                Self::Validation { field: b, message: n },
            ) => a == b && m == n,
            (Self::ConstraintViolation(a), Self::ConstraintViolation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_readable() {
        let err = StoreError::validation("name", "Required field is empty");
        assert_eq!(err.to_string(), "name: Required field is empty");

        let err = StoreError::ConstraintViolation("Coffee".to_string());
        assert_eq!(err.to_string(), "an expense named \"Coffee\" already exists");
    }
}
