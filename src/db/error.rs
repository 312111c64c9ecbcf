//! Storage-level error kinds.
//!
//! Every model operation returns [`StoreError`] so callers can tell an absent
//! row from a rejected write from an unavailable database.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Storage failure: {0}")]
    Storage(#[source] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let msg = db_err.message();
            if msg.contains("UNIQUE constraint failed") {
                let column = msg
                    .rsplit(": ")
                    .next()
                    .unwrap_or("value")
                    .to_string();
                return StoreError::ConstraintViolation(format!(
                    "{} is already in use",
                    column
                ));
            }
            if msg.contains("FOREIGN KEY constraint failed") {
                return StoreError::ConstraintViolation(
                    "Referenced resource does not exist or is still referenced".to_string(),
                );
            }
        }
        StoreError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("Employee", 42);
        assert_eq!(err.to_string(), "Employee 42 not found");
    }

    #[test]
    fn test_validation_message() {
        let err = StoreError::validation("position_id", "belongs to another department");
        assert_eq!(
            err.to_string(),
            "Invalid position_id: belongs to another department"
        );
    }

    #[test]
    fn test_row_not_found_is_storage() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Storage(_)));
    }
}
