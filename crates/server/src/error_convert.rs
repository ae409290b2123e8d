use shared_types::AppError;

/// Convert a sqlx::Error into an AppError.
///
/// Database details are logged here and never returned to the caller.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => {
                let detail = db_err.message();
                let friendly = if detail.contains("email") {
                    "An account with this email already exists"
                } else if detail.contains("receipt_number") {
                    "A payment with this receipt number already exists"
                } else if detail.contains("user_id") {
                    "This user is already linked to another record"
                } else {
                    "A record with this value already exists"
                };
                AppError::conflict(friendly)
            }
            // foreign_key_violation
            Some("23503") => AppError::bad_request("Referenced record does not exist"),
            // check_violation
            Some("23514") => AppError::bad_request("Value violates a data constraint"),
            _ => {
                tracing::error!(error = %err, "Database error");
                AppError::database("A database error occurred")
            }
        },
        _ => {
            tracing::error!(error = %err, "Database error");
            AppError::database("A database error occurred")
        }
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}

/// Log an unexpected failure and hide its details from the response.
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %err, "{context}");
    AppError::internal("An internal error occurred")
}
