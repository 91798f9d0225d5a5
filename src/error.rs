// HTTP API Error Types
use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::manager::DatabaseError;
use crate::database::record::RecordError;
use crate::filter::FilterError;
use crate::import::ImportError;
use crate::reports::ReportError;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE class 22: data exceptions (bad date text, numeric overflow, ...)
const DATA_EXCEPTION_CLASS: &str = "22";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict { message: String, error: String },

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError { message: String, error: String },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError { .. } => 500,
        }
    }

    /// Get client-facing message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict { message, .. } => message,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
        }
    }

    /// Underlying cause reported in the `error` field
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Conflict { error, .. } => error,
            ApiError::InternalServerError { error, .. } => error,
            other => other.message(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "message": self.message(),
            "error": self.detail(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>, error: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            error: error.into(),
        }
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>, error: impl Into<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            error: error.into(),
        }
    }

    /// 400 for a path id that cannot identify any row
    pub fn invalid_id(raw: &str) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert("id".to_string(), format!("Invalid id: {}", raw));
        ApiError::validation_error("Invalid id", Some(field_errors))
    }
}

// Convert other error types to ApiError
impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::SystemFieldNotAllowed(field) => {
                ApiError::bad_request(format!("System field '{}' cannot be set via API", field))
            }
            RecordError::InvalidJson(msg) => ApiError::invalid_json(msg),
            RecordError::MissingRequiredFields(fields) => {
                let field_errors = fields
                    .into_iter()
                    .map(|field| (field, "This field is required".to_string()))
                    .collect();
                ApiError::validation_error("Missing required fields", Some(field_errors))
            }
            RecordError::NoUpdatableFields => {
                ApiError::validation_error("No updatable fields supplied", None)
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(sqlx::Error::RowNotFound) => ApiError::not_found("Record not found"),
            DatabaseError::Sqlx(sqlx::Error::Database(db_err)) => {
                let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
                let detail = db_err.message().to_string();
                if code == UNIQUE_VIOLATION {
                    ApiError::conflict("Record already exists", detail)
                } else if code == FOREIGN_KEY_VIOLATION {
                    ApiError::not_found(format!("Referenced record not found: {}", detail))
                } else if code.starts_with(DATA_EXCEPTION_CLASS) {
                    ApiError::validation_error(format!("Invalid field value: {}", detail), None)
                } else {
                    tracing::error!("Database error [{}]: {}", code, detail);
                    ApiError::internal_server_error("Database error occurred", detail)
                }
            }
            DatabaseError::MigrationError(msg) => {
                tracing::error!("Migration error: {}", msg);
                ApiError::internal_server_error("Database migration failed", msg)
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error("Database error occurred", other.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(err.body_text())
        } else {
            ApiError::bad_request(format!("Multipart error: {}", err.body_text()))
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Rows(failures) => ApiError::validation_error(
                "Import failed; no rows were saved",
                Some(failures.into_iter().collect()),
            ),
            ImportError::Database(db_err) => db_err.into(),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        tracing::error!("Report generation failed: {}", err);
        ApiError::internal_server_error("Failed to generate report", err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
