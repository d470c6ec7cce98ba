//! Typed error handling for the tours API
//!
//! Every fallible operation in the crate returns [`TourResult`]. Handlers
//! propagate errors with `?` and axum turns them into the JSON envelope
//! through the [`IntoResponse`] implementation below.
//!
//! # Error Categories
//!
//! - [`EntityError`]: the requested tour is absent or conflicts with another one
//! - [`ValidationError`]: the request body, identifier or query string is invalid
//! - [`StorageError`]: the data store failed
//! - [`ConfigError`]: startup configuration is incomplete or malformed
//!
//! # Envelope
//!
//! ```json
//! { "status": "fail", "message": "Tour with id '...' not found", "kind": "TOUR_NOT_FOUND" }
//! ```
//!
//! `status` is `fail` for client errors and `error` for server errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The main error type of the crate
#[derive(Debug, Error)]
pub enum TourError {
    /// Tour lookup or uniqueness errors
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Request validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Data store errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// `fail` for 4xx, `error` for 5xx
    pub status: &'static str,
    /// Human-readable error message
    pub message: String,
    /// Error classifier for programmatic handling
    pub kind: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TourError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TourError::Entity(e) => e.status_code(),
            TourError::Validation(_) => StatusCode::BAD_REQUEST,
            TourError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TourError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TourError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            TourError::Entity(e) => e.error_code(),
            TourError::Validation(e) => e.error_code(),
            TourError::Storage(_) => "STORAGE_ERROR",
            TourError::Config(_) => "CONFIG_ERROR",
            TourError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        let status = if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        };

        ErrorResponse {
            status,
            message: self.to_string(),
            kind: self.error_code().to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            TourError::Entity(EntityError::NotFound { id }) => {
                Some(serde_json::json!({ "id": id.to_string() }))
            }
            TourError::Entity(EntityError::DuplicateName { name }) => {
                Some(serde_json::json!({ "name": name }))
            }
            TourError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for TourError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.error_code(), "{}", self);
        } else {
            tracing::debug!(kind = self.error_code(), "{}", self);
        }
        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to a specific tour
#[derive(Debug, Error)]
pub enum EntityError {
    /// No visible tour has this identifier
    #[error("Tour with id '{id}' not found")]
    NotFound { id: Uuid },

    /// Another tour already uses this name
    #[error("A tour named '{name}' already exists")]
    DuplicateName { name: String },
}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::DuplicateName { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "TOUR_NOT_FOUND",
            EntityError::DuplicateName { .. } => "DUPLICATE_NAME",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to request validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// One or more body fields violate the tour constraints
    #[error("Validation errors: {}", format_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// The body is not valid JSON or does not have the tour shape
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// The path identifier is not a UUID
    #[error("Invalid tour id: {value}")]
    InvalidId { value: String },

    /// A query string parameter cannot be interpreted
    #[error("Invalid query parameter '{parameter}': {message}")]
    InvalidQuery { parameter: String, message: String },

    /// The monthly plan year is not a calendar year
    #[error("Invalid year: {value}")]
    InvalidYear { value: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn format_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldErrors(_) => "VALIDATION_ERROR",
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
            ValidationError::InvalidId { .. } => "INVALID_ID",
            ValidationError::InvalidQuery { .. } => "INVALID_QUERY",
            ValidationError::InvalidYear { .. } => "INVALID_YEAR",
        }
    }

    /// Shorthand for a query string error
    pub fn query(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidQuery {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |err| FieldValidationError {
                    // struct-level checks report under "__all__"; their code names the field
                    field: if field == "__all__" {
                        err.code.to_string()
                    } else {
                        field.clone()
                    },
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::FieldErrors(fields)
    }
}

impl From<validator::ValidationErrors> for TourError {
    fn from(errors: validator::ValidationErrors) -> Self {
        TourError::Validation(errors.into())
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Opening or closing the store failed
    #[error("{backend} connection error: {message}")]
    Connection { backend: String, message: String },

    /// A query or write failed
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// A document could not be converted
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl StorageError {
    pub fn query(backend: &str, message: impl std::fmt::Display) -> Self {
        StorageError::Query {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl std::fmt::Display) -> Self {
        StorageError::Serialization {
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// A setting has an unusable value
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for tour operations
pub type TourResult<T> = Result<T, TourError>;
