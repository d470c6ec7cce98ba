//! Placeholder handlers for the users resource

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

const NOT_DEFINED: &str = "This route is not yet defined!";

/// Answers every users route until the resource exists
pub async fn not_yet_defined() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "status": "error",
            "message": NOT_DEFINED
        })),
    )
}
