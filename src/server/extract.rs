//! Request extractors whose rejections use the API error envelope

use crate::core::error::{TourError, ValidationError};
use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// JSON body extractor; a malformed or mistyped body becomes a 400 `INVALID_JSON`
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_tour(
///     State(state): State<ApiState>,
///     JsonBody(draft): JsonBody<TourDraft>,
/// ) -> TourResult<impl IntoResponse> {
///     // draft has the tour shape, constraints are checked by the store
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = TourError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ValidationError::InvalidJson {
                message: rejection.body_text(),
            }
            .into()),
        }
    }
}

/// Parse a path segment as a tour identifier
pub fn parse_id(raw: &str) -> Result<Uuid, TourError> {
    Uuid::parse_str(raw).map_err(|_| {
        ValidationError::InvalidId {
            value: raw.to_string(),
        }
        .into()
    })
}
