//! HTTP handlers for the tours resource

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use super::ApiState;
use crate::core::aggregate::{MonthlyPlanSpec, RatingStatsSpec};
use crate::core::error::{EntityError, TourResult};
use crate::core::features::QueryFeatures;
use crate::core::options::QueryOptions;
use crate::core::query::{FindQuery, Projection};
use crate::core::tour::{Tour, TourDraft, TourPatch};
use crate::server::extract::{JsonBody, parse_id};

/// Preset of the top-5-cheap alias route
pub const TOP_TOURS_LIMIT: u64 = 5;
pub const TOP_TOURS_SORT: &str = "-ratingsAverage,price";
pub const TOP_TOURS_FIELDS: &str = "name,price,ratingsAverage,summary,difficulty";

fn tour_envelope(tour: &Tour) -> TourResult<Json<Value>> {
    Ok(Json(json!({
        "status": "success",
        "data": { "tour": Projection::default().render(tour)? }
    })))
}

/// List tours
///
/// GET /api/v1/tours?duration[gte]=5&sort=-price&fields=name,price&page=2&limit=5
pub async fn list_tours(
    State(state): State<ApiState>,
    Query(params): Query<Vec<(String, String)>>,
) -> TourResult<Json<Value>> {
    let options = QueryOptions::from_pairs(params)?;
    list_with_options(&state, options).await
}

async fn list_with_options(state: &ApiState, options: QueryOptions) -> TourResult<Json<Value>> {
    let query = QueryFeatures::new(FindQuery::all(), options)
        .filter()?
        .sort()
        .limit_fields()
        .paginate()
        .into_query();

    let tours = state.tours.find(query).await?;

    Ok(Json(json!({
        "status": "success",
        "results": tours.len(),
        "data": { "tours": tours }
    })))
}

/// Best rated, then cheapest, five tours
///
/// GET /api/v1/tours/top-5-cheap
pub async fn top_tours(
    State(state): State<ApiState>,
    Query(params): Query<Vec<(String, String)>>,
) -> TourResult<Json<Value>> {
    let mut options = QueryOptions::from_pairs(params)?;
    options.preset(TOP_TOURS_LIMIT, TOP_TOURS_SORT, TOP_TOURS_FIELDS);
    list_with_options(&state, options).await
}

/// Get a single tour
///
/// GET /api/v1/tours/{id}
pub async fn get_tour(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> TourResult<Json<Value>> {
    let id = parse_id(&id)?;
    let tour = state
        .tours
        .get(&id)
        .await?
        .ok_or(EntityError::NotFound { id })?;

    tour_envelope(&tour)
}

/// Create a tour
///
/// POST /api/v1/tours
pub async fn create_tour(
    State(state): State<ApiState>,
    JsonBody(draft): JsonBody<TourDraft>,
) -> TourResult<impl IntoResponse> {
    let tour = state.tours.create(draft).await?;
    tracing::info!(id = %tour.id, name = %tour.name, "tour created");

    Ok((StatusCode::CREATED, tour_envelope(&tour)?))
}

/// Update a tour with a partial body
///
/// PATCH /api/v1/tours/{id}
pub async fn update_tour(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<TourPatch>,
) -> TourResult<Json<Value>> {
    let id = parse_id(&id)?;
    let tour = state
        .tours
        .update(&id, patch)
        .await?
        .ok_or(EntityError::NotFound { id })?;

    tour_envelope(&tour)
}

/// Delete a tour; unknown ids answer the same way
///
/// DELETE /api/v1/tours/{id}
pub async fn delete_tour(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> TourResult<StatusCode> {
    let id = parse_id(&id)?;
    state.tours.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rating statistics per difficulty
///
/// GET /api/v1/tours/tour-stats
pub async fn tour_stats(State(state): State<ApiState>) -> TourResult<Json<Value>> {
    let stats = state.tours.rating_stats(&RatingStatsSpec::default()).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "stats": stats }
    })))
}

/// Tour starts per month
///
/// GET /api/v1/tours/monthly-plan/{year}
pub async fn monthly_plan(
    State(state): State<ApiState>,
    Path(year): Path<String>,
) -> TourResult<Json<Value>> {
    let spec = MonthlyPlanSpec::parse(&year)?;
    let plan = state.tours.monthly_plan(&spec).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "plan": plan }
    })))
}
