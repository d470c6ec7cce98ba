//! Router assembly for the versioned API

use crate::server::handlers::{ApiState, tours, users};
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// Prefix of every resource route
pub const API_PREFIX: &str = "/api/v1";

/// Build the tours and users routes
///
/// - GET /api/v1/tours - List tours
/// - POST /api/v1/tours - Create a tour
/// - GET /api/v1/tours/top-5-cheap - Best rated, cheapest five
/// - GET /api/v1/tours/tour-stats - Rating statistics
/// - GET /api/v1/tours/monthly-plan/{year} - Starts per month
/// - GET|PATCH|DELETE /api/v1/tours/{id} - Single tour
/// - /api/v1/users, /api/v1/users/{id} - Not yet defined
pub fn build_api_routes(state: ApiState) -> Router {
    Router::new()
        .route(
            &format!("{API_PREFIX}/tours"),
            get(tours::list_tours).post(tours::create_tour),
        )
        .route(&format!("{API_PREFIX}/tours/top-5-cheap"), get(tours::top_tours))
        .route(&format!("{API_PREFIX}/tours/tour-stats"), get(tours::tour_stats))
        .route(
            &format!("{API_PREFIX}/tours/monthly-plan/{{year}}"),
            get(tours::monthly_plan),
        )
        .route(
            &format!("{API_PREFIX}/tours/{{id}}"),
            get(tours::get_tour)
                .patch(tours::update_tour)
                .delete(tours::delete_tour),
        )
        .route(
            &format!("{API_PREFIX}/users"),
            get(users::not_yet_defined).post(users::not_yet_defined),
        )
        .route(
            &format!("{API_PREFIX}/users/{{id}}"),
            get(users::not_yet_defined)
                .patch(users::not_yet_defined)
                .delete(users::not_yet_defined),
        )
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tours-api"
    }))
}
