//! Shared test harness for the tours HTTP API
//!
//! Provides request-body builders, a router factory and the
//! `tours_api_tests!` macro that runs the full HTTP suite against any
//! `TourService` backend.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod api_harness;
//! use api_harness::*;
//!
//! tours_api_tests!(InMemoryTourService::new());
//! ```

#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use serde_json::{Value, json};
use tours::core::service::TourService;
use tours::server::ServerBuilder;

#[macro_use]
pub mod api_tests;

/// Word used to build distinct, valid tour names (letters only)
pub const NAME_WORDS: [&str; 12] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India",
    "Juliet", "Kilo", "Lima",
];

/// Build the application router over a tour service
pub fn build_router(service: impl TourService + 'static) -> Router {
    ServerBuilder::new()
        .with_tour_service(service)
        .build()
        .expect("router should build")
}

/// Start a test server over a tour service
pub fn test_server(service: impl TourService + 'static) -> TestServer {
    TestServer::try_new(build_router(service)).expect("test server should start")
}

/// A valid create body
pub fn tour_body(name: &str, price: f64, difficulty: &str) -> Value {
    json!({
        "name": name,
        "price": price,
        "summary": "Breathtaking hike through the Canadian Banff National Park",
        "duration": 7,
        "maxGroupSize": 15,
        "difficulty": difficulty,
        "imageCover": "tour-1-cover.jpg",
        "images": ["tour-1-1.jpg", "tour-1-2.jpg"]
    })
}

/// Set extra fields on a body
pub fn with(mut body: Value, extra: Value) -> Value {
    if let (Some(target), Some(source)) = (body.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    body
}

/// POST a body and return the created tour document
pub async fn create(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/v1/tours").json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let envelope: Value = response.json();
    envelope["data"]["tour"].clone()
}

/// Identifier of a returned tour document
pub fn id_of(tour: &Value) -> String {
    tour["id"].as_str().expect("tour should have an id").to_string()
}

/// Tour documents of a list response
pub fn tours_of(envelope: &Value) -> Vec<Value> {
    envelope["data"]["tours"]
        .as_array()
        .cloned()
        .expect("list response should carry data.tours")
}
