//! HTTP test macro for tour storage backends.
//!
//! The `tours_api_tests!` macro generates tests that drive a `TourService`
//! through full HTTP round-trips:
//! JSON → HTTP request → handler → TourService → HTTP response → JSON.

/// Generate the HTTP test suite for a storage backend.
///
/// `$service_factory` must produce an `impl TourService + 'static`; it is
/// evaluated once per test inside an async context.
#[macro_export]
macro_rules! tours_api_tests {
    ($service_factory:expr) => {
        mod tours_api_tests {
            use super::*;
            use crate::api_harness::{NAME_WORDS, create, id_of, tour_body, tours_of, with};
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use serde_json::{Value, json};

            async fn make_server() -> TestServer {
                crate::api_harness::test_server($service_factory)
            }

            fn names(envelope: &Value) -> Vec<String> {
                tours_of(envelope)
                    .iter()
                    .map(|t| t["name"].as_str().unwrap_or_default().to_string())
                    .collect()
            }

            // ==============================================================
            // Health
            // ==============================================================

            #[tokio::test]
            async fn test_health_endpoints() {
                let server = make_server().await;
                for path in ["/health", "/healthz"] {
                    let response = server.get(path).await;
                    response.assert_status_ok();
                    let body: Value = response.json();
                    assert_eq!(body["status"], "ok");
                }
            }

            // ==============================================================
            // Create
            // ==============================================================

            #[tokio::test]
            async fn test_create_returns_tour_with_slug() {
                let server = make_server().await;

                let response = server
                    .post("/api/v1/tours")
                    .json(&tour_body("Sky Trek Adventure", 450.0, "medium"))
                    .await;
                response.assert_status(StatusCode::CREATED);

                let body: Value = response.json();
                assert_eq!(body["status"], "success");
                let tour = &body["data"]["tour"];
                assert_eq!(tour["slug"], "sky-trek-adventure");
                assert_eq!(tour["ratingsAverage"], 4.5);
                assert_eq!(tour["ratingsQuantity"], 0);
                assert_eq!(tour["secretTour"], false);
                assert_eq!(tour["durationWeeks"], 1.0);
                assert!(tour.get("createdAt").is_none());
                assert!(tour.get("__v").is_none());
                uuid::Uuid::parse_str(tour["id"].as_str().unwrap()).unwrap();
            }

            #[tokio::test]
            async fn test_create_rejects_invalid_fields() {
                let server = make_server().await;

                let response = server
                    .post("/api/v1/tours")
                    .json(&tour_body("Too Short", 450.0, "easy"))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["status"], "fail");
                assert_eq!(body["kind"], "VALIDATION_ERROR");

                let response = server
                    .post("/api/v1/tours")
                    .json(&with(
                        tour_body("The Discounted Hiker", 450.0, "easy"),
                        json!({ "priceDiscount": 500 }),
                    ))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["details"]["fields"][0]["field"], "priceDiscount");
            }

            #[tokio::test]
            async fn test_create_rejects_malformed_body() {
                let server = make_server().await;

                let response = server
                    .post("/api/v1/tours")
                    .json(&json!({ "name": "The Incomplete Tour" }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["kind"], "INVALID_JSON");

                let response = server
                    .post("/api/v1/tours")
                    .json(&tour_body("The Extreme Climber", 450.0, "extreme"))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
            }

            #[tokio::test]
            async fn test_create_duplicate_name_conflicts() {
                let server = make_server().await;
                create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;

                let response = server
                    .post("/api/v1/tours")
                    .json(&tour_body("The Forest Hiker", 497.0, "medium"))
                    .await;
                response.assert_status(StatusCode::CONFLICT);
                let body: Value = response.json();
                assert_eq!(body["kind"], "DUPLICATE_NAME");
            }

            // ==============================================================
            // Get one
            // ==============================================================

            #[tokio::test]
            async fn test_get_tour() {
                let server = make_server().await;
                let created = create(&server, tour_body("The Sea Explorer", 497.0, "medium")).await;
                let id = id_of(&created);

                let response = server.get(&format!("/api/v1/tours/{}", id)).await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["data"]["tour"]["id"], id);
                assert_eq!(body["data"]["tour"]["name"], "The Sea Explorer");
            }

            #[tokio::test]
            async fn test_get_unknown_and_malformed_ids() {
                let server = make_server().await;

                let response = server
                    .get(&format!("/api/v1/tours/{}", uuid::Uuid::new_v4()))
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
                let body: Value = response.json();
                assert_eq!(body["status"], "fail");
                assert_eq!(body["kind"], "TOUR_NOT_FOUND");

                let response = server.get("/api/v1/tours/not-a-uuid").await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["kind"], "INVALID_ID");
            }

            // ==============================================================
            // Secret tours
            // ==============================================================

            #[tokio::test]
            async fn test_secret_tours_never_appear() {
                let server = make_server().await;
                create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;
                let secret = create(
                    &server,
                    with(
                        tour_body("The Secret Summit", 997.0, "easy"),
                        json!({
                            "secretTour": true,
                            "ratingsAverage": 5.0,
                            "startDates": ["2021-06-19T09:00:00Z"]
                        }),
                    ),
                )
                .await;

                let list: Value = server.get("/api/v1/tours").await.json();
                assert_eq!(list["results"], 1);
                assert_eq!(names(&list), vec!["The Forest Hiker"]);

                for query in ["secretTour=true", "secretTour=1", "secretTour[gte]=1"] {
                    let body: Value = server.get(&format!("/api/v1/tours?{}", query)).await.json();
                    assert_eq!(body["results"], 0, "{}", query);
                }
                let body: Value = server.get("/api/v1/tours?secretTour=false").await.json();
                assert_eq!(names(&body), vec!["The Forest Hiker"]);

                let response = server.get(&format!("/api/v1/tours/{}", id_of(&secret))).await;
                response.assert_status(StatusCode::NOT_FOUND);

                let response = server
                    .patch(&format!("/api/v1/tours/{}", id_of(&secret)))
                    .json(&json!({ "price": 10 }))
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);

                let stats: Value = server.get("/api/v1/tours/tour-stats").await.json();
                assert_eq!(stats["data"]["stats"][0]["numTours"], 1);
                assert_eq!(stats["data"]["stats"][0]["maxPrice"], 397.0);

                let plan: Value = server.get("/api/v1/tours/monthly-plan/2021").await.json();
                assert_eq!(plan["data"]["plan"], json!([]));
            }

            // ==============================================================
            // List: filter, sort, fields, paginate
            // ==============================================================

            #[tokio::test]
            async fn test_list_filters() {
                let server = make_server().await;
                create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;
                create(&server, tour_body("The Sea Explorer", 497.0, "medium")).await;
                create(&server, tour_body("The Snow Adventurer", 997.0, "difficult")).await;
                create(&server, tour_body("The City Wanderer", 1197.0, "easy")).await;

                let body: Value = server
                    .get("/api/v1/tours?difficulty=easy&sort=price")
                    .await
                    .json();
                assert_eq!(names(&body), vec!["The Forest Hiker", "The City Wanderer"]);

                let body: Value = server
                    .get("/api/v1/tours?price[gte]=497&price[lt]=1197&sort=price")
                    .await
                    .json();
                assert_eq!(names(&body), vec!["The Sea Explorer", "The Snow Adventurer"]);

                let body: Value = server.get("/api/v1/tours?guides=nobody").await.json();
                assert_eq!(body["results"], 0);

                // every repeated condition applies
                let body: Value = server
                    .get("/api/v1/tours?price[gte]=900&price[gte]=100&sort=price")
                    .await
                    .json();
                assert_eq!(names(&body), vec!["The Snow Adventurer", "The City Wanderer"]);
            }

            #[tokio::test]
            async fn test_list_sort_with_tiebreak() {
                let server = make_server().await;
                create(&server, tour_body("The Bravo Hiker", 500.0, "easy")).await;
                create(&server, tour_body("The Charlie Hiker", 900.0, "easy")).await;
                create(&server, tour_body("The Alpha Hiker", 500.0, "easy")).await;

                let body: Value = server.get("/api/v1/tours?sort=-price,name").await.json();
                assert_eq!(
                    names(&body),
                    vec!["The Charlie Hiker", "The Alpha Hiker", "The Bravo Hiker"]
                );
            }

            #[tokio::test]
            async fn test_list_field_selection() {
                let server = make_server().await;
                create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;

                let body: Value = server.get("/api/v1/tours?fields=name,price").await.json();
                let tour = &tours_of(&body)[0];
                let mut keys: Vec<&String> = tour.as_object().unwrap().keys().collect();
                keys.sort();
                assert_eq!(keys, vec!["id", "name", "price"]);

                let body: Value = server.get("/api/v1/tours?fields=-images,-summary").await.json();
                let tour = &tours_of(&body)[0];
                assert!(tour.get("images").is_none());
                assert!(tour.get("summary").is_none());
                assert!(tour.get("createdAt").is_none());
                assert!(tour.get("name").is_some());

                let body: Value = server.get("/api/v1/tours?fields=name,createdAt").await.json();
                assert!(tours_of(&body)[0].get("createdAt").is_some());
            }

            #[tokio::test]
            async fn test_list_pagination() {
                let server = make_server().await;
                for (i, word) in NAME_WORDS.iter().enumerate() {
                    create(
                        &server,
                        tour_body(
                            &format!("The {} Expedition", word),
                            100.0 * (i as f64 + 1.0),
                            "easy",
                        ),
                    )
                    .await;
                }

                let body: Value = server
                    .get("/api/v1/tours?sort=price&page=2&limit=5")
                    .await
                    .json();
                assert_eq!(body["results"], 5);
                let prices: Vec<f64> = tours_of(&body)
                    .iter()
                    .map(|t| t["price"].as_f64().unwrap())
                    .collect();
                assert_eq!(prices, vec![600.0, 700.0, 800.0, 900.0, 1000.0]);

                let body: Value = server.get("/api/v1/tours?page=5&limit=5").await.json();
                assert_eq!(body["results"], 0);

                let response = server
                    .get(&format!("/api/v1/tours?page=2&limit={}", u64::MAX))
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["results"], 0);
                assert_eq!(body["data"]["tours"], json!([]));

                let body: Value = server.get("/api/v1/tours").await.json();
                assert_eq!(body["results"], 12);
            }

            #[tokio::test]
            async fn test_list_rejects_bad_options() {
                let server = make_server().await;

                for query in [
                    "page=two",
                    "limit=-5",
                    "price[regex]=1",
                    "price[lt]=cheap",
                    "fields=name,-price",
                ] {
                    let response = server.get(&format!("/api/v1/tours?{}", query)).await;
                    response.assert_status(StatusCode::BAD_REQUEST);
                    let body: Value = response.json();
                    assert_eq!(body["kind"], "INVALID_QUERY", "query: {}", query);
                }
            }

            #[tokio::test]
            async fn test_top_five_cheap_alias() {
                let server = make_server().await;
                for (i, word) in NAME_WORDS.iter().take(7).enumerate() {
                    create(
                        &server,
                        with(
                            tour_body(
                                &format!("The {} Expedition", word),
                                1000.0 - 100.0 * i as f64,
                                "easy",
                            ),
                            json!({ "ratingsAverage": if i < 2 { 4.9 } else { 4.5 } }),
                        ),
                    )
                    .await;
                }

                let body: Value = server.get("/api/v1/tours/top-5-cheap?limit=50").await.json();
                assert_eq!(body["results"], 5);
                let tours = tours_of(&body);
                assert_eq!(tours[0]["name"], "The Bravo Expedition");
                assert_eq!(tours[1]["name"], "The Alpha Expedition");
                assert_eq!(tours[2]["name"], "The Golf Expedition");

                let mut keys: Vec<&String> = tours[0].as_object().unwrap().keys().collect();
                keys.sort();
                assert_eq!(
                    keys,
                    vec!["difficulty", "id", "name", "price", "ratingsAverage", "summary"]
                );
            }

            // ==============================================================
            // Update
            // ==============================================================

            #[tokio::test]
            async fn test_update_merges_and_recomputes_slug() {
                let server = make_server().await;
                let created = create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;
                let id = id_of(&created);

                let response = server
                    .patch(&format!("/api/v1/tours/{}", id))
                    .json(&json!({ "name": "The Forest Runner", "price": 450 }))
                    .await;
                response.assert_status_ok();
                let body: Value = response.json();
                let tour = &body["data"]["tour"];
                assert_eq!(tour["slug"], "the-forest-runner");
                assert_eq!(tour["price"], 450.0);
                assert_eq!(tour["difficulty"], "easy");

                let fetched: Value = server.get(&format!("/api/v1/tours/{}", id)).await.json();
                assert_eq!(fetched["data"]["tour"]["name"], "The Forest Runner");
            }

            #[tokio::test]
            async fn test_update_null_clears_discount() {
                let server = make_server().await;
                let created = create(
                    &server,
                    with(
                        tour_body("The Forest Hiker", 397.0, "easy"),
                        json!({ "priceDiscount": 297 }),
                    ),
                )
                .await;
                let id = id_of(&created);
                assert_eq!(created["priceDiscount"], 297.0);

                let body: Value = server
                    .patch(&format!("/api/v1/tours/{}", id))
                    .json(&json!({ "price": 420 }))
                    .await
                    .json();
                assert_eq!(body["data"]["tour"]["priceDiscount"], 297.0);

                let response = server
                    .patch(&format!("/api/v1/tours/{}", id))
                    .json(&json!({ "priceDiscount": null }))
                    .await;
                response.assert_status_ok();

                let fetched: Value = server.get(&format!("/api/v1/tours/{}", id)).await.json();
                assert!(fetched["data"]["tour"].get("priceDiscount").is_none());
                assert_eq!(fetched["data"]["tour"]["price"], 420.0);
            }

            #[tokio::test]
            async fn test_update_errors() {
                let server = make_server().await;
                let created = create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;
                let id = id_of(&created);

                let response = server
                    .patch(&format!("/api/v1/tours/{}", id))
                    .json(&json!({ "ratingsAverage": 6 }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["kind"], "VALIDATION_ERROR");
                assert!(body["message"].as_str().is_some());

                let response = server
                    .patch(&format!("/api/v1/tours/{}", uuid::Uuid::new_v4()))
                    .json(&json!({ "price": 100 }))
                    .await;
                response.assert_status(StatusCode::NOT_FOUND);
            }

            // ==============================================================
            // Delete
            // ==============================================================

            #[tokio::test]
            async fn test_delete_tour() {
                let server = make_server().await;
                let created = create(&server, tour_body("The Forest Hiker", 397.0, "easy")).await;
                let id = id_of(&created);

                let response = server.delete(&format!("/api/v1/tours/{}", id)).await;
                response.assert_status(StatusCode::NO_CONTENT);
                assert!(response.text().is_empty());

                let response = server.get(&format!("/api/v1/tours/{}", id)).await;
                response.assert_status(StatusCode::NOT_FOUND);
            }

            #[tokio::test]
            async fn test_delete_unknown_tour_is_no_content() {
                let server = make_server().await;

                let response = server
                    .delete(&format!("/api/v1/tours/{}", uuid::Uuid::new_v4()))
                    .await;
                response.assert_status(StatusCode::NO_CONTENT);
                assert!(response.text().is_empty());

                let response = server.delete("/api/v1/tours/42").await;
                response.assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Reports
            // ==============================================================

            #[tokio::test]
            async fn test_tour_stats() {
                let server = make_server().await;
                let rated = |name: &str, price: f64, difficulty: &str, rating: f64, count: u32| {
                    with(
                        tour_body(name, price, difficulty),
                        json!({ "ratingsAverage": rating, "ratingsQuantity": count }),
                    )
                };
                create(&server, rated("The Forest Hiker", 397.0, "easy", 4.7, 37)).await;
                create(&server, rated("The Sea Explorer", 497.0, "easy", 4.8, 23)).await;
                create(&server, rated("The Park Camper", 1497.0, "medium", 4.9, 19)).await;
                create(&server, rated("The Low Rated Trek", 50.0, "easy", 3.9, 5)).await;

                let response = server.get("/api/v1/tours/tour-stats").await;
                response.assert_status_ok();
                let body: Value = response.json();
                let stats = body["data"]["stats"].as_array().unwrap();
                assert_eq!(stats.len(), 2);

                assert_eq!(stats[0]["difficulty"], "EASY");
                assert_eq!(stats[0]["numTours"], 2);
                assert_eq!(stats[0]["numRatings"], 60);
                assert_eq!(stats[0]["avgPrice"], 447.0);
                assert_eq!(stats[0]["minPrice"], 397.0);
                assert_eq!(stats[0]["maxPrice"], 497.0);

                assert_eq!(stats[1]["difficulty"], "MEDIUM");
                assert_eq!(stats[1]["numTours"], 1);
            }

            #[tokio::test]
            async fn test_monthly_plan() {
                let server = make_server().await;
                create(
                    &server,
                    with(
                        tour_body("The Forest Hiker", 397.0, "easy"),
                        json!({ "startDates": [
                            "2021-04-25T09:00:00Z",
                            "2021-07-20T09:00:00Z",
                            "2022-07-01T09:00:00Z"
                        ] }),
                    ),
                )
                .await;
                create(
                    &server,
                    with(
                        tour_body("The Sea Explorer", 497.0, "medium"),
                        json!({ "startDates": [
                            "2021-07-05T09:00:00Z",
                            "2021-12-31T18:00:00Z",
                            "2020-12-31T23:00:00Z"
                        ] }),
                    ),
                )
                .await;

                let response = server.get("/api/v1/tours/monthly-plan/2021").await;
                response.assert_status_ok();
                let body: Value = response.json();
                let plan = body["data"]["plan"].as_array().unwrap();

                assert_eq!(plan.len(), 3);
                assert_eq!(plan[0]["month"], 7);
                assert_eq!(plan[0]["numTourStarts"], 2);
                assert_eq!(plan[0]["tours"], json!(["The Forest Hiker", "The Sea Explorer"]));
                assert_eq!(plan[1]["month"], 4);
                assert_eq!(plan[2]["month"], 12);
                let total: u64 = plan.iter().map(|m| m["numTourStarts"].as_u64().unwrap()).sum();
                assert_eq!(total, 4);
            }

            #[tokio::test]
            async fn test_monthly_plan_rejects_bad_year() {
                let server = make_server().await;
                let response = server.get("/api/v1/tours/monthly-plan/next-year").await;
                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["kind"], "INVALID_YEAR");
            }

            // ==============================================================
            // Users placeholder
            // ==============================================================

            #[tokio::test]
            async fn test_users_routes_are_not_defined() {
                let server = make_server().await;

                let responses = vec![
                    server.get("/api/v1/users").await,
                    server.post("/api/v1/users").json(&json!({})).await,
                    server.get(&format!("/api/v1/users/{}", uuid::Uuid::new_v4())).await,
                    server.delete("/api/v1/users/1").await,
                ];
                for response in responses {
                    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
                    let body: Value = response.json();
                    assert_eq!(body["status"], "error");
                    assert_eq!(body["message"], "This route is not yet defined!");
                }
            }
        }
    };
}
