//! HTTP handlers
//!
//! Every handler returns [`TourResult`](crate::core::error::TourResult);
//! errors become the JSON envelope through `TourError`'s `IntoResponse`.

pub mod tours;
pub mod users;

use crate::core::service::TourService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub tours: Arc<dyn TourService>,
}
