//! # Tours API
//!
//! A REST API for tour resources backed by a document store.
//!
//! ## Features
//!
//! - **Query shaping**: filtering with comparison operators, multi-key sorting,
//!   field projection and pagination, translated from the query string onto a
//!   pending query that runs once
//! - **Reports**: rating statistics per difficulty and a monthly start plan
//! - **Pluggable storage**: in-memory, or MongoDB behind the `mongodb_backend` feature
//! - **Typed errors**: every failure maps to one JSON envelope and status code
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tours::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     ServerBuilder::new()
//!         .with_tour_service(InMemoryTourService::new())
//!         .with_request_logging(true)
//!         .serve("127.0.0.1:3000")
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        aggregate::{DifficultyStats, MonthlyPlan, MonthlyPlanSpec, RatingStatsSpec},
        error::{TourError, TourResult},
        features::QueryFeatures,
        field::{FieldKind, FieldValue},
        options::QueryOptions,
        query::{CmpOp, Condition, FindQuery, Projection, SortKey},
        service::TourService,
        tour::{Difficulty, Tour, TourDraft, TourPatch},
    };

    // === Storage ===
    pub use crate::storage::InMemoryTourService;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoTourService;

    // === Config ===
    pub use crate::config::ServerConfig;

    // === Server ===
    pub use crate::server::{ApiState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
