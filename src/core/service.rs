//! Data-access trait for tours

use crate::core::aggregate::{DifficultyStats, MonthlyPlan, MonthlyPlanSpec, RatingStatsSpec};
use crate::core::error::TourResult;
use crate::core::query::FindQuery;
use crate::core::tour::{Tour, TourDraft, TourPatch};
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Service trait for the tour collection
///
/// Implementations run the [`stages`](crate::core::stages) themselves:
/// every read hides secret tours and every write recomputes the slug.
#[async_trait]
pub trait TourService: Send + Sync {
    /// Execute a pending query once and return the projected documents
    async fn find(&self, query: FindQuery) -> TourResult<Vec<Value>>;

    /// Get a visible tour by ID
    async fn get(&self, id: &Uuid) -> TourResult<Option<Tour>>;

    /// Validate and insert a new tour
    async fn create(&self, draft: TourDraft) -> TourResult<Tour>;

    /// Merge a patch onto a visible tour; `None` when there is no such tour
    async fn update(&self, id: &Uuid, patch: TourPatch) -> TourResult<Option<Tour>>;

    /// Delete a tour; deleting an unknown ID is not an error
    async fn delete(&self, id: &Uuid) -> TourResult<()>;

    /// Rating statistics grouped by difficulty
    async fn rating_stats(&self, spec: &RatingStatsSpec) -> TourResult<Vec<DifficultyStats>>;

    /// Tour starts per month of one year
    async fn monthly_plan(&self, spec: &MonthlyPlanSpec) -> TourResult<Vec<MonthlyPlan>>;

    /// Release the underlying connection
    async fn close(&self) -> TourResult<()> {
        Ok(())
    }
}
