//! In-memory implementation of TourService for testing and development

use crate::core::aggregate::{DifficultyStats, MonthlyPlan, MonthlyPlanSpec, RatingStatsSpec};
use crate::core::error::{EntityError, TourError, TourResult};
use crate::core::query::FindQuery;
use crate::core::service::TourService;
use crate::core::stages;
use crate::core::tour::{Tour, TourDraft, TourPatch};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use uuid::Uuid;

const BACKEND: &str = "in-memory";

/// In-memory tour service implementation
///
/// Tours are kept in insertion order, which is also the order ties fall
/// back to when sorting. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryTourService {
    tours: Arc<RwLock<IndexMap<Uuid, Tour>>>,
}

impl InMemoryTourService {
    /// Create a new, empty in-memory tour service
    pub fn new() -> Self {
        Self {
            tours: Arc::new(RwLock::new(IndexMap::new())),
        }
    }

    fn read(&self) -> TourResult<RwLockReadGuard<'_, IndexMap<Uuid, Tour>>> {
        self.tours
            .read()
            .map_err(|e| TourError::Internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> TourResult<RwLockWriteGuard<'_, IndexMap<Uuid, Tour>>> {
        self.tours
            .write()
            .map_err(|e| TourError::Internal(format!("Failed to acquire write lock: {}", e)))
    }

    fn check_name_available(
        tours: &IndexMap<Uuid, Tour>,
        name: &str,
        except: Option<&Uuid>,
    ) -> TourResult<()> {
        let taken = tours
            .values()
            .any(|t| t.name == name && Some(&t.id) != except);
        if taken {
            return Err(EntityError::DuplicateName {
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for InMemoryTourService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TourService for InMemoryTourService {
    async fn find(&self, query: FindQuery) -> TourResult<Vec<Value>> {
        let started = Instant::now();
        let query = stages::before_find(query);
        let tours = self.read()?;

        let documents = query.execute(tours.values())?;

        tracing::debug!(
            backend = BACKEND,
            elapsed_ms = started.elapsed().as_millis() as u64,
            count = documents.len(),
            "find executed"
        );
        Ok(documents)
    }

    async fn get(&self, id: &Uuid) -> TourResult<Option<Tour>> {
        let tours = self.read()?;
        Ok(tours.get(id).filter(|t| stages::is_visible(t)).cloned())
    }

    async fn create(&self, draft: TourDraft) -> TourResult<Tour> {
        let tour = stages::prepare_for_save(draft.into_tour()?);
        let mut tours = self.write()?;

        Self::check_name_available(&tours, &tour.name, None)?;
        tours.insert(tour.id, tour.clone());

        tracing::debug!(backend = BACKEND, id = %tour.id, slug = %tour.slug, "tour created");
        Ok(tour)
    }

    async fn update(&self, id: &Uuid, patch: TourPatch) -> TourResult<Option<Tour>> {
        let mut tours = self.write()?;

        let Some(current) = tours.get(id).filter(|t| stages::is_visible(t)) else {
            return Ok(None);
        };
        let updated = stages::prepare_for_save(current.apply_patch(patch)?);

        Self::check_name_available(&tours, &updated.name, Some(id))?;
        tours.insert(*id, updated.clone());

        Ok(Some(updated))
    }

    async fn delete(&self, id: &Uuid) -> TourResult<()> {
        let mut tours = self.write()?;
        tours.shift_remove(id);
        Ok(())
    }

    async fn rating_stats(&self, spec: &RatingStatsSpec) -> TourResult<Vec<DifficultyStats>> {
        let tours = self.read()?;
        let stats = spec.evaluate(tours.values());
        tracing::debug!(backend = BACKEND, groups = stats.len(), "rating stats computed");
        Ok(stats)
    }

    async fn monthly_plan(&self, spec: &MonthlyPlanSpec) -> TourResult<Vec<MonthlyPlan>> {
        let tours = self.read()?;
        let plan = spec.evaluate(tours.values());
        tracing::debug!(
            backend = BACKEND,
            year = spec.year,
            months = plan.len(),
            "monthly plan computed"
        );
        Ok(plan)
    }
}
