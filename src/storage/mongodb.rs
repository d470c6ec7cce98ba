//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides [`MongoTourService`], a [`TourService`] backed by the `tours`
//! collection of a `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! tours-api = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! Tours are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs are stored as strings, the `id`
//! field is mapped to MongoDB's `_id` convention, and `createdAt` and
//! `startDates` are stored as native BSON dates so the aggregation
//! pipelines can use the date operators. A unique index on `name` enforces
//! name uniqueness.
//!
//! Filtering, sorting, skip and limit run on the server; the projection is
//! applied after decoding so that the `durationWeeks` virtual stays available.

use crate::core::aggregate::{DifficultyStats, MonthlyPlan, MonthlyPlanSpec, RatingStatsSpec};
use crate::core::error::{EntityError, StorageError, TourError, TourResult};
use crate::core::field::FieldValue;
use crate::core::query::{Condition, FindQuery, SortDirection, SortKey};
use crate::core::service::TourService;
use crate::core::stages;
use crate::core::tour::{Tour, TourDraft, TourPatch};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

const BACKEND: &str = "MongoDB";
const COLLECTION: &str = "tours";
const DUPLICATE_KEY: i32 = 11000;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn bson_date(dt: &chrono::DateTime<chrono::Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis()))
}

/// Convert a tour into a MongoDB document, renaming `id` → `_id`.
fn tour_to_document(tour: &Tour) -> TourResult<Document> {
    let json = serde_json::to_value(tour).map_err(StorageError::serialization)?;
    let mut doc = match bson::to_bson(&json).map_err(StorageError::serialization)? {
        Bson::Document(d) => d,
        _ => {
            return Err(
                StorageError::serialization("Expected BSON document, got non-object").into(),
            );
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }
    doc.insert("createdAt", bson_date(&tour.created_at));
    doc.insert(
        "startDates",
        tour.start_dates.iter().map(bson_date).collect::<Vec<_>>(),
    );

    Ok(doc)
}

/// Replace BSON dates with RFC 3339 strings, recursively.
fn dates_to_strings(value: Bson) -> Bson {
    match value {
        Bson::DateTime(dt) => chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
            .map(|dt| Bson::String(dt.to_rfc3339()))
            .unwrap_or(Bson::Null),
        Bson::Array(items) => Bson::Array(items.into_iter().map(dates_to_strings).collect()),
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .map(|(k, v)| (k, dates_to_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Convert a MongoDB document back into a tour, renaming `_id` → `id`.
fn document_to_tour(mut doc: Document) -> TourResult<Tour> {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }
    let json = dates_to_strings(Bson::Document(doc)).into_relaxed_extjson();
    serde_json::from_value(json)
        .map_err(|e| StorageError::serialization(format!("Failed to decode tour: {}", e)).into())
}

fn field_value_to_bson(value: &FieldValue) -> Bson {
    match value {
        FieldValue::String(s) => Bson::String(s.clone()),
        FieldValue::Integer(i) => Bson::Int64(*i),
        FieldValue::Float(f) => Bson::Double(*f),
        FieldValue::Boolean(b) => Bson::Boolean(*b),
        FieldValue::Uuid(id) => Bson::String(id.to_string()),
        FieldValue::DateTime(dt) => bson_date(dt),
        FieldValue::Null => Bson::Null,
    }
}

fn storage_field(field: &str) -> &str {
    if field == "id" { "_id" } else { field }
}

/// Render conditions as a filter document.
///
/// Conditions on one field share an operator document. A field and operator
/// pair seen twice goes to an `$and` list so every condition still applies.
pub(crate) fn conditions_to_filter(conditions: &[Condition]) -> Document {
    let mut filter = Document::new();
    let mut repeated: Vec<Bson> = Vec::new();
    for condition in conditions {
        let field = storage_field(&condition.field);
        let operator = condition.op.as_operator();
        let value = field_value_to_bson(&condition.value);

        match filter.get_mut(field) {
            Some(Bson::Document(ops)) if ops.contains_key(operator) => {
                repeated.push(Bson::Document(doc! { field: { operator: value } }));
            }
            Some(Bson::Document(ops)) => {
                ops.insert(operator, value);
            }
            _ => {
                filter.insert(field, doc! { operator: value });
            }
        }
    }
    if !repeated.is_empty() {
        filter.insert("$and", repeated);
    }
    filter
}

pub(crate) fn sort_to_document(keys: &[SortKey]) -> Document {
    let mut sort = keys
        .iter()
        .map(|key| {
            let direction = match key.direction {
                SortDirection::Ascending => 1,
                SortDirection::Descending => -1,
            };
            (storage_field(&key.field).to_string(), Bson::Int32(direction))
        })
        .collect::<Document>();
    // Stable paging across equal keys
    if !sort.contains_key("_id") {
        sort.insert("_id", 1);
    }
    sort
}

/// Skip and limit as the driver accepts them; both are sent as signed 64-bit
/// integers, so larger values are clamped
pub(crate) fn find_window(query: &FindQuery) -> (u64, Option<i64>) {
    let skip = query.skip.min(i64::MAX as u64);
    let limit = query
        .limit
        .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
    (skip, limit)
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn write_error(err: mongodb::error::Error, name: &str) -> TourError {
    if is_duplicate_key(&err) {
        EntityError::DuplicateName {
            name: name.to_string(),
        }
        .into()
    } else {
        StorageError::query(BACKEND, err).into()
    }
}

fn query_error(err: mongodb::error::Error) -> TourError {
    StorageError::query(BACKEND, err).into()
}

// ---------------------------------------------------------------------------
// MongoTourService
// ---------------------------------------------------------------------------

/// Tour storage service backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use tours::storage::MongoTourService;
///
/// let service = MongoTourService::connect("mongodb://localhost:27017", "natours").await?;
/// let tours = service.find(FindQuery::all()).await?;
/// service.close().await?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoTourService {
    client: Client,
    database: Database,
}

impl MongoTourService {
    /// Connect, check the server answers, and create the indexes.
    pub async fn connect(uri: &str, database: &str) -> TourResult<Self> {
        let connection_error = |e: mongodb::error::Error| StorageError::Connection {
            backend: BACKEND.to_string(),
            message: e.to_string(),
        };

        let client = Client::with_uri_str(uri).await.map_err(connection_error)?;
        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(connection_error)?;

        let service = Self { client, database };
        service.ensure_indexes().await?;

        tracing::info!(database = service.database.name(), "DB connection successful");
        Ok(service)
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(COLLECTION)
    }

    /// Create the unique index on `name`.
    ///
    /// This method is idempotent, safe to call on every startup.
    pub async fn ensure_indexes(&self) -> TourResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection()
            .create_index(index)
            .await
            .map_err(query_error)?;

        Ok(())
    }

    async fn find_visible(&self, id: &Uuid) -> TourResult<Option<Tour>> {
        let mut filter = conditions_to_filter(&[stages::secret_exclusion()]);
        filter.insert("_id", uuid_bson(id));

        self.collection()
            .find_one(filter)
            .await
            .map_err(query_error)?
            .map(document_to_tour)
            .transpose()
    }

    async fn run_pipeline(&self, pipeline: Vec<Document>) -> TourResult<Vec<Document>> {
        let started = Instant::now();
        let cursor = self
            .collection()
            .aggregate(pipeline)
            .await
            .map_err(query_error)?;
        let docs: Vec<Document> = cursor.try_collect().await.map_err(query_error)?;

        tracing::debug!(
            backend = BACKEND,
            elapsed_ms = started.elapsed().as_millis() as u64,
            count = docs.len(),
            "aggregate executed"
        );
        Ok(docs)
    }
}

/// Pipeline for [`RatingStatsSpec`]
pub(crate) fn rating_stats_pipeline(spec: &RatingStatsSpec) -> Vec<Document> {
    vec![
        doc! { "$match": conditions_to_filter(&spec.conditions()) },
        doc! {
            "$group": {
                "_id": { "$toUpper": "$difficulty" },
                "numTours": { "$sum": 1 },
                "numRatings": { "$sum": "$ratingsQuantity" },
                "avgRating": { "$avg": "$ratingsAverage" },
                "avgPrice": { "$avg": "$price" },
                "minPrice": { "$min": "$price" },
                "maxPrice": { "$max": "$price" },
            }
        },
        doc! { "$addFields": { "difficulty": "$_id" } },
        doc! { "$project": { "_id": 0 } },
        doc! { "$sort": { "avgPrice": 1 } },
    ]
}

/// Pipeline for [`MonthlyPlanSpec`]
pub(crate) fn monthly_plan_pipeline(spec: &MonthlyPlanSpec) -> Vec<Document> {
    let max_months = crate::core::aggregate::MAX_PLAN_MONTHS as i64;
    vec![
        doc! { "$match": conditions_to_filter(&spec.conditions()) },
        doc! { "$unwind": "$startDates" },
        doc! {
            "$match": {
                "startDates": { "$gte": bson_date(&spec.start), "$lt": bson_date(&spec.end) }
            }
        },
        doc! {
            "$group": {
                "_id": { "$month": "$startDates" },
                "numTourStarts": { "$sum": 1 },
                "tours": { "$push": "$name" },
            }
        },
        doc! { "$addFields": { "month": "$_id" } },
        doc! { "$project": { "_id": 0 } },
        doc! { "$sort": { "numTourStarts": -1, "month": 1 } },
        doc! { "$limit": max_months },
    ]
}

fn decode_row<T: serde::de::DeserializeOwned>(doc: Document) -> TourResult<T> {
    bson::from_document(doc).map_err(|e| StorageError::serialization(e).into())
}

#[async_trait]
impl TourService for MongoTourService {
    async fn find(&self, query: FindQuery) -> TourResult<Vec<Value>> {
        let started = Instant::now();
        let query = stages::before_find(query);

        let (skip, limit) = find_window(&query);
        let collection = self.collection();
        let mut action = collection
            .find(conditions_to_filter(&query.conditions))
            .sort(sort_to_document(&query.sort))
            .skip(skip);
        if let Some(limit) = limit {
            action = action.limit(limit);
        }

        let docs: Vec<Document> = action
            .await
            .map_err(query_error)?
            .try_collect()
            .await
            .map_err(query_error)?;

        let documents = docs
            .into_iter()
            .map(|doc| {
                let tour = document_to_tour(doc)?;
                query.projection.render(&tour)
            })
            .collect::<TourResult<Vec<Value>>>()?;

        tracing::debug!(
            backend = BACKEND,
            elapsed_ms = started.elapsed().as_millis() as u64,
            count = documents.len(),
            "find executed"
        );
        Ok(documents)
    }

    async fn get(&self, id: &Uuid) -> TourResult<Option<Tour>> {
        self.find_visible(id).await
    }

    async fn create(&self, draft: TourDraft) -> TourResult<Tour> {
        let tour = stages::prepare_for_save(draft.into_tour()?);
        let doc = tour_to_document(&tour)?;

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| write_error(e, &tour.name))?;

        tracing::debug!(backend = BACKEND, id = %tour.id, slug = %tour.slug, "tour created");
        Ok(tour)
    }

    async fn update(&self, id: &Uuid, patch: TourPatch) -> TourResult<Option<Tour>> {
        let Some(current) = self.find_visible(id).await? else {
            return Ok(None);
        };
        let updated = stages::prepare_for_save(current.apply_patch(patch)?);
        let doc = tour_to_document(&updated)?;

        let mut filter = conditions_to_filter(&[stages::secret_exclusion()]);
        filter.insert("_id", uuid_bson(id));

        let result = self
            .collection()
            .replace_one(filter, doc)
            .await
            .map_err(|e| write_error(e, &updated.name))?;

        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: &Uuid) -> TourResult<()> {
        self.collection()
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(query_error)?;

        Ok(())
    }

    async fn rating_stats(&self, spec: &RatingStatsSpec) -> TourResult<Vec<DifficultyStats>> {
        self.run_pipeline(rating_stats_pipeline(spec))
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    async fn monthly_plan(&self, spec: &MonthlyPlanSpec) -> TourResult<Vec<MonthlyPlan>> {
        self.run_pipeline(monthly_plan_pipeline(spec))
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    async fn close(&self) -> TourResult<()> {
        self.client.clone().shutdown().await;
        tracing::info!("DB connection closed");
        Ok(())
    }
}
