//! The tour document, its input shapes and its validation rules

use crate::core::error::TourResult;
use crate::core::field::{FieldKind, FieldValue};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;
use validator::{Validate, ValidationError as RuleViolation};

/// Default rating given to a tour nobody has rated yet
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.5;

/// Tour difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

/// A stored tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_price_discount"))]
pub struct Tour {
    pub id: Uuid,

    #[validate(
        length(min = 10, max = 40, message = "A tour name must have between 10 and 40 characters"),
        custom(function = "validate_name_letters")
    )]
    pub name: String,

    #[serde(default)]
    pub slug: String,

    pub price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<f64>,

    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub duration: f64,

    pub max_group_size: u32,

    pub difficulty: Difficulty,

    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    #[serde(default = "default_ratings_average")]
    pub ratings_average: f64,

    #[serde(default)]
    pub ratings_quantity: u32,

    pub image_cover: String,

    #[serde(default)]
    pub images: Vec<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,

    #[serde(default)]
    pub secret_tour: bool,

    #[serde(rename = "__v", default)]
    pub revision: u32,
}

fn default_ratings_average() -> f64 {
    DEFAULT_RATINGS_AVERAGE
}

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z\s]+$").expect("static pattern is valid"))
}

fn validate_name_letters(name: &str) -> Result<(), RuleViolation> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(RuleViolation::new("name")
            .with_message("Tour name must only contain letters and spaces".into()))
    }
}

fn validate_price_discount(tour: &Tour) -> Result<(), RuleViolation> {
    match tour.price_discount {
        Some(discount) if discount >= tour.price => Err(RuleViolation::new("priceDiscount")
            .with_message(
                format!(
                    "Discount price ({discount}) should be below the regular price ({})",
                    tour.price
                )
                .into(),
            )),
        _ => Ok(()),
    }
}

impl Tour {
    /// Merge a partial update onto a copy of this tour.
    ///
    /// The merged document is validated again and its revision bumped; the
    /// slug is left for the save stage to recompute.
    pub fn apply_patch(&self, patch: TourPatch) -> TourResult<Tour> {
        let mut tour = self.clone();

        if let Some(name) = patch.name {
            tour.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            tour.price = price;
        }
        if let Some(discount) = patch.price_discount {
            tour.price_discount = discount;
        }
        if let Some(summary) = patch.summary {
            tour.summary = summary.trim().to_string();
        }
        if let Some(description) = patch.description {
            tour.description = description.map(|d| d.trim().to_string());
        }
        if let Some(duration) = patch.duration {
            tour.duration = duration;
        }
        if let Some(size) = patch.max_group_size {
            tour.max_group_size = size;
        }
        if let Some(difficulty) = patch.difficulty {
            tour.difficulty = difficulty;
        }
        if let Some(avg) = patch.ratings_average {
            tour.ratings_average = avg;
        }
        if let Some(quantity) = patch.ratings_quantity {
            tour.ratings_quantity = quantity;
        }
        if let Some(cover) = patch.image_cover {
            tour.image_cover = cover;
        }
        if let Some(images) = patch.images {
            tour.images = images;
        }
        if let Some(dates) = patch.start_dates {
            tour.start_dates = dates;
        }
        if let Some(secret) = patch.secret_tour {
            tour.secret_tour = secret;
        }

        tour.validate()?;
        tour.revision += 1;
        Ok(tour)
    }

    /// Full JSON representation, including the `durationWeeks` virtual
    pub fn to_json(&self) -> TourResult<Value> {
        let mut value = serde_json::to_value(self)
            .map_err(crate::core::error::StorageError::serialization)?;
        if let Value::Object(map) = &mut value {
            map.insert("durationWeeks".to_string(), Value::from(self.duration / 7.0));
        }
        Ok(value)
    }

    /// Declared kind of a top-level field, by its JSON name
    pub fn field_kind(field: &str) -> Option<FieldKind> {
        let kind = match field {
            "id" => FieldKind::Id,
            "name" | "slug" | "summary" | "description" | "difficulty" | "imageCover"
            | "images" => FieldKind::Text,
            "price" | "priceDiscount" | "duration" | "maxGroupSize" | "ratingsAverage"
            | "ratingsQuantity" | "__v" => FieldKind::Number,
            "secretTour" => FieldKind::Boolean,
            "createdAt" | "startDates" => FieldKind::Timestamp,
            _ => return None,
        };
        Some(kind)
    }

    /// Values held by a field; arrays yield every element, unknown or unset
    /// fields yield nothing
    pub fn field_values(&self, field: &str) -> Vec<FieldValue> {
        match field {
            "id" => vec![FieldValue::Uuid(self.id)],
            "name" => vec![FieldValue::String(self.name.clone())],
            "slug" => vec![FieldValue::String(self.slug.clone())],
            "price" => vec![FieldValue::Float(self.price)],
            "priceDiscount" => self.price_discount.map(FieldValue::Float).into_iter().collect(),
            "summary" => vec![FieldValue::String(self.summary.clone())],
            "description" => self
                .description
                .clone()
                .map(FieldValue::String)
                .into_iter()
                .collect(),
            "duration" => vec![FieldValue::Float(self.duration)],
            "maxGroupSize" => vec![FieldValue::Integer(self.max_group_size as i64)],
            "difficulty" => vec![FieldValue::String(self.difficulty.as_str().to_string())],
            "ratingsAverage" => vec![FieldValue::Float(self.ratings_average)],
            "ratingsQuantity" => vec![FieldValue::Integer(self.ratings_quantity as i64)],
            "imageCover" => vec![FieldValue::String(self.image_cover.clone())],
            "images" => self.images.iter().cloned().map(FieldValue::String).collect(),
            "createdAt" => vec![FieldValue::DateTime(self.created_at)],
            "startDates" => self.start_dates.iter().copied().map(FieldValue::DateTime).collect(),
            "secretTour" => vec![FieldValue::Boolean(self.secret_tour)],
            "__v" => vec![FieldValue::Integer(self.revision as i64)],
            _ => Vec::new(),
        }
    }
}

/// Body of a create request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDraft {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub price_discount: Option<f64>,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: f64,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    #[serde(default = "default_ratings_average")]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: u32,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
}

impl TourDraft {
    /// Assign identity and creation time, then validate
    pub fn into_tour(self) -> TourResult<Tour> {
        let tour = Tour {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            slug: String::new(),
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary.trim().to_string(),
            description: self.description.map(|d| d.trim().to_string()),
            duration: self.duration,
            max_group_size: self.max_group_size,
            difficulty: self.difficulty,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            image_cover: self.image_cover,
            images: self.images,
            created_at: Utc::now(),
            start_dates: self.start_dates,
            secret_tour: self.secret_tour,
            revision: 0,
        };
        tour.validate()?;
        Ok(tour)
    }
}

/// Present-but-null decodes to `Some(None)`, absent stays `None`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of an update request; absent fields keep their stored value.
///
/// The optional fields `priceDiscount` and `description` are cleared by an
/// explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub price_discount: Option<Option<f64>>,
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub duration: Option<f64>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub ratings_average: Option<f64>,
    pub ratings_quantity: Option<u32>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
}
