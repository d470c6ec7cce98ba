//! Report definitions: rating statistics and the monthly plan
//!
//! Each spec knows its match conditions and can evaluate itself over an
//! in-memory collection. The MongoDB backend turns the same specs into
//! aggregation pipelines.

use crate::core::error::{TourResult, ValidationError};
use crate::core::field::FieldValue;
use crate::core::query::{CmpOp, Condition};
use crate::core::stages;
use crate::core::tour::Tour;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of months a plan can report at most
pub const MAX_PLAN_MONTHS: usize = 12;

/// Statistics of the tours sharing a difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    /// Uppercased difficulty, e.g. `EASY`
    pub difficulty: String,
    pub num_tours: u64,
    pub num_ratings: u64,
    pub avg_rating: f64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Rating statistics over well rated tours, grouped by difficulty
#[derive(Debug, Clone, PartialEq)]
pub struct RatingStatsSpec {
    pub min_rating: f64,
}

impl Default for RatingStatsSpec {
    fn default() -> Self {
        Self { min_rating: 4.5 }
    }
}

impl RatingStatsSpec {
    /// Match stage, secret exclusion first
    pub fn conditions(&self) -> Vec<Condition> {
        stages::before_aggregate(vec![Condition::new(
            "ratingsAverage",
            CmpOp::Gte,
            FieldValue::Float(self.min_rating),
        )])
    }

    /// Groups sorted by ascending average price
    pub fn evaluate<'a, I>(&self, tours: I) -> Vec<DifficultyStats>
    where
        I: IntoIterator<Item = &'a Tour>,
    {
        let conditions = self.conditions();
        let mut groups: IndexMap<String, Vec<&Tour>> = IndexMap::new();
        for tour in tours {
            if conditions.iter().all(|c| c.matches(tour)) {
                groups
                    .entry(tour.difficulty.as_str().to_uppercase())
                    .or_default()
                    .push(tour);
            }
        }

        let mut stats: Vec<DifficultyStats> = groups
            .into_iter()
            .map(|(difficulty, members)| {
                let count = members.len() as f64;
                DifficultyStats {
                    difficulty,
                    num_tours: members.len() as u64,
                    num_ratings: members.iter().map(|t| t.ratings_quantity as u64).sum(),
                    avg_rating: members.iter().map(|t| t.ratings_average).sum::<f64>() / count,
                    avg_price: members.iter().map(|t| t.price).sum::<f64>() / count,
                    min_price: members.iter().map(|t| t.price).fold(f64::INFINITY, f64::min),
                    max_price: members
                        .iter()
                        .map(|t| t.price)
                        .fold(f64::NEG_INFINITY, f64::max),
                }
            })
            .collect();
        stats.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));
        stats
    }
}

/// Tour starts within one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPlan {
    /// 1 for January through 12 for December
    pub month: u32,
    pub num_tour_starts: u64,
    pub tours: Vec<String>,
}

/// Start dates of one year, grouped by month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPlanSpec {
    pub year: i32,
    /// First instant of the year
    pub start: DateTime<Utc>,
    /// First instant of the following year, exclusive
    pub end: DateTime<Utc>,
}

impl MonthlyPlanSpec {
    pub fn new(year: i32) -> TourResult<Self> {
        let first_of = |y: i32| {
            NaiveDate::from_ymd_opt(y, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        };
        match (first_of(year), year.checked_add(1).and_then(first_of)) {
            (Some(start), Some(end)) => Ok(Self { year, start, end }),
            _ => Err(ValidationError::InvalidYear {
                value: year.to_string(),
            }
            .into()),
        }
    }

    /// Parse a path segment as a year
    pub fn parse(raw: &str) -> TourResult<Self> {
        let year = raw.trim().parse::<i32>().map_err(|_| ValidationError::InvalidYear {
            value: raw.to_string(),
        })?;
        Self::new(year)
    }

    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        *date >= self.start && *date < self.end
    }

    /// Match stage, secret exclusion first
    pub fn conditions(&self) -> Vec<Condition> {
        stages::before_aggregate(Vec::new())
    }

    /// One row per month with starts, busiest month first, at most twelve
    pub fn evaluate<'a, I>(&self, tours: I) -> Vec<MonthlyPlan>
    where
        I: IntoIterator<Item = &'a Tour>,
    {
        let conditions = self.conditions();
        let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for tour in tours {
            if !conditions.iter().all(|c| c.matches(tour)) {
                continue;
            }
            for date in tour.start_dates.iter().filter(|d| self.contains(d)) {
                months.entry(date.month()).or_default().push(tour.name.clone());
            }
        }

        let mut plan: Vec<MonthlyPlan> = months
            .into_iter()
            .map(|(month, tours)| MonthlyPlan {
                month,
                num_tour_starts: tours.len() as u64,
                tours,
            })
            .collect();
        plan.sort_by(|a, b| {
            b.num_tour_starts
                .cmp(&a.num_tour_starts)
                .then(a.month.cmp(&b.month))
        });
        plan.truncate(MAX_PLAN_MONTHS);
        plan
    }
}
