//! Data-access stages run by every backend
//!
//! Backends call these explicitly: [`prepare_for_save`] before each insert
//! or replace, [`before_find`] before each read and [`before_aggregate`]
//! at the head of each report.

use crate::core::field::FieldValue;
use crate::core::query::{CmpOp, Condition, FindQuery};
use crate::core::tour::Tour;
use regex::Regex;
use std::sync::OnceLock;

/// Flag that hides a tour from every read
pub const SECRET_FIELD: &str = "secretTour";

fn separator_pattern() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern is valid"))
}

/// URL-safe lowercase form of a name: `"Sky Trek Adventure"` becomes `"sky-trek-adventure"`
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    separator_pattern()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Runs before a tour is written: the slug always follows the current name
pub fn prepare_for_save(mut tour: Tour) -> Tour {
    tour.slug = slugify(&tour.name);
    tour
}

/// Condition excluding secret tours
pub fn secret_exclusion() -> Condition {
    Condition::new(SECRET_FIELD, CmpOp::Ne, FieldValue::Boolean(true))
}

/// Runs before a find: secret tours are never returned
pub fn before_find(mut query: FindQuery) -> FindQuery {
    query.conditions.insert(0, secret_exclusion());
    query
}

/// Runs before an aggregation: the secret exclusion becomes the first match stage
pub fn before_aggregate(mut conditions: Vec<Condition>) -> Vec<Condition> {
    conditions.insert(0, secret_exclusion());
    conditions
}

pub fn is_visible(tour: &Tour) -> bool {
    !tour.secret_tour
}
