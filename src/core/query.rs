//! Deferred find queries
//!
//! A [`FindQuery`] describes a read against the tour collection without
//! running it: conditions, sort keys, projection, skip and limit. Backends
//! execute it once, either by translating it to a native query or by
//! evaluating it in memory with [`FindQuery::execute`].

use crate::core::error::TourResult;
use crate::core::field::FieldValue;
use crate::core::tour::Tour;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    /// Operator name in the document store's query language
    pub fn as_operator(&self) -> &'static str {
        match self {
            CmpOp::Eq => "$eq",
            CmpOp::Ne => "$ne",
            CmpOp::Gt => "$gt",
            CmpOp::Gte => "$gte",
            CmpOp::Lt => "$lt",
            CmpOp::Lte => "$lte",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Gte => ordering != Ordering::Less,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A single predicate on a top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: CmpOp,
    pub value: FieldValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: CmpOp, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Evaluate against a tour. Array fields match when any element does;
    /// `Ne` also matches when the field is unset.
    pub fn matches(&self, tour: &Tour) -> bool {
        let values = tour.field_values(&self.field);
        if self.op == CmpOp::Ne {
            return values
                .iter()
                .all(|v| v.compare(&self.value) != Some(Ordering::Equal));
        }
        values.iter().any(|v| {
            v.compare(&self.value)
                .is_some_and(|ordering| self.op.accepts(ordering))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort key; earlier keys take precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse `field` or `-field`
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        match token.strip_prefix('-') {
            Some("") => None,
            Some(field) => Some(Self::desc(field)),
            None if token.is_empty() => None,
            None => Some(Self::asc(token)),
        }
    }

    /// Compare two tours on this key; unset values sort lowest
    pub fn compare(&self, a: &Tour, b: &Tour) -> Ordering {
        let left = a.field_values(&self.field).into_iter().next();
        let right = b.field_values(&self.field).into_iter().next();
        let ordering = match (left, right) {
            (Some(l), Some(r)) => l.sort_cmp(&r),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Which fields a read returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only these fields, plus `id`
    Include(Vec<String>),
    /// Everything except these fields; `createdAt` is always dropped
    Exclude(Vec<String>),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Exclude(vec!["__v".to_string()])
    }
}

impl Projection {
    /// Render a tour to JSON through this projection
    pub fn render(&self, tour: &Tour) -> TourResult<Value> {
        let full = match tour.to_json()? {
            Value::Object(map) => map,
            other => return Ok(other),
        };

        let projected: Map<String, Value> = match self {
            Projection::Include(fields) => full
                .into_iter()
                .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                .collect(),
            Projection::Exclude(fields) => full
                .into_iter()
                .filter(|(key, _)| key != "createdAt" && !fields.iter().any(|f| f == key))
                .collect(),
        };
        Ok(Value::Object(projected))
    }
}

/// A pending, not yet executed, read of tours
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    /// Every tour, unsorted, default projection
    pub fn all() -> Self {
        Self {
            conditions: Vec::new(),
            sort: Vec::new(),
            projection: Projection::default(),
            skip: 0,
            limit: None,
        }
    }

    /// The tour with this identifier
    pub fn by_id(id: Uuid) -> Self {
        let mut query = Self::all();
        query.conditions.push(Condition::new("id", CmpOp::Eq, FieldValue::Uuid(id)));
        query.limit = Some(1);
        query
    }

    pub fn matches(&self, tour: &Tour) -> bool {
        self.conditions.iter().all(|c| c.matches(tour))
    }

    /// Compare two tours by the sort keys, in order
    pub fn compare(&self, a: &Tour, b: &Tour) -> Ordering {
        self.sort
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Evaluate the query over an in-memory collection
    pub fn execute<'a, I>(&self, tours: I) -> TourResult<Vec<Value>>
    where
        I: IntoIterator<Item = &'a Tour>,
    {
        let mut matched: Vec<&Tour> = tours.into_iter().filter(|t| self.matches(t)).collect();
        // stable, so insertion order breaks ties
        matched.sort_by(|a, b| self.compare(a, b));

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|tour| self.projection.render(tour))
            .collect()
    }
}
