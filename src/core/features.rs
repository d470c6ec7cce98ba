//! Translation of list-request options onto a pending query
//!
//! ```rust,ignore
//! let query = QueryFeatures::new(FindQuery::all(), options)
//!     .filter()?
//!     .sort()
//!     .limit_fields()
//!     .paginate()
//!     .into_query();
//! ```
//!
//! Nothing is executed here; the caller hands the resulting [`FindQuery`]
//! to a [`TourService`](crate::core::service::TourService).

use crate::core::error::{TourResult, ValidationError};
use crate::core::field::{FieldKind, FieldValue};
use crate::core::options::{Comparison, QueryOptions};
use crate::core::query::{CmpOp, Condition, FindQuery, Projection, SortKey};
use crate::core::tour::Tour;

/// Page size used when the request does not set one
pub const DEFAULT_LIMIT: u64 = 100;

/// Sort applied when the request does not set one
pub const DEFAULT_SORT: &str = "-createdAt";

impl From<Comparison> for CmpOp {
    fn from(comparison: Comparison) -> Self {
        match comparison {
            Comparison::Gte => CmpOp::Gte,
            Comparison::Gt => CmpOp::Gt,
            Comparison::Lte => CmpOp::Lte,
            Comparison::Lt => CmpOp::Lt,
        }
    }
}

/// Chainable query shaping over a pending [`FindQuery`]
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    query: FindQuery,
    options: QueryOptions,
}

impl QueryFeatures {
    pub fn new(query: FindQuery, options: QueryOptions) -> Self {
        Self { query, options }
    }

    /// Add one condition per filter parameter, values cast to the field's type
    pub fn filter(mut self) -> TourResult<Self> {
        for raw in &self.options.filters {
            let kind = Tour::field_kind(&raw.field).unwrap_or(FieldKind::Text);
            let value: FieldValue = kind.cast(&raw.value).map_err(|message| {
                ValidationError::query(raw.field.clone(), message)
            })?;
            let op = raw.comparison.map(CmpOp::from).unwrap_or(CmpOp::Eq);
            self.query
                .conditions
                .push(Condition::new(raw.field.clone(), op, value));
        }
        Ok(self)
    }

    /// Sort by the requested keys, newest first otherwise
    pub fn sort(mut self) -> Self {
        let spec = self.options.sort.as_deref().unwrap_or(DEFAULT_SORT);
        let keys: Vec<SortKey> = spec.split(',').filter_map(SortKey::parse).collect();
        self.query.sort = if keys.is_empty() {
            SortKey::parse(DEFAULT_SORT).into_iter().collect()
        } else {
            keys
        };
        self
    }

    /// Restrict the returned fields
    pub fn limit_fields(mut self) -> Self {
        let tokens: Vec<&str> = self
            .options
            .fields
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        self.query.projection = if tokens.is_empty() {
            Projection::default()
        } else if tokens.iter().all(|t| t.starts_with('-')) {
            Projection::Exclude(
                tokens
                    .iter()
                    .map(|t| t.trim_start_matches('-').to_string())
                    .collect(),
            )
        } else {
            Projection::Include(tokens.iter().map(|t| t.to_string()).collect())
        };
        self
    }

    /// Skip to the requested page; a page past the end is simply empty
    pub fn paginate(mut self) -> Self {
        let page = self.options.page.unwrap_or(1).max(1);
        let limit = match self.options.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) => limit,
        };
        self.query.skip = (page - 1).saturating_mul(limit);
        self.query.limit = Some(limit);
        self
    }

    pub fn into_query(self) -> FindQuery {
        self.query
    }
}
