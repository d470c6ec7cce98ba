//! Core module containing the tour model, query shaping and the data-access trait

pub mod aggregate;
pub mod error;
pub mod features;
pub mod field;
pub mod options;
pub mod query;
pub mod service;
pub mod stages;
pub mod tour;

pub use aggregate::{DifficultyStats, MonthlyPlan, MonthlyPlanSpec, RatingStatsSpec};
pub use error::{TourError, TourResult};
pub use features::QueryFeatures;
pub use field::{FieldKind, FieldValue};
pub use options::QueryOptions;
pub use query::{CmpOp, Condition, FindQuery, Projection, SortKey};
pub use service::TourService;
pub use tour::{Difficulty, Tour, TourDraft, TourPatch};
