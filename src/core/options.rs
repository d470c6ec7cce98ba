//! Typed list-request options
//!
//! The raw query string is reduced to [`QueryOptions`] at the boundary,
//! before any translation happens:
//!
//! ```text
//! GET /api/v1/tours?difficulty=easy&price[lt]=1500&sort=-price&fields=name,price&page=2&limit=5
//! ```
//!
//! - `page` and `limit` must be non-negative integers
//! - `sort` and `fields` are comma-separated lists
//! - every other key is a filter, optionally suffixed with `[gte]`, `[gt]`, `[lte]` or `[lt]`

use crate::core::error::{TourResult, ValidationError};
use regex::Regex;
use std::sync::OnceLock;

/// Query parameters that shape the result instead of filtering it
pub const RESERVED_PARAMS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Comparison suffix of a filter key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Comparison {
    fn parse(suffix: &str) -> Option<Self> {
        match suffix {
            "gte" => Some(Comparison::Gte),
            "gt" => Some(Comparison::Gt),
            "lte" => Some(Comparison::Lte),
            "lt" => Some(Comparison::Lt),
            _ => None,
        }
    }
}

/// A filter parameter as received, value not yet cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter {
    pub field: String,
    pub comparison: Option<Comparison>,
    pub value: String,
}

/// Options of a list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub filters: Vec<RawFilter>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn filter_key_pattern() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| {
        Regex::new(r"^([^\[\]]+)(?:\[([^\[\]]*)\])?$").expect("static pattern is valid")
    })
}

fn parse_count(parameter: &str, raw: &str) -> TourResult<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        ValidationError::query(parameter, format!("expected a non-negative integer, got '{raw}'"))
            .into()
    })
}

impl QueryOptions {
    /// Build options from query string pairs, in order. A repeated key keeps
    /// its last value for the reserved parameters and adds another filter
    /// otherwise.
    pub fn from_pairs<I, K, V>(pairs: I) -> TourResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = QueryOptions::default();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if !RESERVED_PARAMS.contains(&key) {
                options.filters.push(Self::parse_filter(key, value)?);
                continue;
            }
            match key {
                "page" => options.page = Some(parse_count(key, value)?),
                "limit" => options.limit = Some(parse_count(key, value)?),
                "sort" => options.sort = Some(value.to_string()),
                _ => options.fields = Some(value.to_string()),
            }
        }

        options.check_fields()?;
        Ok(options)
    }

    fn parse_filter(key: &str, value: &str) -> TourResult<RawFilter> {
        let captures = filter_key_pattern()
            .captures(key)
            .ok_or_else(|| ValidationError::query(key, "malformed filter key"))?;

        let field = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let comparison = match captures.get(2) {
            None => None,
            Some(suffix) => Some(Comparison::parse(suffix.as_str()).ok_or_else(|| {
                ValidationError::query(
                    key,
                    format!(
                        "unsupported operator '{}', expected one of gte, gt, lte, lt",
                        suffix.as_str()
                    ),
                )
            })?),
        };

        Ok(RawFilter {
            field,
            comparison,
            value: value.to_string(),
        })
    }

    fn check_fields(&self) -> TourResult<()> {
        let Some(fields) = &self.fields else {
            return Ok(());
        };
        let tokens: Vec<&str> = fields
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        let excluded = tokens.iter().filter(|t| t.starts_with('-')).count();
        if excluded > 0 && excluded < tokens.len() {
            return Err(ValidationError::query(
                "fields",
                "cannot mix included and excluded fields",
            )
            .into());
        }
        Ok(())
    }

    /// Replace the shaping parameters with a preset, keeping filters
    pub fn preset(&mut self, limit: u64, sort: &str, fields: &str) {
        self.limit = Some(limit);
        self.sort = Some(sort.to_string());
        self.fields = Some(fields.to_string());
    }
}
