//! # Pagination
//!
//! Pages are taken over the collection in ascending `student_id` order, so
//! `skip` advancing by `limit` partitions the collection.

use super::errors::{RecordError, RecordResult};

/// Page size when the caller does not give one
pub const DEFAULT_LIMIT: usize = 50;

/// Upper bound applied to every page unless configured otherwise
pub const DEFAULT_MAX_LIMIT: usize = 1000;

/// A bounded, non-negative page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: usize,
    skip: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl Page {
    pub fn new(limit: usize, skip: usize) -> Self {
        Self { limit, skip }
    }

    /// Build from signed, optional parameters as they arrive from callers.
    ///
    /// Absent values take the defaults; negative values are rejected.
    pub fn from_params(limit: Option<i64>, skip: Option<i64>) -> RecordResult<Self> {
        let limit = match limit {
            Some(limit) => non_negative("limit", limit)?,
            None => DEFAULT_LIMIT,
        };
        let skip = match skip {
            Some(skip) => non_negative("skip", skip)?,
            None => 0,
        };
        Ok(Self { limit, skip })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// The next page of the same size.
    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            skip: self.skip.saturating_add(self.limit),
        }
    }

    pub(crate) fn clamp(self, max_limit: usize) -> Self {
        Self {
            limit: self.limit.min(max_limit),
            skip: self.skip,
        }
    }
}

fn non_negative(field: &str, value: i64) -> RecordResult<usize> {
    usize::try_from(value).map_err(|_| RecordError::invalid(field, "must not be negative"))
}
