//! # Record Store
//!
//! Owns the student collection and its invariants:
//!
//! - `student_id` is unique and immutable
//! - every stored record carries all required fields
//! - `list` order is ascending `student_id`, stable on an unchanged dataset
//!
//! Callers either use the typed API ([`NewStudent`], [`StudentPatch`],
//! [`Page`]) or hand over untyped JSON through the `*_document` entry points;
//! both paths run the same validation.

mod errors;
mod model;
mod page;
mod patch;
mod store;

pub use errors::{RecordError, RecordResult};
pub use model::{NewStudent, Scores, Student, OPTIONAL_FIELDS, REQUIRED_FIELDS};
pub use page::{Page, DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};
pub use patch::{StudentPatch, SCORE_PATH_PREFIX};
pub use store::{DeleteOutcome, StoreConfig, StudentStore, UpdateOutcome};
