//! # Student Model
//!
//! `Student` is the stored document shape. `NewStudent` is insert input;
//! it only becomes a `Student` once defaults are applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{RecordError, RecordResult};

/// Subject name -> integer score
pub type Scores = BTreeMap<String, i64>;

/// Fields accepted on insert, in the order presence is checked for the
/// required ones.
pub const REQUIRED_FIELDS: [&str; 4] = ["student_id", "first_name", "last_name", "age"];
pub const OPTIONAL_FIELDS: [&str; 2] = ["scores", "active"];

/// A stored student record.
///
/// The store-internal document id is not part of this type and never leaves
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    #[serde(default)]
    pub scores: Scores,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Insert input. `scores` and `active` are optional and defaulted on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub scores: Option<Scores>,
    pub active: Option<bool>,
}

impl NewStudent {
    pub fn new(
        student_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: i64,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
            scores: None,
            active: None,
        }
    }

    pub fn with_scores(mut self, scores: Scores) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Parse an untyped JSON document.
    ///
    /// Presence of the required fields is checked first, in
    /// [`REQUIRED_FIELDS`] order, so the error names the first missing one.
    /// A JSON `null` counts as absent. Unknown keys are rejected.
    pub fn from_document(document: &Value) -> RecordResult<Self> {
        let object = as_object(document)?;

        for field in REQUIRED_FIELDS {
            if present(object, field).is_none() {
                return Err(RecordError::missing(field));
            }
        }

        for key in object.keys() {
            if !REQUIRED_FIELDS.contains(&key.as_str()) && !OPTIONAL_FIELDS.contains(&key.as_str())
            {
                return Err(RecordError::invalid(key.as_str(), "unknown field"));
            }
        }

        let new_student = Self {
            student_id: string_field("student_id", &object["student_id"])?,
            first_name: string_field("first_name", &object["first_name"])?,
            last_name: string_field("last_name", &object["last_name"])?,
            age: age_field(&object["age"])?,
            scores: present(object, "scores").map(scores_field).transpose()?,
            active: present(object, "active")
                .map(|v| bool_field("active", v))
                .transpose()?,
        };

        new_student.validate()?;
        Ok(new_student)
    }

    /// Value-level checks that typed construction cannot express.
    pub(crate) fn validate(&self) -> RecordResult<()> {
        if self.student_id.is_empty() {
            return Err(RecordError::invalid("student_id", "must not be empty"));
        }
        check_name("first_name", &self.first_name)?;
        check_name("last_name", &self.last_name)?;
        check_age(self.age)?;
        if let Some(scores) = &self.scores {
            for subject in scores.keys() {
                check_subject(subject)?;
            }
        }
        Ok(())
    }

    /// Apply insert defaults.
    pub(crate) fn into_student(self) -> Student {
        Student {
            student_id: self.student_id,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            scores: self.scores.unwrap_or_default(),
            active: self.active.unwrap_or(true),
        }
    }
}

// ==================
// Field helpers shared with patch parsing
// ==================

pub(crate) fn as_object(document: &Value) -> RecordResult<&Map<String, Value>> {
    document
        .as_object()
        .ok_or_else(|| RecordError::invalid("document", "expected a JSON object"))
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).filter(|v| !v.is_null())
}

pub(crate) fn string_field(field: &str, value: &Value) -> RecordResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RecordError::invalid(field, "expected a string"))
}

pub(crate) fn bool_field(field: &str, value: &Value) -> RecordResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| RecordError::invalid(field, "expected a boolean"))
}

pub(crate) fn age_field(value: &Value) -> RecordResult<i64> {
    let age = value
        .as_i64()
        .ok_or_else(|| RecordError::invalid("age", "expected an integer"))?;
    check_age(age)?;
    Ok(age)
}

pub(crate) fn score_field(field: &str, value: &Value) -> RecordResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| RecordError::invalid(field, "expected an integer score"))
}

pub(crate) fn scores_field(value: &Value) -> RecordResult<Scores> {
    let object = value
        .as_object()
        .ok_or_else(|| RecordError::invalid("scores", "expected an object of subject scores"))?;

    let mut scores = Scores::new();
    for (subject, score) in object {
        check_subject(subject)?;
        scores.insert(subject.clone(), score_field(&format!("scores.{}", subject), score)?);
    }
    Ok(scores)
}

pub(crate) fn check_name(field: &str, name: &str) -> RecordResult<()> {
    if name.trim().is_empty() {
        return Err(RecordError::invalid(field, "must not be empty"));
    }
    Ok(())
}

pub(crate) fn check_age(age: i64) -> RecordResult<()> {
    if age < 0 {
        return Err(RecordError::invalid("age", "must not be negative"));
    }
    Ok(())
}

pub(crate) fn check_subject(subject: &str) -> RecordResult<()> {
    if subject.is_empty() {
        return Err(RecordError::invalid("scores", "subject name must not be empty"));
    }
    if subject.contains('.') {
        return Err(RecordError::invalid(
            format!("scores.{}", subject),
            "subject name must not contain '.'",
        ));
    }
    Ok(())
}
