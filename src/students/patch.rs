//! # Partial Updates
//!
//! An update payload is parsed into a typed [`StudentPatch`] with an explicit
//! set of mutable fields. Accepted keys:
//!
//! - `first_name`, `last_name`, `age`, `active`: set the field
//! - `scores`: replace the whole subject mapping
//! - `scores.<subject>`: set a single subject score, leaving others untouched
//! - `student_id`: silently dropped (the key is immutable)
//!
//! Any other key is rejected.

use serde_json::Value;

use super::errors::{RecordError, RecordResult};
use super::model::{
    age_field, as_object, bool_field, check_age, check_name, check_subject, score_field,
    scores_field, string_field, Scores, Student,
};

/// Prefix addressing a single subject inside `scores`.
pub const SCORE_PATH_PREFIX: &str = "scores.";

/// A typed partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub active: Option<bool>,
    /// Whole-mapping replacement
    pub scores: Option<Scores>,
    /// Per-subject merge
    pub score_updates: Scores,
}

impl StudentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn replace_scores(mut self, scores: Scores) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn set_score(mut self, subject: impl Into<String>, score: i64) -> Self {
        self.score_updates.insert(subject.into(), score);
        self
    }

    /// Parse an untyped update payload.
    pub fn from_document(document: &Value) -> RecordResult<Self> {
        let object = as_object(document)?;
        let mut patch = Self::new();

        for (key, value) in object {
            match key.as_str() {
                "student_id" => {}
                "first_name" => patch.first_name = Some(string_field(key, value)?),
                "last_name" => patch.last_name = Some(string_field(key, value)?),
                "age" => patch.age = Some(age_field(value)?),
                "active" => patch.active = Some(bool_field(key, value)?),
                "scores" => patch.scores = Some(scores_field(value)?),
                _ => match key.strip_prefix(SCORE_PATH_PREFIX) {
                    Some(subject) => {
                        check_subject(subject)?;
                        patch
                            .score_updates
                            .insert(subject.to_string(), score_field(key, value)?);
                    }
                    None => return Err(RecordError::invalid(key.as_str(), "unknown field")),
                },
            }
        }

        patch.validate()?;
        Ok(patch)
    }

    /// True when the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.active.is_none()
            && self.scores.is_none()
            && self.score_updates.is_empty()
    }

    pub(crate) fn validate(&self) -> RecordResult<()> {
        if let Some(first_name) = &self.first_name {
            check_name("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            check_name("last_name", last_name)?;
        }
        if let Some(age) = self.age {
            check_age(age)?;
        }
        if let Some(scores) = &self.scores {
            if !self.score_updates.is_empty() {
                return Err(RecordError::invalid(
                    "scores",
                    "cannot replace scores and set individual subjects in one update",
                ));
            }
            for subject in scores.keys() {
                check_subject(subject)?;
            }
        }
        for subject in self.score_updates.keys() {
            check_subject(subject)?;
        }
        Ok(())
    }

    /// Apply in place. Returns whether any field value changed.
    pub(crate) fn apply(&self, student: &mut Student) -> bool {
        let before = student.clone();

        if let Some(first_name) = &self.first_name {
            student.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            student.last_name = last_name.clone();
        }
        if let Some(age) = self.age {
            student.age = age;
        }
        if let Some(active) = self.active {
            student.active = active;
        }
        if let Some(scores) = &self.scores {
            student.scores = scores.clone();
        }
        for (subject, score) in &self.score_updates {
            student.scores.insert(subject.clone(), *score);
        }

        *student != before
    }
}
