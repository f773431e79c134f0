//! # Student Store
//!
//! The ordered in-memory index is the uniqueness constraint: a write lock is
//! held across the existence check and the insert, so two inserts of the same
//! `student_id` cannot both succeed.
//!
//! In durable mode every mutation is appended and fsynced to document
//! storage before the index changes. A failed write leaves the index as it
//! was.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::{RecordError, RecordResult};
use super::model::{NewStudent, Student};
use super::page::{Page, DEFAULT_MAX_LIMIT};
use super::patch::StudentPatch;
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::storage::{DocumentRecord, StorageError, StorageReader, StorageWriter};

/// How a store is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root data directory. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Upper bound on `list` page size
    pub max_page_limit: usize,
}

impl StoreConfig {
    pub fn durable(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            max_page_limit: DEFAULT_MAX_LIMIT,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            max_page_limit: DEFAULT_MAX_LIMIT,
        }
    }

    pub fn with_max_page_limit(mut self, max_page_limit: usize) -> Self {
        self.max_page_limit = max_page_limit;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Result of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

struct StoredDocument {
    /// Store-internal id, stable across updates. Never exposed.
    document_id: Uuid,
    student: Student,
}

struct Collection {
    documents: BTreeMap<String, StoredDocument>,
    storage: Option<StorageWriter>,
}

/// Append to storage if the store is durable.
fn persist(storage: &mut Option<StorageWriter>, record: &DocumentRecord) -> RecordResult<()> {
    if let Some(writer) = storage.as_mut() {
        writer.append(record)?;
    }
    Ok(())
}

fn encode(student: &Student) -> RecordResult<Vec<u8>> {
    Ok(serde_json::to_vec(student)?)
}

/// The student record store.
///
/// Safe to share across threads; the HTTP facade holds it in an `Arc`.
pub struct StudentStore {
    collection: RwLock<Collection>,
    data_dir: Option<PathBuf>,
    max_page_limit: usize,
    metrics: MetricsRegistry,
}

impl StudentStore {
    /// Open a store.
    ///
    /// For a durable config this creates `<data_dir>/data/students.dat` if
    /// missing and replays it. A corrupt file fails the open; nothing is
    /// skipped.
    pub fn open(config: &StoreConfig) -> RecordResult<Self> {
        let (documents, storage) = match &config.data_dir {
            Some(data_dir) => {
                let writer = StorageWriter::open(data_dir)?;
                let documents = Self::replay(data_dir)?;
                (documents, Some(writer))
            }
            None => (BTreeMap::new(), None),
        };

        let store = Self {
            collection: RwLock::new(Collection { documents, storage }),
            data_dir: config.data_dir.clone(),
            max_page_limit: config.max_page_limit,
            metrics: MetricsRegistry::new(),
        };

        let documents = store.count()?;
        info!(
            event = Event::StoreOpened.as_str(),
            durable = store.is_durable(),
            documents,
            "store opened"
        );
        Ok(store)
    }

    /// A store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            collection: RwLock::new(Collection {
                documents: BTreeMap::new(),
                storage: None,
            }),
            data_dir: None,
            max_page_limit: DEFAULT_MAX_LIMIT,
            metrics: MetricsRegistry::new(),
        }
    }

    fn replay(data_dir: &Path) -> RecordResult<BTreeMap<String, StoredDocument>> {
        log_event(Event::ReplayBegin);

        let result = StorageReader::open_from_data_dir(data_dir)
            .and_then(|mut reader| reader.replay())
            .and_then(|records| {
                records
                    .into_iter()
                    .map(|(student_id, record)| {
                        let student: Student = serde_json::from_slice(&record.document_body)
                            .map_err(|e| {
                                StorageError::corruption_for_document(
                                    &student_id,
                                    format!("Undecodable document body: {}", e),
                                )
                            })?;
                        if student.student_id != student_id {
                            return Err(StorageError::corruption_for_document(
                                &student_id,
                                format!("Body carries student_id {}", student.student_id),
                            ));
                        }
                        let document = StoredDocument {
                            document_id: record.document_id,
                            student,
                        };
                        Ok((student_id, document))
                    })
                    .collect::<Result<BTreeMap<_, _>, StorageError>>()
            });

        match result {
            Ok(documents) => {
                info!(
                    event = Event::ReplayComplete.as_str(),
                    documents = documents.len(),
                    "storage replayed"
                );
                Ok(documents)
            }
            Err(err) => {
                error!(
                    event = Event::ReplayFailed.as_str(),
                    code = err.code().code(),
                    error = %err,
                    "storage replay failed"
                );
                Err(err.into())
            }
        }
    }

    /// Release the store. Storage is flushed on every write, so this only
    /// drops the file handle.
    pub fn close(self) {
        let documents = self.count().unwrap_or_default();
        drop(self);
        info!(event = Event::StoreClosed.as_str(), documents, "store closed");
    }

    pub fn is_durable(&self) -> bool {
        self.data_dir.is_some()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    // ==================
    // Record operations
    // ==================

    /// Insert a new student. Returns the caller-supplied `student_id`.
    pub fn insert(&self, new_student: NewStudent) -> RecordResult<String> {
        self.track(new_student.validate())?;
        let student = new_student.into_student();

        let mut guard = self.write()?;
        let Collection { documents, storage } = &mut *guard;

        if documents.contains_key(&student.student_id) {
            self.metrics.increment_duplicate_rejections();
            warn!(
                event = Event::DuplicateRejected.as_str(),
                student_id = %student.student_id,
                "duplicate student_id rejected"
            );
            return Err(RecordError::duplicate(student.student_id));
        }

        let document_id = Uuid::new_v4();
        let record = DocumentRecord::live(document_id, &student.student_id, encode(&student)?);
        self.write_through(storage, &record)?;

        let student_id = student.student_id.clone();
        documents.insert(
            student_id.clone(),
            StoredDocument {
                document_id,
                student,
            },
        );

        self.metrics.increment_inserts();
        info!(
            event = Event::StudentInserted.as_str(),
            student_id = %student_id,
            "student inserted"
        );
        Ok(student_id)
    }

    /// Insert from an untyped JSON document.
    pub fn insert_document(&self, document: &Value) -> RecordResult<String> {
        let new_student = self.track(NewStudent::from_document(document))?;
        self.insert(new_student)
    }

    /// Exact-match lookup. Absence is `Ok(None)`.
    pub fn get(&self, student_id: &str) -> RecordResult<Option<Student>> {
        self.metrics.increment_gets();
        let guard = self.read()?;
        Ok(guard.documents.get(student_id).map(|d| d.student.clone()))
    }

    /// A page of students in ascending `student_id` order.
    ///
    /// The page limit is clamped to the configured maximum.
    pub fn list(&self, page: Page) -> RecordResult<Vec<Student>> {
        self.metrics.increment_lists();
        let page = page.clamp(self.max_page_limit);
        let guard = self.read()?;
        Ok(guard
            .documents
            .values()
            .skip(page.skip())
            .take(page.limit())
            .map(|d| d.student.clone())
            .collect())
    }

    /// Apply a partial update. A missing `student_id` reports 0/0, not an
    /// error.
    pub fn update(&self, student_id: &str, patch: &StudentPatch) -> RecordResult<UpdateOutcome> {
        self.track(patch.validate())?;

        let mut guard = self.write()?;
        let Collection { documents, storage } = &mut *guard;

        let outcome = match documents.get_mut(student_id) {
            None => UpdateOutcome {
                matched_count: 0,
                modified_count: 0,
            },
            Some(stored) => {
                let mut updated = stored.student.clone();
                let modified = patch.apply(&mut updated);
                if modified {
                    let record =
                        DocumentRecord::live(stored.document_id, student_id, encode(&updated)?);
                    self.write_through(storage, &record)?;
                    stored.student = updated;
                }
                UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                }
            }
        };

        self.metrics
            .record_update(outcome.matched_count, outcome.modified_count);
        if outcome.modified_count > 0 {
            info!(
                event = Event::StudentUpdated.as_str(),
                student_id,
                "student updated"
            );
        } else {
            debug!(
                student_id,
                matched = outcome.matched_count,
                "update changed nothing"
            );
        }
        Ok(outcome)
    }

    /// Apply a partial update from an untyped JSON document.
    pub fn update_document(&self, student_id: &str, document: &Value) -> RecordResult<UpdateOutcome> {
        let patch = self.track(StudentPatch::from_document(document))?;
        self.update(student_id, &patch)
    }

    /// Remove a student. Idempotent.
    pub fn delete(&self, student_id: &str) -> RecordResult<DeleteOutcome> {
        let mut guard = self.write()?;
        let Collection { documents, storage } = &mut *guard;

        let document_id = match documents.get(student_id) {
            Some(stored) => stored.document_id,
            None => return Ok(DeleteOutcome { deleted_count: 0 }),
        };

        self.write_through(storage, &DocumentRecord::tombstone(document_id, student_id))?;
        documents.remove(student_id);

        self.metrics.add_deletes(1);
        info!(
            event = Event::StudentDeleted.as_str(),
            student_id,
            "student deleted"
        );
        Ok(DeleteOutcome { deleted_count: 1 })
    }

    /// Number of live students.
    pub fn count(&self) -> RecordResult<usize> {
        Ok(self.read()?.documents.len())
    }

    // ==================
    // Internals
    // ==================

    fn read(&self) -> RecordResult<RwLockReadGuard<'_, Collection>> {
        self.collection
            .read()
            .map_err(|_| RecordError::unavailable("Lock poisoned"))
    }

    fn write(&self) -> RecordResult<RwLockWriteGuard<'_, Collection>> {
        self.collection
            .write()
            .map_err(|_| RecordError::unavailable("Lock poisoned"))
    }

    fn write_through(
        &self,
        storage: &mut Option<StorageWriter>,
        record: &DocumentRecord,
    ) -> RecordResult<()> {
        persist(storage, record).inspect_err(|err| {
            self.metrics.increment_write_failures();
            error!(
                event = Event::WriteFailed.as_str(),
                student_id = %record.student_id,
                error = %err,
                "storage write failed"
            );
        })
    }

    /// Count and log validation rejections on the way out.
    fn track<T>(&self, result: RecordResult<T>) -> RecordResult<T> {
        if let Err(RecordError::Validation { field, reason }) = &result {
            self.metrics.increment_validation_rejections();
            debug!(
                event = Event::ValidationRejected.as_str(),
                field = %field,
                reason = %reason,
                "validation rejected"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::Scores;
    use serde_json::json;
    use tempfile::TempDir;

    fn ann() -> NewStudent {
        NewStudent::new("S001", "Ann", "Lee", 20)
    }

    #[test]
    fn test_insert_then_get_applies_defaults() {
        let store = StudentStore::in_memory();
        assert_eq!(store.insert(ann()).unwrap(), "S001");

        let student = store.get("S001").unwrap().unwrap();
        assert_eq!(student.first_name, "Ann");
        assert!(student.scores.is_empty());
        assert!(student.active);
    }

    #[test]
    fn test_duplicate_insert_leaves_original() {
        let store = StudentStore::in_memory();
        store.insert(ann()).unwrap();

        let err = store
            .insert(NewStudent::new("S001", "Bob", "Ray", 30))
            .unwrap_err();
        assert_eq!(err, RecordError::duplicate("S001"));
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("S001").unwrap().unwrap().first_name, "Ann");
        assert_eq!(store.metrics().snapshot().duplicate_rejections, 1);
    }

    #[test]
    fn test_insert_document_reports_first_missing_field() {
        let store = StudentStore::in_memory();
        let err = store
            .insert_document(&json!({"student_id": "S001", "first_name": "Ann"}))
            .unwrap_err();
        assert_eq!(err.field(), Some("last_name"));
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.metrics().snapshot().validation_rejections, 1);
    }

    #[test]
    fn test_list_is_ordered_and_clamped() {
        let store = StudentStore::open(&StoreConfig::in_memory().with_max_page_limit(2)).unwrap();
        for id in ["S003", "S001", "S002"] {
            store.insert(NewStudent::new(id, "A", "B", 20)).unwrap();
        }

        let page = store.list(Page::new(100, 0)).unwrap();
        let ids: Vec<_> = page.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(ids, ["S001", "S002"]);

        assert!(store.list(Page::new(0, 0)).unwrap().is_empty());
        assert!(store.list(Page::new(10, 5)).unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_reports_zero() {
        let store = StudentStore::in_memory();
        let outcome = store.update("nope", &StudentPatch::new().age(30)).unwrap();
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.modified_count, 0);
    }

    #[test]
    fn test_update_same_values_matches_without_modifying() {
        let store = StudentStore::in_memory();
        store.insert(ann()).unwrap();

        let outcome = store.update("S001", &StudentPatch::new().age(20)).unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.modified_count, 0);
    }

    #[test]
    fn test_update_document_merges_subject_score() {
        let store = StudentStore::in_memory();
        store
            .insert(ann().with_scores(Scores::from([
                ("math".to_string(), 80),
                ("cs".to_string(), 70),
            ])))
            .unwrap();

        store
            .update_document("S001", &json!({"scores.math": 99}))
            .unwrap();

        let student = store.get("S001").unwrap().unwrap();
        assert_eq!(student.scores["math"], 99);
        assert_eq!(student.scores["cs"], 70);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = StudentStore::in_memory();
        store.insert(ann()).unwrap();

        assert_eq!(store.delete("S001").unwrap().deleted_count, 1);
        assert_eq!(store.delete("S001").unwrap().deleted_count, 0);
        assert!(store.get("S001").unwrap().is_none());
        assert_eq!(store.metrics().snapshot().deletes, 1);
    }

    #[test]
    fn test_durable_store_keeps_document_id_across_updates() {
        let temp_dir = TempDir::new().unwrap();
        let store = StudentStore::open(&StoreConfig::durable(temp_dir.path())).unwrap();
        store.insert(ann()).unwrap();
        store.update("S001", &StudentPatch::new().age(21)).unwrap();

        let first = store.read().unwrap().documents["S001"].document_id;
        store.close();

        let reopened = StudentStore::open(&StoreConfig::durable(temp_dir.path())).unwrap();
        assert_eq!(reopened.read().unwrap().documents["S001"].document_id, first);
        assert_eq!(reopened.get("S001").unwrap().unwrap().age, 21);
    }

    #[test]
    fn test_open_rejects_body_with_mismatched_key() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            let body = serde_json::to_vec(&ann().into_student()).unwrap();
            writer
                .append(&DocumentRecord::live(Uuid::new_v4(), "S999", body))
                .unwrap();
        }

        let err = StudentStore::open(&StoreConfig::durable(temp_dir.path()))
            .err()
            .unwrap();
        assert_eq!(err.code(), "ROSTER_STORE_UNAVAILABLE");
        assert!(err.to_string().contains("S999"));
    }
}
