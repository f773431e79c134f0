//! Storage writer with fsync enforcement
//!
//! The storage file is append-only: updates append a full new document,
//! deletes append a tombstone. A write is not acknowledged until fsync
//! returns.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::DocumentRecord;
use super::STORAGE_FILE_NAME;

/// Append-only writer over `<data_dir>/data/students.dat`.
pub struct StorageWriter {
    storage_path: PathBuf,
    file: File,
    current_offset: u64,
}

impl StorageWriter {
    /// Opens or creates the storage file under `data_dir`.
    ///
    /// Creates `<data_dir>/data/` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ROSTER_STORAGE_WRITE_FAILED` if the directory or file cannot
    /// be created or opened.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let data_subdir = data_dir.join("data");
        let storage_path = data_subdir.join(STORAGE_FILE_NAME);

        fs::create_dir_all(&data_subdir).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to create data directory: {}", data_subdir.display()),
                e,
            )
        })?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&storage_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open storage file: {}", storage_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path,
            file,
            current_offset,
        })
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the current end-of-file offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a record and fsyncs.
    ///
    /// Returns the byte offset where the record starts. On failure the file
    /// is cut back to the last acknowledged offset, so a torn or unsynced
    /// record never precedes later writes.
    pub fn append(&mut self, record: &DocumentRecord) -> StorageResult<u64> {
        let serialized = record.serialize();
        let offset = self.current_offset;

        if let Err(e) = self.file.write_all(&serialized) {
            self.discard_uncommitted();
            return Err(StorageError::write_failed(
                format!("Failed to write document: {}", record.student_id),
                e,
            ));
        }

        if let Err(e) = self.file.sync_all() {
            self.discard_uncommitted();
            return Err(StorageError::write_failed(
                format!("fsync failed after writing document: {}", record.student_id),
                e,
            ));
        }

        self.current_offset += serialized.len() as u64;
        Ok(offset)
    }

    /// Truncates anything past the last acknowledged offset.
    ///
    /// Best effort: the caller is already reporting a write failure.
    pub fn discard_uncommitted(&mut self) {
        if self.file.set_len(self.current_offset).is_ok() {
            let _ = self.file.sync_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageReader;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let data_path = temp_dir.path().join("data");
        assert!(!data_path.exists());

        let _writer = StorageWriter::open(temp_dir.path()).unwrap();

        assert!(data_path.join(STORAGE_FILE_NAME).exists());
    }

    #[test]
    fn test_offset_tracking() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        assert_eq!(writer.current_offset(), 0);

        let first = writer
            .append(&DocumentRecord::live(Uuid::new_v4(), "S001", b"{}".to_vec()))
            .unwrap();
        let second = writer
            .append(&DocumentRecord::live(Uuid::new_v4(), "S002", b"{}".to_vec()))
            .unwrap();

        assert_eq!(first, 0);
        assert!(second > first);
        assert_eq!(writer.current_offset(), std::fs::metadata(writer.path()).unwrap().len());
    }

    #[test]
    fn test_reopen_appends_after_existing_records() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer
                .append(&DocumentRecord::live(Uuid::new_v4(), "S001", b"{}".to_vec()))
                .unwrap();
        }
        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            assert!(writer.current_offset() > 0);
            writer
                .append(&DocumentRecord::tombstone(Uuid::new_v4(), "S001"))
                .unwrap();
        }

        let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].is_tombstone);
    }

    #[test]
    fn test_discard_uncommitted_drops_torn_tail() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        writer
            .append(&DocumentRecord::live(Uuid::new_v4(), "S001", b"{}".to_vec()))
            .unwrap();
        let committed = writer.current_offset();

        // Half of a record, as left behind by an interrupted write
        let torn = DocumentRecord::live(Uuid::new_v4(), "S002", b"{}".to_vec()).serialize();
        let mut raw = OpenOptions::new().append(true).open(writer.path()).unwrap();
        raw.write_all(&torn[..torn.len() / 2]).unwrap();
        drop(raw);
        assert!(std::fs::metadata(writer.path()).unwrap().len() > committed);

        writer.discard_uncommitted();
        assert_eq!(std::fs::metadata(writer.path()).unwrap().len(), committed);

        writer
            .append(&DocumentRecord::live(Uuid::new_v4(), "S003", b"{}".to_vec()))
            .unwrap();

        let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
        let live = reader.replay().unwrap();
        assert_eq!(live.len(), 2);
        assert!(live.contains_key("S001"));
        assert!(live.contains_key("S003"));
    }
}
