//! Sequential storage reader with strict corruption detection
//!
//! Every record is checksum-verified. A truncated tail or a checksum failure
//! aborts the scan; replay never skips a bad record.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{DocumentRecord, MIN_RECORD_SIZE};
use super::STORAGE_FILE_NAME;

/// Storage reader for sequential scans.
pub struct StorageReader {
    storage_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StorageReader {
    /// Opens the storage file for reading.
    pub fn open(storage_path: &Path) -> StorageResult<Self> {
        let file = File::open(storage_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open storage file: {}", storage_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path: storage_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Opens storage from a data directory.
    pub fn open_from_data_dir(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&data_dir.join("data").join(STORAGE_FILE_NAME))
    }

    /// Returns the storage file path.
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(ROSTER_DATA_CORRUPTION)` on truncation or checksum failure
    pub fn read_next(&mut self) -> StorageResult<Option<DocumentRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated storage: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 || record_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Invalid record length {} ({} bytes remaining)",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, consumed) = DocumentRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(record))
    }

    /// Reads all records in file order.
    pub fn read_all(&mut self) -> StorageResult<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }

    /// Replays the whole file into the set of live documents keyed by
    /// `student_id`. Latest record wins; a tombstone removes the key.
    pub fn replay(&mut self) -> StorageResult<BTreeMap<String, DocumentRecord>> {
        let mut live = BTreeMap::new();
        while let Some(record) = self.read_next()? {
            if record.is_tombstone {
                live.remove(&record.student_id);
            } else {
                live.insert(record.student_id.clone(), record);
            }
        }
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageWriter;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn test_replay_latest_wins_and_tombstones_remove() {
        let temp_dir = TempDir::new().unwrap();
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();

        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer.append(&DocumentRecord::live(id_a, "S001", b"first".to_vec())).unwrap();
            writer.append(&DocumentRecord::live(id_b, "S002", b"other".to_vec())).unwrap();
            writer.append(&DocumentRecord::live(id_a, "S001", b"second".to_vec())).unwrap();
            writer.append(&DocumentRecord::tombstone(id_b, "S002")).unwrap();
        }

        let mut reader = StorageReader::open_from_data_dir(temp_dir.path()).unwrap();
        let live = reader.replay().unwrap();

        assert_eq!(live.len(), 1);
        assert_eq!(live["S001"].document_body, b"second");
        assert!(!live.contains_key("S002"));
    }

    #[test]
    fn test_truncated_tail_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer
                .append(&DocumentRecord::live(Uuid::new_v4(), "S001", b"{}".to_vec()))
                .unwrap();
            writer.path().to_path_buf()
        };

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 2);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = StorageReader::open(&path).unwrap();
        let err = reader.read_all().unwrap_err();
        assert!(err.is_fatal());
    }
}
