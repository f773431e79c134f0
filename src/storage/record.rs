//! Document storage record types
//!
//! On-disk record format:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE)
//! +------------------+
//! | Document ID      | (16 bytes, store-internal UUID)
//! +------------------+
//! | Student ID       | (length-prefixed string)
//! +------------------+
//! | Tombstone Flag   | (u8: 0 = live, 1 = deleted)
//! +------------------+
//! | Document Body    | (length-prefixed JSON bytes)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Read};

use uuid::Uuid;

/// Smallest possible record: length + document id + empty key + flag + empty body + checksum.
pub(crate) const MIN_RECORD_SIZE: usize = 4 + 16 + 4 + 1 + 4 + 4;

/// A single document record as stored on disk.
///
/// Multiple records may exist for the same `student_id`; the latest one in
/// file order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Store-internal document identifier, never exposed to callers
    pub document_id: Uuid,
    /// Business key of the document
    pub student_id: String,
    /// Whether this record masks the key (delete)
    pub is_tombstone: bool,
    /// Full JSON document (empty for tombstones)
    pub document_body: Vec<u8>,
}

impl DocumentRecord {
    /// Create a live document record
    pub fn live(document_id: Uuid, student_id: impl Into<String>, document_body: Vec<u8>) -> Self {
        Self {
            document_id,
            student_id: student_id.into(),
            is_tombstone: false,
            document_body,
        }
    }

    /// Create a tombstone for a deleted document
    pub fn tombstone(document_id: Uuid, student_id: impl Into<String>) -> Self {
        Self {
            document_id,
            student_id: student_id.into(),
            is_tombstone: true,
            document_body: Vec::new(),
        }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(16 + 4 + self.student_id.len() + 1 + 4 + self.document_body.len());

        buf.extend_from_slice(self.document_id.as_bytes());

        buf.extend_from_slice(&(self.student_id.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.student_id.as_bytes());

        buf.push(u8::from(self.is_tombstone));

        buf.extend_from_slice(&(self.document_body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.document_body);

        buf
    }

    /// Serialize the complete record to bytes, checksum included.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = super::checksum::compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying the checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);

        if !super::checksum::verify_checksum(&data[..checksum_offset], stored_checksum) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    super::checksum::compute_checksum(&data[..checksum_offset]),
                    stored_checksum
                ),
            ));
        }

        let mut cursor = io::Cursor::new(&data[4..checksum_offset]);

        let mut id_buf = [0u8; 16];
        cursor.read_exact(&mut id_buf)?;
        let document_id = Uuid::from_bytes(id_buf);

        let student_id = String::from_utf8(read_bytes(&mut cursor)?).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e))
        })?;

        let mut tombstone_buf = [0u8; 1];
        cursor.read_exact(&mut tombstone_buf)?;
        let is_tombstone = match tombstone_buf[0] {
            0 => false,
            1 => true,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid tombstone flag: {}", other),
                ))
            }
        };

        let document_body = read_bytes(&mut cursor)?;

        Ok((
            Self {
                document_id,
                student_id,
                is_tombstone,
                document_body,
            },
            record_length,
        ))
    }
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DocumentRecord {
        DocumentRecord::live(
            Uuid::new_v4(),
            "S001",
            br#"{"student_id":"S001","first_name":"Ann"}"#.to_vec(),
        )
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let serialized = record.serialize();
        let (deserialized, consumed) = DocumentRecord::deserialize(&serialized).unwrap();

        assert_eq!(record, deserialized);
        assert_eq!(consumed, serialized.len());
    }

    #[test]
    fn test_tombstone_has_empty_body() {
        let record = DocumentRecord::tombstone(Uuid::new_v4(), "S001");
        let (deserialized, _) = DocumentRecord::deserialize(&record.serialize()).unwrap();

        assert!(deserialized.is_tombstone);
        assert!(deserialized.document_body.is_empty());
        assert_eq!(deserialized.student_id, "S001");
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut serialized = sample_record().serialize();
        let mid = serialized.len() / 2;
        serialized[mid] ^= 0xFF;

        let err = DocumentRecord::deserialize(&serialized).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_record_rejected() {
        let serialized = sample_record().serialize();
        let err = DocumentRecord::deserialize(&serialized[..serialized.len() - 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_deterministic_serialization() {
        let record = sample_record();
        assert_eq!(record.serialize(), record.serialize());
    }
}
