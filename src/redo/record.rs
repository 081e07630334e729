//! Decoded log records.
//!
//! [`LogRecord`] is the unit the analyzer emits: one per MLOG record in a
//! MySQL-format file, or one per flat record in a fixture file. The payload
//! is a closed enum with one structured variant per decoded record family
//! and an opaque catch-all carrying an annotation tag; display and export
//! paths pattern-match it directly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::redo::mlog::{MlogType, OperationClass};

/// Record kinds of the flat fixture format (synthetic test files).
///
/// The fixture format predates the MLOG taxonomy and numbers its kinds
/// densely from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixtureKind {
    Insert,
    Update,
    Delete,
    Commit,
    Rollback,
    Checkpoint,
    Unknown(u8),
}

impl FixtureKind {
    pub fn from_u8(code: u8) -> Self {
        match code {
            1 => FixtureKind::Insert,
            2 => FixtureKind::Update,
            3 => FixtureKind::Delete,
            4 => FixtureKind::Commit,
            5 => FixtureKind::Rollback,
            6 => FixtureKind::Checkpoint,
            v => FixtureKind::Unknown(v),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            FixtureKind::Insert => 1,
            FixtureKind::Update => 2,
            FixtureKind::Delete => 3,
            FixtureKind::Commit => 4,
            FixtureKind::Rollback => 5,
            FixtureKind::Checkpoint => 6,
            FixtureKind::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FixtureKind::Insert => "INSERT",
            FixtureKind::Update => "UPDATE",
            FixtureKind::Delete => "DELETE",
            FixtureKind::Commit => "COMMIT",
            FixtureKind::Rollback => "ROLLBACK",
            FixtureKind::Checkpoint => "CHECKPOINT",
            FixtureKind::Unknown(_) => "UNKNOWN",
        }
    }

    pub fn operation_class(&self) -> OperationClass {
        match self {
            FixtureKind::Insert => OperationClass::Insert,
            FixtureKind::Update => OperationClass::Update,
            FixtureKind::Delete => OperationClass::Delete,
            _ => OperationClass::Other,
        }
    }
}

impl std::fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureKind::Unknown(v) => write!(f, "UNKNOWN({})", v),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Which taxonomy a record's type byte was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordKind {
    /// MySQL block-format record (`mlog_id_t`).
    Mlog(MlogType),
    /// Flat fixture-format record.
    Fixture(FixtureKind),
}

impl RecordKind {
    pub fn name(&self) -> &str {
        match self {
            RecordKind::Mlog(t) => t.name(),
            RecordKind::Fixture(t) => t.name(),
        }
    }

    pub fn operation_class(&self) -> OperationClass {
        match self {
            RecordKind::Mlog(t) => t.operation_class(),
            RecordKind::Fixture(t) => t.operation_class(),
        }
    }

    /// True for the `MLOG_MULTI_REC_END` group terminator.
    pub fn is_multi_rec_end(&self) -> bool {
        matches!(self, RecordKind::Mlog(MlogType::MultiRecEnd))
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Mlog(t) => write!(f, "{}", t),
            RecordKind::Fixture(t) => write!(f, "{}", t),
        }
    }
}

/// One field of an embedded index descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    /// Field length (low 15 bits of the on-disk descriptor).
    pub length: u16,
    /// NOT NULL flag (high bit of the on-disk descriptor).
    pub not_null: bool,
}

/// Instant-column information inside an index descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct InstantColumns {
    pub n_instant_cols: u16,
    pub actual_n_fields: u16,
}

/// Index metadata embedded in REC_INSERT-family records.
///
/// Parsed on demand inside the parent record and never retained beyond it.
#[derive(Debug, Clone, Serialize)]
pub struct IndexDescriptor {
    /// Declared field count (instant-column flag stripped).
    pub n_fields: u16,
    /// Number of uniquely-determining fields.
    pub n_unique_fields: u16,
    /// Present when the instant-columns flag was set.
    pub instant_columns: Option<InstantColumns>,
    /// Per-field length and nullability descriptors.
    pub fields: Vec<FieldDescriptor>,
}

/// Record body of a REC_INSERT-family record.
#[derive(Debug, Clone, Serialize)]
pub struct InsertBody {
    /// Page cursor offset the insert applies at.
    pub cursor_offset: u16,
    /// Raw end-segment length; bit 0 flags the extra-info fields, the
    /// payload length is `end_seg_len >> 1`.
    pub end_seg_len: u64,
    /// Info and status bits, when flagged.
    pub info_bits: Option<u8>,
    /// Record origin offset, when flagged.
    pub origin_offset: Option<u64>,
    /// Mismatch index, when flagged.
    pub mismatch_index: Option<u64>,
    /// Record payload bytes; reconstructed across block boundaries.
    pub payload: Vec<u8>,
}

/// Decoded payload, one variant per structured record family.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RecordPayload {
    /// 1/2/4/8-byte page write.
    ByteWrite { value: u64, width: u8 },
    /// Insert with embedded index metadata (MLOG_REC_INSERT_8027).
    RecInsert {
        index: IndexDescriptor,
        body: InsertBody,
    },
    /// Compact-family record: index metadata plus an undecoded body.
    CompactRec {
        index: IndexDescriptor,
        bytes: Vec<u8>,
    },
    /// Page-level operation carrying an undecoded remainder.
    PageOp { bytes: Vec<u8> },
    /// Table dynamic metadata (MLOG_TABLE_DYNAMIC_META).
    DynamicMeta { version: u64, metadata: Vec<u8> },
    /// Generic string-write shape (`page_offset | length | bytes`).
    StringWrite { length: u16, bytes: Vec<u8> },
    /// Undecoded bytes with an annotation explaining why.
    Opaque { note: &'static str, bytes: Vec<u8> },
    /// Marker record with no body.
    Empty,
    /// Fixture-format record body.
    Fixture {
        timestamp: DateTime<Utc>,
        data: Vec<u8>,
    },
}

/// A single decoded redo log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Record type.
    pub kind: RecordKind,
    /// Logical bytes consumed, including the type byte.
    pub len: u32,
    /// LSN of the record's type byte.
    pub start_lsn: u64,
    /// Tablespace ID, when the kind carries one.
    pub space_id: u32,
    /// Page number, when the kind carries one.
    pub page_no: u32,
    /// Byte offset within the page (byte-write and string kinds).
    pub page_offset: u16,
    /// Table ID (dynamic-metadata kinds).
    pub table_id: u64,
    /// Index ID, when present.
    pub index_id: u64,
    /// Transaction ID (fixture records only; 0 otherwise).
    pub transaction_id: u64,
    /// Decoded payload.
    pub payload: RecordPayload,
    /// Trailer checksum of the containing physical block, informational.
    pub checksum: u32,
    /// Advisory result of the block checksum comparison.
    pub checksum_valid: bool,
    /// Mini-transaction group ID; 0 when not in a multi-record group.
    pub group_id: u32,
    /// True on the first record of a multi-record group.
    pub is_group_start: bool,
    /// True on the group's MULTI_REC_END marker.
    pub is_group_end: bool,
}

impl LogRecord {
    /// A record with the given kind and start LSN and zeroed fields; the
    /// parsers fill in what their layout provides.
    pub fn new(kind: RecordKind, start_lsn: u64) -> Self {
        LogRecord {
            kind,
            len: 1,
            start_lsn,
            space_id: 0,
            page_no: 0,
            page_offset: 0,
            table_id: 0,
            index_id: 0,
            transaction_id: 0,
            payload: RecordPayload::Empty,
            checksum: 0,
            checksum_valid: false,
            group_id: 0,
            is_group_start: false,
            is_group_end: false,
        }
    }

    /// Coarse insert/update/delete/other classification.
    pub fn operation_class(&self) -> OperationClass {
        self.kind.operation_class()
    }

    /// Raw payload bytes, for display heuristics and string search.
    ///
    /// Returns the undecoded byte range of the payload variant, or `None`
    /// for fully structured or empty bodies.
    pub fn payload_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            RecordPayload::RecInsert { body, .. } => Some(&body.payload),
            RecordPayload::CompactRec { bytes, .. } => Some(bytes),
            RecordPayload::PageOp { bytes } => Some(bytes),
            RecordPayload::DynamicMeta { metadata, .. } => Some(metadata),
            RecordPayload::StringWrite { bytes, .. } => Some(bytes),
            RecordPayload::Opaque { bytes, .. } => Some(bytes),
            RecordPayload::Fixture { data, .. } => Some(data),
            RecordPayload::ByteWrite { .. } | RecordPayload::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_kind_mapping() {
        assert_eq!(FixtureKind::from_u8(1), FixtureKind::Insert);
        assert_eq!(FixtureKind::from_u8(2), FixtureKind::Update);
        assert_eq!(FixtureKind::from_u8(3), FixtureKind::Delete);
        assert_eq!(FixtureKind::from_u8(4), FixtureKind::Commit);
        assert_eq!(FixtureKind::from_u8(5), FixtureKind::Rollback);
        assert_eq!(FixtureKind::from_u8(6), FixtureKind::Checkpoint);
        assert_eq!(FixtureKind::from_u8(99), FixtureKind::Unknown(99));
        assert_eq!(FixtureKind::from_u8(4).name(), "COMMIT");
    }

    #[test]
    fn test_fixture_kind_operation_class() {
        assert_eq!(FixtureKind::Insert.operation_class(), OperationClass::Insert);
        assert_eq!(FixtureKind::Update.operation_class(), OperationClass::Update);
        assert_eq!(FixtureKind::Delete.operation_class(), OperationClass::Delete);
        assert_eq!(FixtureKind::Commit.operation_class(), OperationClass::Other);
    }

    #[test]
    fn test_record_kind_multi_rec_end() {
        assert!(RecordKind::Mlog(MlogType::MultiRecEnd).is_multi_rec_end());
        assert!(!RecordKind::Mlog(MlogType::OneByte).is_multi_rec_end());
        assert!(!RecordKind::Fixture(FixtureKind::Commit).is_multi_rec_end());
    }

    #[test]
    fn test_new_record_defaults() {
        let rec = LogRecord::new(RecordKind::Mlog(MlogType::MultiRecEnd), 4096);
        assert_eq!(rec.len, 1);
        assert_eq!(rec.start_lsn, 4096);
        assert_eq!(rec.group_id, 0);
        assert!(!rec.is_group_start);
        assert!(!rec.is_group_end);
        assert!(rec.payload_bytes().is_none());
    }

    #[test]
    fn test_payload_bytes_variants() {
        let mut rec = LogRecord::new(RecordKind::Mlog(MlogType::WriteString), 0);
        rec.payload = RecordPayload::StringWrite {
            length: 3,
            bytes: b"abc".to_vec(),
        };
        assert_eq!(rec.payload_bytes(), Some(&b"abc"[..]));

        rec.payload = RecordPayload::ByteWrite { value: 7, width: 4 };
        assert_eq!(rec.payload_bytes(), None);
    }
}
