//! Flat fixture log format.
//!
//! The synthetic test harness writes a much simpler file than MySQL: a
//! 64-byte little-endian header followed by self-delimiting records, each
//! carrying a fixed 42-byte field header, a payload, and a trailing additive
//! checksum. Files in this format are small (the auto-detector assumes
//! anything up to 1 MB is a fixture), which is why the reader just loads the
//! whole image.
//!
//! Layout:
//!
//! | Offset | Size | Header field |
//! |--------|------|--------------|
//! | 0 | 8 | group_id |
//! | 8 | 8 | start_lsn |
//! | 16 | 4 | file_no |
//! | 20 | 8 | created (Unix seconds) |
//! | 28 | 8 | last_checkpoint |
//! | 36 | 4 | format |
//! | 40 | 24 | reserved (zero) |
//!
//! Records: `type u8 | total_len u32 | lsn u64 | timestamp u64 | txn_id u64 |
//! table_id u32 | index_id u32 | space_id u32 | page_no u32 | page_offset u16
//! | payload ... | checksum u32`, all little-endian. Payloads shorter than
//! the declared `total_len` are zero-padded.

use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::redo::record::{FixtureKind, LogRecord, RecordKind, RecordPayload};
use crate::RedoError;

/// Size of the fixture file header.
pub const FIXTURE_HDR_SIZE: usize = 64;
/// Bytes before the payload: type (1) + total_len (4) + field header (42).
pub const FIXTURE_REC_FIXED: usize = 47;
/// Smallest well-formed record: fixed part plus the trailing checksum.
pub const FIXTURE_REC_MIN: usize = FIXTURE_REC_FIXED + 4;

/// Fixture file header.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureHeader {
    pub group_id: u64,
    pub start_lsn: u64,
    pub file_no: u32,
    pub created: DateTime<Utc>,
    pub last_checkpoint: u64,
    pub format: u32,
}

impl FixtureHeader {
    /// Parse the 64-byte header.
    pub fn parse(data: &[u8]) -> Result<Self, RedoError> {
        if data.len() < FIXTURE_HDR_SIZE {
            return Err(RedoError::TruncatedHeader(format!(
                "fixture header needs {} bytes, file has {}",
                FIXTURE_HDR_SIZE,
                data.len()
            )));
        }
        let created_unix = LittleEndian::read_u64(&data[20..28]);
        Ok(FixtureHeader {
            group_id: LittleEndian::read_u64(&data[0..8]),
            start_lsn: LittleEndian::read_u64(&data[8..16]),
            file_no: LittleEndian::read_u32(&data[16..20]),
            created: DateTime::from_timestamp(created_unix as i64, 0).unwrap_or_default(),
            last_checkpoint: LittleEndian::read_u64(&data[28..36]),
            format: LittleEndian::read_u32(&data[36..40]),
        })
    }

    /// Encode the 64-byte header.
    pub fn encode(&self) -> [u8; FIXTURE_HDR_SIZE] {
        let mut buf = [0u8; FIXTURE_HDR_SIZE];
        LittleEndian::write_u64(&mut buf[0..8], self.group_id);
        LittleEndian::write_u64(&mut buf[8..16], self.start_lsn);
        LittleEndian::write_u32(&mut buf[16..20], self.file_no);
        LittleEndian::write_u64(&mut buf[20..28], self.created.timestamp().max(0) as u64);
        LittleEndian::write_u64(&mut buf[28..36], self.last_checkpoint);
        LittleEndian::write_u32(&mut buf[36..40], self.format);
        buf
    }
}

/// Additive checksum the fixture writer stores after each payload.
pub fn fixture_checksum(data: &[u8]) -> u32 {
    data.iter().map(|&b| u32::from(b)).sum()
}

/// Reader over a fixture-format byte image.
pub struct FixtureReader {
    data: Vec<u8>,
    header: FixtureHeader,
    cursor: usize,
}

impl FixtureReader {
    /// Open and load a fixture file.
    pub fn open(path: &str) -> Result<Self, RedoError> {
        let data = std::fs::read(path)
            .map_err(|e| RedoError::Io(format!("Cannot open {}: {}", path, e)))?;
        Self::from_bytes(data)
    }

    /// Wrap an in-memory fixture image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RedoError> {
        let header = FixtureHeader::parse(&data)?;
        Ok(FixtureReader {
            data,
            header,
            cursor: FIXTURE_HDR_SIZE,
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &FixtureHeader {
        &self.header
    }

    /// Decode the next record, or `Ok(None)` at the end of the file.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>, RedoError> {
        if self.cursor >= self.data.len() {
            return Ok(None);
        }
        let rest = &self.data[self.cursor..];
        if rest.len() < 5 {
            return Err(RedoError::Parse(format!(
                "{} trailing bytes are too short for a record header",
                rest.len()
            )));
        }

        let kind = FixtureKind::from_u8(rest[0]);
        let total_len = LittleEndian::read_u32(&rest[1..5]) as usize;
        if total_len < FIXTURE_REC_MIN || total_len > rest.len() {
            return Err(RedoError::Parse(format!(
                "record at offset {} declares {} bytes ({} available, minimum {})",
                self.cursor,
                total_len,
                rest.len(),
                FIXTURE_REC_MIN
            )));
        }

        let rec_bytes = &rest[..total_len];
        let lsn = LittleEndian::read_u64(&rec_bytes[5..13]);
        let timestamp_unix = LittleEndian::read_u64(&rec_bytes[13..21]);
        let transaction_id = LittleEndian::read_u64(&rec_bytes[21..29]);
        let table_id = LittleEndian::read_u32(&rec_bytes[29..33]);
        let index_id = LittleEndian::read_u32(&rec_bytes[33..37]);
        let space_id = LittleEndian::read_u32(&rec_bytes[37..41]);
        let page_no = LittleEndian::read_u32(&rec_bytes[41..45]);
        let page_offset = LittleEndian::read_u16(&rec_bytes[45..47]);
        let data = rec_bytes[FIXTURE_REC_FIXED..total_len - 4].to_vec();
        let checksum = LittleEndian::read_u32(&rec_bytes[total_len - 4..]);

        let mut rec = LogRecord::new(RecordKind::Fixture(kind), lsn);
        rec.len = total_len as u32;
        rec.space_id = space_id;
        rec.page_no = page_no;
        rec.page_offset = page_offset;
        rec.table_id = u64::from(table_id);
        rec.index_id = u64::from(index_id);
        rec.transaction_id = transaction_id;
        rec.checksum = checksum;
        // Zero padding adds nothing to the additive sum, so the comparison
        // holds whether or not the payload was padded out.
        rec.checksum_valid = checksum == fixture_checksum(&data);
        rec.payload = RecordPayload::Fixture {
            timestamp: DateTime::from_timestamp(timestamp_unix as i64, 0).unwrap_or_default(),
            data,
        };

        self.cursor += total_len;
        Ok(Some(rec))
    }
}

/// Builder for one fixture record; used by the test harness and the
/// integration tests to produce byte-exact files.
#[derive(Debug, Clone)]
pub struct FixtureRecord {
    pub kind: FixtureKind,
    pub lsn: u64,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: u64,
    pub table_id: u32,
    pub index_id: u32,
    pub space_id: u32,
    pub page_no: u32,
    pub page_offset: u16,
    pub data: Vec<u8>,
    /// Total record length to declare; payloads are zero-padded up to it.
    /// When `None`, the minimal length is used.
    pub declared_len: Option<u32>,
}

impl FixtureRecord {
    pub fn new(kind: FixtureKind, lsn: u64, transaction_id: u64, data: &[u8]) -> Self {
        FixtureRecord {
            kind,
            lsn,
            timestamp: DateTime::from_timestamp(0, 0).unwrap_or_default(),
            transaction_id,
            table_id: 0,
            index_id: 0,
            space_id: 0,
            page_no: 0,
            page_offset: 0,
            data: data.to_vec(),
            declared_len: None,
        }
    }

    /// Encode the record, honoring `declared_len` when it exceeds the
    /// minimal size (the harness pads some records for alignment).
    pub fn encode(&self) -> Vec<u8> {
        let min_len = FIXTURE_REC_MIN + self.data.len();
        let total_len = (self.declared_len.unwrap_or(0) as usize).max(min_len);

        let mut buf = vec![0u8; total_len];
        buf[0] = self.kind.code();
        LittleEndian::write_u32(&mut buf[1..5], total_len as u32);
        LittleEndian::write_u64(&mut buf[5..13], self.lsn);
        LittleEndian::write_u64(&mut buf[13..21], self.timestamp.timestamp().max(0) as u64);
        LittleEndian::write_u64(&mut buf[21..29], self.transaction_id);
        LittleEndian::write_u32(&mut buf[29..33], self.table_id);
        LittleEndian::write_u32(&mut buf[33..37], self.index_id);
        LittleEndian::write_u32(&mut buf[37..41], self.space_id);
        LittleEndian::write_u32(&mut buf[41..45], self.page_no);
        LittleEndian::write_u16(&mut buf[45..47], self.page_offset);
        buf[FIXTURE_REC_FIXED..FIXTURE_REC_FIXED + self.data.len()].copy_from_slice(&self.data);
        let csum = fixture_checksum(&self.data);
        LittleEndian::write_u32(&mut buf[total_len - 4..], csum);
        buf
    }
}

/// Assemble a complete fixture file image.
pub fn write_fixture(header: &FixtureHeader, records: &[FixtureRecord]) -> Vec<u8> {
    let mut image = header.encode().to_vec();
    for rec in records {
        image.extend_from_slice(&rec.encode());
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> FixtureHeader {
        FixtureHeader {
            group_id: 1,
            start_lsn: 1000,
            file_no: 1,
            created: DateTime::from_timestamp(1_724_500_800, 0).unwrap(),
            last_checkpoint: 5000,
            format: 1,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let parsed = FixtureHeader::parse(&header.encode()).unwrap();
        assert_eq!(parsed.group_id, 1);
        assert_eq!(parsed.start_lsn, 1000);
        assert_eq!(parsed.file_no, 1);
        assert_eq!(parsed.created, header.created);
        assert_eq!(parsed.last_checkpoint, 5000);
        assert_eq!(parsed.format, 1);
    }

    #[test]
    fn test_header_too_short() {
        let err = FixtureHeader::parse(&[0u8; 32]).unwrap_err();
        assert!(matches!(err, RedoError::TruncatedHeader(_)));
    }

    #[test]
    fn test_record_roundtrip() {
        let mut rec = FixtureRecord::new(FixtureKind::Insert, 1001, 12345, b"row bytes");
        rec.table_id = 100;
        rec.index_id = 1;
        rec.page_no = 1;
        rec.page_offset = 128;

        let image = write_fixture(&sample_header(), std::slice::from_ref(&rec));
        let mut reader = FixtureReader::from_bytes(image).unwrap();

        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.kind, RecordKind::Fixture(FixtureKind::Insert));
        assert_eq!(rec.start_lsn, 1001);
        assert_eq!(rec.transaction_id, 12345);
        assert_eq!(rec.table_id, 100);
        assert_eq!(rec.index_id, 1);
        assert_eq!(rec.page_offset, 128);
        assert!(rec.checksum_valid);
        match &rec.payload {
            RecordPayload::Fixture { data, .. } => assert_eq!(data, b"row bytes"),
            p => panic!("unexpected payload: {:?}", p),
        }

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_declared_len_pads_payload() {
        let mut rec = FixtureRecord::new(FixtureKind::Update, 1002, 12345, b"abc");
        rec.declared_len = Some(80);
        let bytes = rec.encode();
        assert_eq!(bytes.len(), 80);

        let mut image = sample_header().encode().to_vec();
        image.extend_from_slice(&bytes);
        let mut reader = FixtureReader::from_bytes(image).unwrap();
        let rec = reader.next_record().unwrap().unwrap();
        assert_eq!(rec.len, 80);
        // Padding rides along in the payload but the checksum still holds.
        assert!(rec.checksum_valid);
        match &rec.payload {
            RecordPayload::Fixture { data, .. } => {
                assert!(data.starts_with(b"abc"));
                assert_eq!(data.len(), 80 - FIXTURE_REC_MIN);
            }
            p => panic!("unexpected payload: {:?}", p),
        }
    }

    #[test]
    fn test_corrupted_checksum_flagged_not_fatal() {
        let rec = FixtureRecord::new(FixtureKind::Insert, 1001, 1, b"data");
        let mut image = write_fixture(&sample_header(), std::slice::from_ref(&rec));
        let len = image.len();
        LittleEndian::write_u32(&mut image[len - 4..], 0xDEAD_BEEF);

        let mut reader = FixtureReader::from_bytes(image).unwrap();
        let rec = reader.next_record().unwrap().unwrap();
        assert!(!rec.checksum_valid);
        assert_eq!(rec.checksum, 0xDEAD_BEEF);
    }

    #[test]
    fn test_truncated_record_is_fatal() {
        let rec = FixtureRecord::new(FixtureKind::Insert, 1001, 1, b"some payload");
        let mut image = write_fixture(&sample_header(), std::slice::from_ref(&rec));
        image.truncate(image.len() - 6);

        let mut reader = FixtureReader::from_bytes(image).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(RedoError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_declared_length_is_fatal() {
        let rec = FixtureRecord::new(FixtureKind::Insert, 1001, 1, b"x");
        let mut image = write_fixture(&sample_header(), std::slice::from_ref(&rec));
        LittleEndian::write_u32(&mut image[FIXTURE_HDR_SIZE + 1..], 10); // < minimum

        let mut reader = FixtureReader::from_bytes(image).unwrap();
        assert!(matches!(
            reader.next_record(),
            Err(RedoError::Parse(_))
        ));
    }
}
