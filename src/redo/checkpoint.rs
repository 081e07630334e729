//! Checkpoint discovery in the redo log file header.
//!
//! The first 2048 bytes of a redo log file are four reserved blocks; the
//! blocks at offsets 512 and 1536 each hold a checkpoint record. MySQL
//! alternates writes between the two slots, so the slot with the higher
//! sequence number is the most recent consistent one and seeds the recovery
//! start position.
//!
//! Checkpoint fields are little-endian on disk, unlike the big-endian
//! per-block header fields (`block`); both conventions are observed in real
//! MySQL files.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::redo::block::{BlockStream, BLOCK_SIZE, FILE_HDR_SIZE};
use crate::RedoError;

/// File offset of checkpoint slot 1.
pub const CHECKPOINT_1_OFFSET: u64 = BLOCK_SIZE as u64;
/// File offset of checkpoint slot 2.
pub const CHECKPOINT_2_OFFSET: u64 = 3 * BLOCK_SIZE as u64;

/// Byte offset of the sequence number within a checkpoint block.
const CHECKPOINT_NO: usize = 0;
/// Byte offset of the checkpoint LSN.
const CHECKPOINT_LSN: usize = 8;
/// Byte offset of the file offset corresponding to the checkpoint LSN.
const CHECKPOINT_FILE_OFFSET: usize = 16;
/// Byte offset of the log buffer size.
const CHECKPOINT_BUF_SIZE: usize = 24;
/// Byte offset of the checkpoint block checksum.
const CHECKPOINT_SUM: usize = 60;

/// A parsed checkpoint record.
///
/// Produced once at open time and immutable thereafter. `lsn` seeds the
/// block stream's logical offset and `file_offset` its initial file
/// position.
#[derive(Debug, Clone, Serialize)]
pub struct Checkpoint {
    /// Checkpoint sequence number; zero marks an unwritten slot.
    pub sequence_no: u64,
    /// LSN at the time of this checkpoint, the recovery start point.
    pub lsn: u64,
    /// File offset corresponding to the checkpoint LSN.
    pub file_offset: u64,
    /// Log buffer size at checkpoint time.
    pub buffer_size: u64,
    /// Checkpoint block checksum, stored verbatim.
    pub checksum: u32,
    /// Whether this slot holds a written checkpoint (`sequence_no > 0`).
    pub is_valid: bool,
}

impl Checkpoint {
    /// Parse a checkpoint from a 512-byte header block.
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() < BLOCK_SIZE {
            return None;
        }

        let sequence_no = LittleEndian::read_u64(&block[CHECKPOINT_NO..]);
        Some(Checkpoint {
            sequence_no,
            lsn: LittleEndian::read_u64(&block[CHECKPOINT_LSN..]),
            file_offset: LittleEndian::read_u64(&block[CHECKPOINT_FILE_OFFSET..]),
            buffer_size: LittleEndian::read_u64(&block[CHECKPOINT_BUF_SIZE..]),
            checksum: LittleEndian::read_u32(&block[CHECKPOINT_SUM..]),
            is_valid: sequence_no > 0,
        })
    }
}

/// Both checkpoint slots of a file header, read once at open.
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointPair {
    /// Slot 1 (file offset 512).
    pub slot1: Option<Checkpoint>,
    /// Slot 2 (file offset 1536).
    pub slot2: Option<Checkpoint>,
}

impl CheckpointPair {
    /// Read and parse both checkpoint slots.
    pub fn read(stream: &mut BlockStream) -> Result<Self, RedoError> {
        let slot1 = Checkpoint::parse(&stream.read_at(CHECKPOINT_1_OFFSET, BLOCK_SIZE)?);
        let slot2 = Checkpoint::parse(&stream.read_at(CHECKPOINT_2_OFFSET, BLOCK_SIZE)?);
        Ok(CheckpointPair { slot1, slot2 })
    }

    /// The valid checkpoint with the highest sequence number, if any.
    ///
    /// When both slots are valid and tie on sequence number, slot 1 wins:
    /// slot 2 only takes precedence with a strictly higher number.
    pub fn latest(&self) -> Option<&Checkpoint> {
        let c1 = self.slot1.as_ref().filter(|c| c.is_valid);
        let c2 = self.slot2.as_ref().filter(|c| c.is_valid);
        match (c1, c2) {
            (Some(a), Some(b)) => Some(if b.sequence_no > a.sequence_no { b } else { a }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Recovery start position `(base_lsn, file_offset)`.
    ///
    /// Falls back to the first data block (LSN 2048, offset 2048) when
    /// neither slot is valid; callers surface a diagnostic for the fallback
    /// via [`has_valid_checkpoint`](Self::has_valid_checkpoint). The file
    /// offset is clamped so reading never starts inside the file header.
    pub fn start_position(&self) -> (u64, u64) {
        match self.latest() {
            Some(cp) => (cp.lsn, cp.file_offset.max(FILE_HDR_SIZE)),
            None => (FILE_HDR_SIZE, FILE_HDR_SIZE),
        }
    }

    /// False when both slots are zeroed (synthetic or wiped files).
    pub fn has_valid_checkpoint(&self) -> bool {
        self.latest().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_checkpoint_block(seq: u64, lsn: u64, offset: u64, buf_size: u64) -> Vec<u8> {
        let mut block = vec![0u8; BLOCK_SIZE];
        LittleEndian::write_u64(&mut block[CHECKPOINT_NO..], seq);
        LittleEndian::write_u64(&mut block[CHECKPOINT_LSN..], lsn);
        LittleEndian::write_u64(&mut block[CHECKPOINT_FILE_OFFSET..], offset);
        LittleEndian::write_u64(&mut block[CHECKPOINT_BUF_SIZE..], buf_size);
        LittleEndian::write_u32(&mut block[CHECKPOINT_SUM..], 0xCAFE_F00D);
        block
    }

    fn make_header_image(cp1: Vec<u8>, cp2: Vec<u8>) -> Vec<u8> {
        let mut image = vec![0u8; BLOCK_SIZE]; // block 0: file header
        image.extend_from_slice(&cp1);
        image.extend_from_slice(&vec![0u8; BLOCK_SIZE]); // block 2: unused
        image.extend_from_slice(&cp2);
        image
    }

    #[test]
    fn test_parse_checkpoint_fields() {
        let block = make_checkpoint_block(42, 0xDEAD_BEEF, 2048, 65536);
        let cp = Checkpoint::parse(&block).unwrap();
        assert_eq!(cp.sequence_no, 42);
        assert_eq!(cp.lsn, 0xDEAD_BEEF);
        assert_eq!(cp.file_offset, 2048);
        assert_eq!(cp.buffer_size, 65536);
        assert_eq!(cp.checksum, 0xCAFE_F00D);
        assert!(cp.is_valid);
    }

    #[test]
    fn test_parse_zeroed_slot_invalid() {
        let cp = Checkpoint::parse(&vec![0u8; BLOCK_SIZE]).unwrap();
        assert_eq!(cp.sequence_no, 0);
        assert!(!cp.is_valid);
    }

    #[test]
    fn test_latest_picks_higher_sequence() {
        let image = make_header_image(
            make_checkpoint_block(7, 1_000_000, 100_000, 0),
            make_checkpoint_block(9, 1_200_000, 120_000, 0),
        );
        let mut stream = BlockStream::from_bytes(image);
        let pair = CheckpointPair::read(&mut stream).unwrap();
        let latest = pair.latest().unwrap();
        assert_eq!(latest.sequence_no, 9);
        assert_eq!(pair.start_position(), (1_200_000, 120_000));
    }

    #[test]
    fn test_latest_tie_prefers_slot1() {
        let image = make_header_image(
            make_checkpoint_block(5, 7000, 4096, 0),
            make_checkpoint_block(5, 9000, 8192, 0),
        );
        let mut stream = BlockStream::from_bytes(image);
        let pair = CheckpointPair::read(&mut stream).unwrap();
        let latest = pair.latest().unwrap();
        assert_eq!(latest.sequence_no, 5);
        assert_eq!(latest.lsn, 7000);
        assert_eq!(pair.start_position(), (7000, 4096));
    }

    #[test]
    fn test_latest_picks_slot1_when_higher() {
        let image = make_header_image(
            make_checkpoint_block(12, 500, 4096, 0),
            make_checkpoint_block(3, 100, 2048, 0),
        );
        let mut stream = BlockStream::from_bytes(image);
        let pair = CheckpointPair::read(&mut stream).unwrap();
        assert_eq!(pair.latest().unwrap().sequence_no, 12);
    }

    #[test]
    fn test_single_valid_slot_wins() {
        let image = make_header_image(
            make_checkpoint_block(0, 0, 0, 0),
            make_checkpoint_block(5, 9000, 8192, 0),
        );
        let mut stream = BlockStream::from_bytes(image);
        let pair = CheckpointPair::read(&mut stream).unwrap();
        assert_eq!(pair.latest().unwrap().sequence_no, 5);
        assert_eq!(pair.start_position(), (9000, 8192));
    }

    #[test]
    fn test_no_valid_checkpoint_falls_back() {
        let image = make_header_image(
            make_checkpoint_block(0, 0, 0, 0),
            make_checkpoint_block(0, 0, 0, 0),
        );
        let mut stream = BlockStream::from_bytes(image);
        let pair = CheckpointPair::read(&mut stream).unwrap();
        assert!(!pair.has_valid_checkpoint());
        assert_eq!(pair.start_position(), (2048, 2048));
    }

    #[test]
    fn test_start_position_clamped_to_data_blocks() {
        // A checkpoint pointing into the file header must not be honored
        // as a read position.
        let image = make_header_image(
            make_checkpoint_block(1, 300, 300, 0),
            make_checkpoint_block(0, 0, 0, 0),
        );
        let mut stream = BlockStream::from_bytes(image);
        let pair = CheckpointPair::read(&mut stream).unwrap();
        assert_eq!(pair.start_position(), (300, 2048));
    }
}
