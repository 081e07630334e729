//! Physical block framing and the logical byte stream.
//!
//! A MySQL redo log file is a sequence of 512-byte blocks. Each block carries
//! a 12-byte header, up to 496 bytes of record data, and a 4-byte CRC-32C
//! trailer. The byte stream the record parsers see is the concatenation of
//! the per-block data regions only: headers, trailers, and the padding
//! between `data_len` and the trailer are framing and never reach a parser.
//!
//! [`BlockStream`] owns the file handle and a single block-sized scratch
//! buffer, and exposes a cursor whose position is the InnoDB LSN: it starts
//! at the checkpoint LSN and advances by one for every data byte consumed or
//! skipped.
//!
//! Per-block header fields are big-endian on disk. This differs from the
//! checkpoint blocks in the file header, whose fields are little-endian (see
//! `checkpoint`); real MySQL files mix the two conventions.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::RedoError;

/// Supertrait combining `Read + Seek` for type-erased readers.
trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Size of a redo log block in bytes (MySQL `OS_FILE_LOG_BLOCK_SIZE`).
pub const BLOCK_SIZE: usize = 512;
/// Size of the block header in bytes (MySQL 8.0.30+ layout).
pub const BLOCK_HDR_SIZE: usize = 12;
/// Size of the block trailer in bytes.
pub const BLOCK_TRL_SIZE: usize = 4;
/// Byte offset of the CRC-32C trailer within a block; also the upper bound
/// for `data_len`.
pub const BLOCK_CHECKSUM_OFFSET: usize = BLOCK_SIZE - BLOCK_TRL_SIZE;
/// Size of the file header (4 reserved blocks: header, checkpoint 1,
/// unused, checkpoint 2).
pub const FILE_HDR_SIZE: u64 = 4 * BLOCK_SIZE as u64;
/// Bitmask for the flush flag in the block number field (bit 31).
pub const BLOCK_FLUSH_BIT_MASK: u32 = 0x8000_0000;

/// Block header (first 12 bytes of each 512-byte block).
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0 | 4 | Block number (bit 31 = flush flag), big-endian |
/// | 4 | 2 | Data length including the header, big-endian |
/// | 6 | 2 | First record group offset, big-endian |
/// | 8 | 4 | Epoch number, big-endian |
#[derive(Debug, Clone, Serialize)]
pub struct BlockHeader {
    /// Block number with the flush bit masked out.
    pub block_no: u32,
    /// Whether this block was the first of a flush batch (bit 31).
    pub flush_flag: bool,
    /// Bytes of log data in this block, counted from the block start.
    pub data_len: u16,
    /// Offset (from the block start) of the first record that does not
    /// continue from the previous block; 0 if none starts here.
    pub first_rec_group: u16,
    /// Epoch number (checkpoint number in pre-8.0.30 files).
    pub epoch_no: u32,
}

impl BlockHeader {
    /// Parse a block header from at least [`BLOCK_HDR_SIZE`] bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use redoscope::redo::block::BlockHeader;
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// let mut block = vec![0u8; 512];
    /// BigEndian::write_u32(&mut block[0..], 0x8000_0007); // flush bit + block 7
    /// BigEndian::write_u16(&mut block[4..], 200);
    /// BigEndian::write_u16(&mut block[6..], 12);
    /// BigEndian::write_u32(&mut block[8..], 3);
    ///
    /// let hdr = BlockHeader::parse(&block).unwrap();
    /// assert_eq!(hdr.block_no, 7);
    /// assert!(hdr.flush_flag);
    /// assert_eq!(hdr.data_len, 200);
    /// assert_eq!(hdr.first_rec_group, 12);
    /// assert_eq!(hdr.epoch_no, 3);
    /// ```
    pub fn parse(block: &[u8]) -> Option<Self> {
        if block.len() < BLOCK_HDR_SIZE {
            return None;
        }

        let raw_block_no = BigEndian::read_u32(&block[0..]);
        Some(BlockHeader {
            block_no: raw_block_no & !BLOCK_FLUSH_BIT_MASK,
            flush_flag: (raw_block_no & BLOCK_FLUSH_BIT_MASK) != 0,
            data_len: BigEndian::read_u16(&block[4..]),
            first_rec_group: BigEndian::read_u16(&block[6..]),
            epoch_no: BigEndian::read_u32(&block[8..]),
        })
    }

    /// True if the block carries record bytes beyond its header.
    pub fn has_data(&self) -> bool {
        self.data_len as usize > BLOCK_HDR_SIZE
    }
}

/// Validate a block's CRC-32C trailer over bytes [0, 508).
///
/// Advisory only: a mismatch is recorded on the records decoded from the
/// block but never aborts parsing.
pub fn validate_block_checksum(block: &[u8]) -> bool {
    if block.len() < BLOCK_SIZE {
        return false;
    }
    let stored = BigEndian::read_u32(&block[BLOCK_CHECKSUM_OFFSET..]);
    stored == crc32c::crc32c(&block[..BLOCK_CHECKSUM_OFFSET])
}

/// Why the logical stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndOfLog {
    /// Physical end of file: fewer than 512 bytes remained.
    EndOfFile,
    /// A block header carried `data_len == 0`, marking the unwritten tail
    /// of the circular log.
    EndOfValidLog,
}

/// Result of topping up the stream's scratch block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fill {
    /// The current block still has unconsumed data bytes.
    Current,
    /// A fresh block was loaded and its cursor sits at the first data byte.
    NewBlock,
    /// The stream has ended (see [`BlockStream::end_of_log`]).
    Ended,
}

/// Bounded, logically continuous byte stream over the physical blocks.
///
/// Owns the file handle and one 512-byte scratch buffer; both are released
/// when the stream is dropped, on every exit path.
pub struct BlockStream {
    reader: Box<dyn ReadSeek>,
    scratch: [u8; BLOCK_SIZE],
    /// Current block header, if a block is loaded.
    header: Option<BlockHeader>,
    /// Clamped end of the data region (absolute offset within the block).
    data_end: usize,
    /// Cursor within the block (absolute; `BLOCK_HDR_SIZE..=data_end`).
    cursor: usize,
    /// LSN of the next unconsumed byte.
    lsn: u64,
    /// Trailer checksum of the current block, stored verbatim.
    checksum: u32,
    /// Advisory CRC-32C comparison result for the current block.
    checksum_valid: bool,
    ended: Option<EndOfLog>,
}

impl BlockStream {
    /// Open a block stream over a file on disk.
    pub fn open(path: &str) -> Result<Self, RedoError> {
        let file = std::fs::File::open(path)
            .map_err(|e| RedoError::Io(format!("Cannot open {}: {}", path, e)))?;
        Ok(Self::new(Box::new(file)))
    }

    /// Open a block stream over an in-memory byte image (tests, embedders).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::new(Box::new(Cursor::new(data)))
    }

    fn new(reader: Box<dyn ReadSeek>) -> Self {
        BlockStream {
            reader,
            scratch: [0u8; BLOCK_SIZE],
            header: None,
            data_end: BLOCK_HDR_SIZE,
            cursor: BLOCK_HDR_SIZE,
            lsn: 0,
            checksum: 0,
            checksum_valid: false,
            ended: None,
        }
    }

    /// Position the stream: seek the file to `file_offset` and seed the
    /// logical cursor with `base_lsn`. Discards any loaded block.
    pub fn start_at(&mut self, file_offset: u64, base_lsn: u64) -> Result<(), RedoError> {
        self.reader
            .seek(SeekFrom::Start(file_offset))
            .map_err(|e| RedoError::Io(format!("Seek to {} failed: {}", file_offset, e)))?;
        self.header = None;
        self.data_end = BLOCK_HDR_SIZE;
        self.cursor = BLOCK_HDR_SIZE;
        self.lsn = base_lsn;
        self.ended = None;
        Ok(())
    }

    /// Read `len` bytes at an absolute file offset without disturbing the
    /// logical cursor. Used once at open time for the file header blocks.
    pub fn read_at(&mut self, file_offset: u64, len: usize) -> Result<Vec<u8>, RedoError> {
        let pos = self
            .reader
            .stream_position()
            .map_err(|e| RedoError::Io(format!("Seek error: {}", e)))?;
        self.reader
            .seek(SeekFrom::Start(file_offset))
            .map_err(|e| RedoError::Io(format!("Seek to {} failed: {}", file_offset, e)))?;
        let mut buf = vec![0u8; len];
        let result = self
            .reader
            .read_exact(&mut buf)
            .map_err(|e| RedoError::Io(format!("Read at offset {} failed: {}", file_offset, e)));
        self.reader
            .seek(SeekFrom::Start(pos))
            .map_err(|e| RedoError::Io(format!("Seek error: {}", e)))?;
        result.map(|_| buf)
    }

    /// LSN of the next byte [`read_exact`](Self::read_exact) or
    /// [`advance`](Self::advance) would consume.
    pub fn current_lsn(&self) -> u64 {
        self.lsn
    }

    /// Why the stream ended, once it has.
    pub fn end_of_log(&self) -> Option<EndOfLog> {
        self.ended
    }

    /// First-record-group offset of the current block, if one is loaded.
    pub fn first_rec_group_offset(&self) -> Option<u16> {
        self.header.as_ref().map(|h| h.first_rec_group)
    }

    /// Trailer checksum of the current block (verbatim bytes, big-endian).
    pub fn block_checksum(&self) -> u32 {
        self.checksum
    }

    /// Advisory CRC-32C validation result for the current block.
    pub fn block_checksum_valid(&self) -> bool {
        self.checksum_valid
    }

    /// Ensure the cursor points at an unconsumed data byte, loading the next
    /// block if the current one is exhausted. Idempotent after the end.
    pub(crate) fn fill(&mut self) -> Result<Fill, RedoError> {
        if self.ended.is_some() {
            return Ok(Fill::Ended);
        }
        if self.header.is_some() && self.cursor < self.data_end {
            return Ok(Fill::Current);
        }
        self.load_block()
    }

    fn load_block(&mut self) -> Result<Fill, RedoError> {
        // Read exactly one block; a short read is the physical end.
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            let n = self
                .reader
                .read(&mut self.scratch[filled..])
                .map_err(|e| RedoError::Io(format!("Block read error: {}", e)))?;
            if n == 0 {
                self.ended = Some(EndOfLog::EndOfFile);
                self.header = None;
                return Ok(Fill::Ended);
            }
            filled += n;
        }

        let header = match BlockHeader::parse(&self.scratch) {
            Some(h) => h,
            None => {
                self.ended = Some(EndOfLog::EndOfFile);
                return Ok(Fill::Ended);
            }
        };

        if header.data_len == 0 {
            self.ended = Some(EndOfLog::EndOfValidLog);
            self.header = None;
            return Ok(Fill::Ended);
        }

        // Clamp the data region to [12, 508]; anything past data_len before
        // the trailer is padding and is never exposed.
        self.data_end = (header.data_len as usize).clamp(BLOCK_HDR_SIZE, BLOCK_CHECKSUM_OFFSET);
        self.cursor = BLOCK_HDR_SIZE;
        self.checksum = BigEndian::read_u32(&self.scratch[BLOCK_CHECKSUM_OFFSET..]);
        self.checksum_valid = validate_block_checksum(&self.scratch);
        self.header = Some(header);

        if self.cursor == self.data_end {
            // Header-only block; keep going.
            return self.load_block();
        }

        Ok(Fill::NewBlock)
    }

    /// Align the cursor with the block's first complete record.
    ///
    /// Called by the dispatcher when it enters a fresh block between records;
    /// never during a cross-block payload read, where the leading bytes are
    /// continuation data. Skipped bytes still advance the LSN.
    pub(crate) fn align_to_first_record(&mut self) {
        if let Some(h) = &self.header {
            let target = (h.first_rec_group as usize).min(self.data_end);
            if target > self.cursor {
                self.lsn += (target - self.cursor) as u64;
                self.cursor = target;
            }
        }
    }

    /// Unconsumed bytes remaining in the current block's data region.
    pub(crate) fn remaining_in_block(&self) -> usize {
        self.data_end - self.cursor
    }

    /// The unconsumed tail of the current block's data region.
    pub(crate) fn block_tail(&self) -> &[u8] {
        &self.scratch[self.cursor..self.data_end]
    }

    /// Consume `n` bytes within the current block. `n` must not exceed
    /// [`remaining_in_block`](Self::remaining_in_block).
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining_in_block());
        self.cursor += n;
        self.lsn += n as u64;
    }

    /// Read `n` logical bytes, spanning blocks as needed.
    ///
    /// Continuation blocks contribute only their data regions; their headers
    /// and trailers are skipped and their `first_rec_group` is ignored.
    /// Returns `Ok(None)` when the log ends before `n` bytes are available
    /// (the caller classifies this against the record being decoded).
    pub(crate) fn read_exact(&mut self, n: usize) -> Result<Option<Vec<u8>>, RedoError> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            match self.fill()? {
                Fill::Ended => return Ok(None),
                Fill::Current | Fill::NewBlock => {}
            }
            let take = (n - out.len()).min(self.remaining_in_block());
            out.extend_from_slice(&self.scratch[self.cursor..self.cursor + take]);
            self.advance(take);
        }
        Ok(Some(out))
    }
}
