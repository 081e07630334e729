//! Top-level analysis driver.
//!
//! [`Analyzer`] is the pull-based entry point the CLI (and any embedder)
//! consumes: open a file, read the unified header, then drain records until
//! `Ok(None)`. [`analyze_file`] wraps the whole pipeline (open, collect up
//! to a safety cap, run the mini-transaction grouping post-pass) and hands
//! back an [`Analysis`] ready for display or export.
//!
//! The iterator is finite and non-restartable; benign terminations (end of
//! file, end of valid log, the record cap) all surface as clean completion,
//! while I/O failures and corrupt records propagate as errors.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::redo::block::{BlockStream, EndOfLog, FILE_HDR_SIZE};
use crate::redo::checkpoint::CheckpointPair;
use crate::redo::fixture::FixtureReader;
use crate::redo::format::{LogFormat, ResolvedFormat};
use crate::redo::group::assign_groups;
use crate::redo::parser::MysqlRecordParser;
use crate::redo::record::LogRecord;
use crate::RedoError;

/// Safety ceiling on collected records; reaching it is a benign termination,
/// not a parse failure.
pub const MAX_RECORDS: usize = 10_000;

/// Unified file header, synthesized from the checkpoint for MySQL files and
/// read directly from the fixture header otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct LogHeader {
    /// Resolved on-disk format.
    pub format: ResolvedFormat,
    /// Log group ID (checkpoint sequence number for MySQL files).
    pub group_id: u64,
    /// LSN where record decoding starts.
    pub start_lsn: u64,
    /// Log file number within its group.
    pub file_no: u32,
    /// File creation time (file mtime for MySQL captures).
    pub created: DateTime<Utc>,
    /// Last checkpoint LSN recorded by the fixture writer; 0 for MySQL
    /// files, whose checkpoints are reported separately.
    pub last_checkpoint: u64,
    /// File size in bytes.
    pub file_size: u64,
}

enum Inner {
    Mysql(MysqlRecordParser),
    Fixture(FixtureReader),
}

/// Pull-based record reader over an opened log file.
pub struct Analyzer {
    inner: Inner,
    header: LogHeader,
    checkpoints: Option<CheckpointPair>,
    checkpoint_fallback: bool,
    ended: Option<EndOfLog>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("header", &self.header)
            .field("checkpoints", &self.checkpoints)
            .field("checkpoint_fallback", &self.checkpoint_fallback)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Open a log file, resolving `Auto` format by file size.
    pub fn open(path: &str, format: LogFormat) -> Result<Self, RedoError> {
        let meta = std::fs::metadata(path)
            .map_err(|e| RedoError::Io(format!("Cannot stat {}: {}", path, e)))?;
        let file_size = meta.len();
        let created = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();

        match format.resolve(file_size) {
            ResolvedFormat::Mysql => {
                let stream = BlockStream::open(path)?;
                Self::init_mysql(stream, file_size, created)
            }
            ResolvedFormat::Fixture => {
                let reader = FixtureReader::open(path)?;
                Ok(Self::init_fixture(reader, file_size))
            }
        }
    }

    /// Open an in-memory log image (tests, embedders).
    pub fn from_bytes(data: Vec<u8>, format: LogFormat) -> Result<Self, RedoError> {
        let file_size = data.len() as u64;
        match format.resolve(file_size) {
            ResolvedFormat::Mysql => {
                Self::init_mysql(BlockStream::from_bytes(data), file_size, DateTime::default())
            }
            ResolvedFormat::Fixture => {
                Ok(Self::init_fixture(FixtureReader::from_bytes(data)?, file_size))
            }
        }
    }

    fn init_mysql(
        mut stream: BlockStream,
        file_size: u64,
        created: DateTime<Utc>,
    ) -> Result<Self, RedoError> {
        if file_size < FILE_HDR_SIZE {
            return Err(RedoError::TruncatedHeader(format!(
                "MySQL redo log needs a {}-byte file header, file has {} bytes",
                FILE_HDR_SIZE, file_size
            )));
        }

        let checkpoints = CheckpointPair::read(&mut stream)?;
        let fallback = !checkpoints.has_valid_checkpoint();
        let (base_lsn, file_offset) = checkpoints.start_position();
        stream.start_at(file_offset, base_lsn)?;

        let header = LogHeader {
            format: ResolvedFormat::Mysql,
            group_id: checkpoints.latest().map(|c| c.sequence_no).unwrap_or(1),
            start_lsn: base_lsn,
            file_no: 1,
            created,
            last_checkpoint: 0,
            file_size,
        };

        Ok(Analyzer {
            inner: Inner::Mysql(MysqlRecordParser::new(stream)),
            header,
            checkpoints: Some(checkpoints),
            checkpoint_fallback: fallback,
            ended: None,
        })
    }

    fn init_fixture(reader: FixtureReader, file_size: u64) -> Self {
        let fh = reader.header();
        let header = LogHeader {
            format: ResolvedFormat::Fixture,
            group_id: fh.group_id,
            start_lsn: fh.start_lsn,
            file_no: fh.file_no,
            created: fh.created,
            last_checkpoint: fh.last_checkpoint,
            file_size,
        };
        Analyzer {
            inner: Inner::Fixture(reader),
            header,
            checkpoints: None,
            checkpoint_fallback: false,
            ended: None,
        }
    }

    /// The unified file header.
    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    /// Both checkpoint slots (MySQL format only).
    pub fn checkpoints(&self) -> Option<&CheckpointPair> {
        self.checkpoints.as_ref()
    }

    /// True when neither checkpoint slot was valid and decoding started at
    /// the first data block instead. Callers should surface a diagnostic.
    pub fn used_checkpoint_fallback(&self) -> bool {
        self.checkpoint_fallback
    }

    /// Decode the next record, or `Ok(None)` at the end of the log.
    /// Idempotent once the end is reached.
    pub fn next_record(&mut self) -> Result<Option<LogRecord>, RedoError> {
        let next = match &mut self.inner {
            Inner::Mysql(parser) => {
                let rec = parser.next_record()?;
                if rec.is_none() {
                    self.ended = parser.end_of_log();
                }
                rec
            }
            Inner::Fixture(reader) => {
                let rec = reader.next_record()?;
                if rec.is_none() {
                    self.ended = Some(EndOfLog::EndOfFile);
                }
                rec
            }
        };
        Ok(next)
    }

    /// Why iteration ended, once it has.
    pub fn end_of_log(&self) -> Option<EndOfLog> {
        self.ended
    }
}

/// Result of a full analysis pass: header, checkpoints, grouped records.
#[derive(Debug, Serialize)]
pub struct Analysis {
    pub header: LogHeader,
    pub checkpoints: Option<CheckpointPair>,
    /// True when decoding started at the first data block because neither
    /// checkpoint slot was valid.
    pub checkpoint_fallback: bool,
    pub records: Vec<LogRecord>,
    /// Number of multi-record groups formed by the grouping post-pass.
    pub group_count: u32,
    /// True when collection stopped at the record cap rather than the end
    /// of the log.
    pub capped: bool,
    pub end_of_log: Option<EndOfLog>,
}

impl Analysis {
    /// Record counts per type name, ordered by name.
    pub fn kind_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for rec in &self.records {
            *counts.entry(rec.kind.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Open `path`, collect up to `max_records` records, and run the grouping
/// post-pass.
pub fn analyze_file(
    path: &str,
    format: LogFormat,
    max_records: usize,
) -> Result<Analysis, RedoError> {
    run(Analyzer::open(path, format)?, max_records)
}

/// [`analyze_file`] over an in-memory image.
pub fn analyze_bytes(
    data: Vec<u8>,
    format: LogFormat,
    max_records: usize,
) -> Result<Analysis, RedoError> {
    run(Analyzer::from_bytes(data, format)?, max_records)
}

fn run(mut analyzer: Analyzer, max_records: usize) -> Result<Analysis, RedoError> {
    let mut records = Vec::new();
    let mut capped = false;

    loop {
        if records.len() >= max_records {
            capped = true;
            break;
        }
        match analyzer.next_record()? {
            Some(rec) => records.push(rec),
            None => break,
        }
    }

    let group_count = assign_groups(&mut records);

    Ok(Analysis {
        header: analyzer.header.clone(),
        checkpoints: analyzer.checkpoints.clone(),
        checkpoint_fallback: analyzer.checkpoint_fallback,
        records,
        group_count,
        capped,
        end_of_log: analyzer.ended,
    })
}
