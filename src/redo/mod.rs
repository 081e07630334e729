//! InnoDB redo log decoding.
//!
//! This module turns a binary redo log artifact into a sequence of decoded
//! [`record::LogRecord`]s plus file-level metadata (checkpoints, start LSN)
//! and mini-transaction grouping. It is a read-only analyzer: records are
//! decoded and classified, never replayed against pages.
//!
//! Start with [`analysis::analyze_file`] for the whole pipeline, or
//! [`analysis::Analyzer`] to pull records one at a time.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`block`] | 512-byte block framing, logical byte stream, LSN cursor |
//! | [`checkpoint`] | Dual-checkpoint file header, recovery start position |
//! | [`compressed`] | MySQL variable-width integer codec |
//! | [`mlog`] | MLOG type taxonomy and operation classification |
//! | [`record`] | Decoded record model and payload variants |
//! | [`parser`] | Record dispatcher and per-kind parsers |
//! | [`group`] | Mini-transaction grouping post-pass |
//! | [`heuristics`] | Display-level readable-string and field guessing |
//! | [`fixture`] | Flat synthetic test format, reader and writer |
//! | [`format`] | mysql/fixture/auto format detection |
//! | [`analysis`] | Pull-based analyzer and full-file driver |

pub mod analysis;
pub mod block;
pub mod checkpoint;
pub mod compressed;
pub mod fixture;
pub mod format;
pub mod group;
pub mod heuristics;
pub mod mlog;
pub mod parser;
pub mod record;
