//! CLI subcommand implementations.
//!
//! Each subcommand has an `Options` struct and a
//! `pub fn execute(opts, writer) -> Result<(), RedoError>` entry point.
//! The `writer: &mut dyn Write` parameter allows output to be captured
//! in tests or redirected as needed.

pub mod app;
pub mod blocks;
pub mod header;
pub mod records;
pub mod search;

/// Write a line to the given writer, converting io::Error to RedoError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::RedoError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::RedoError::Io(e.to_string()))
    };
}

/// Write (without newline) to the given writer, converting io::Error to RedoError.
macro_rules! wprint {
    ($w:expr, $($arg:tt)*) => {
        write!($w, $($arg)*).map_err(|e| $crate::RedoError::Io(e.to_string()))
    };
}

pub(crate) use wprint;
pub(crate) use wprintln;

use crate::redo::format::LogFormat;
use crate::redo::mlog::OperationClass;

use self::app::{FormatArg, OpFilter};

/// Map the clap format argument onto the core format selector.
pub fn log_format(arg: FormatArg) -> LogFormat {
    match arg {
        FormatArg::Auto => LogFormat::Auto,
        FormatArg::Mysql => LogFormat::Mysql,
        FormatArg::Fixture => LogFormat::Fixture,
    }
}

/// Map the clap operation filter onto the core classification.
pub fn op_class(filter: OpFilter) -> Option<OperationClass> {
    match filter {
        OpFilter::All => None,
        OpFilter::Insert => Some(OperationClass::Insert),
        OpFilter::Update => Some(OperationClass::Update),
        OpFilter::Delete => Some(OperationClass::Delete),
        OpFilter::Other => Some(OperationClass::Other),
    }
}
