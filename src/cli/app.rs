use clap::{Parser, Subcommand, ValueEnum};

/// Top-level CLI definition for the `redoscope` binary.
#[derive(Parser)]
#[command(name = "redoscope")]
#[command(about = "Forensic analyzer for MySQL 8.0 InnoDB redo log files")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Controls when colored output is emitted.
#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

/// Log file format selection.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Decide by file size (> 1 MB means MySQL block format)
    Auto,
    /// MySQL block-structured redo log
    Mysql,
    /// Flat synthetic fixture format
    Fixture,
}

/// Operation-class filter for record listings.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpFilter {
    All,
    Insert,
    Update,
    Delete,
    Other,
}

/// Available subcommands for the `redoscope` CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Decode and list redo log records
    ///
    /// Locates the latest checkpoint, decodes records from the checkpoint
    /// LSN onward, groups mini-transactions along MLOG_MULTI_REC_END
    /// markers, and prints one line per record with LSN, type, page
    /// coordinates, and group membership. With `--verbose`, each record
    /// additionally shows its decoded payload fields, readable strings
    /// found in opaque bytes, and a hex dump. `--json` and `--csv` export
    /// the full record set instead of the table view.
    Records {
        /// Path to redo log file (#ib_redo*, ib_logfile*, or fixture)
        #[arg(short, long)]
        file: String,

        /// Log file format
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,

        /// Show only the first N records of the listing
        #[arg(short, long)]
        limit: Option<usize>,

        /// Stop decoding after N records
        #[arg(long = "max-records", default_value_t = 10_000)]
        max_records: usize,

        /// Keep only records of one operation class
        #[arg(long = "op", value_enum, default_value = "all")]
        op: OpFilter,

        /// Display decoded payload details per record
        #[arg(short, long)]
        verbose: bool,

        /// Skip the display-level field-guessing heuristics
        #[arg(long = "no-heuristics")]
        no_heuristics: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        /// Output in CSV format
        #[arg(long)]
        csv: bool,
    },

    /// Show the file header and checkpoint blocks
    ///
    /// Prints the unified file header plus, for MySQL-format files, both
    /// checkpoint slots and which one seeds the recovery start position.
    Header {
        /// Path to redo log file
        #[arg(short, long)]
        file: String,

        /// Log file format
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect physical 512-byte blocks
    ///
    /// Walks the data blocks after the 2048-byte file header and prints
    /// each block's number, data length, first-record-group offset, epoch,
    /// and checksum validity. With `--verbose`, the bytes of each block's
    /// data region are hex dumped.
    Blocks {
        /// Path to a MySQL-format redo log file
        #[arg(short, long)]
        file: String,

        /// Limit to first N data blocks
        #[arg(short, long)]
        blocks: Option<u64>,

        /// Skip blocks without record data
        #[arg(long)]
        no_empty: bool,

        /// Hex dump each block's data region
        #[arg(short, long)]
        verbose: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Search decoded record payloads for a string
    ///
    /// Decodes the full record sequence and reports every record whose
    /// payload bytes contain the given text, with the readable strings
    /// around each match. A diagnostic mode for locating known row data
    /// inside a capture.
    Search {
        /// Path to redo log file
        #[arg(short, long)]
        file: String,

        /// Text to look for in payload bytes
        #[arg(short, long)]
        text: String,

        /// Log file format
        #[arg(long, value_enum, default_value = "auto")]
        format: FormatArg,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
