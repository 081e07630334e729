use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::redo::analysis::{Analyzer, LogHeader};
use crate::redo::checkpoint::{Checkpoint, CheckpointPair};
use crate::redo::format::{LogFormat, ResolvedFormat};
use crate::RedoError;

pub struct HeaderOptions {
    pub file: String,
    pub format: LogFormat,
    pub json: bool,
}

#[derive(Serialize)]
struct HeaderJson<'a> {
    file: &'a str,
    header: &'a LogHeader,
    checkpoints: Option<&'a CheckpointPair>,
    checkpoint_fallback: bool,
}

pub fn execute(opts: &HeaderOptions, writer: &mut dyn Write) -> Result<(), RedoError> {
    let analyzer = Analyzer::open(&opts.file, opts.format)?;
    let header = analyzer.header();

    if opts.json {
        let json = serde_json::to_string_pretty(&HeaderJson {
            file: &opts.file,
            header,
            checkpoints: analyzer.checkpoints(),
            checkpoint_fallback: analyzer.used_checkpoint_fallback(),
        })
        .map_err(|e| RedoError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    wprintln!(writer, "{}", "Redo Log File Header".bold())?;
    wprintln!(writer, "  File:            {}", opts.file)?;
    wprintln!(writer, "  Size:            {} bytes", header.file_size)?;
    wprintln!(
        writer,
        "  Format:          {}",
        match header.format {
            ResolvedFormat::Mysql => "MySQL block format",
            ResolvedFormat::Fixture => "fixture format",
        }
    )?;
    wprintln!(writer, "  Group ID:        {}", header.group_id)?;
    wprintln!(writer, "  Start LSN:       {}", header.start_lsn)?;
    wprintln!(writer, "  File No:         {}", header.file_no)?;
    wprintln!(
        writer,
        "  Created:         {}",
        header.created.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    if header.last_checkpoint > 0 {
        wprintln!(writer, "  Last checkpoint: {}", header.last_checkpoint)?;
    }
    wprintln!(writer)?;

    if let Some(pair) = analyzer.checkpoints() {
        let selected_no = pair.latest().map(|c| c.sequence_no);
        print_checkpoint(writer, "Checkpoint 1 (offset 512)", &pair.slot1, selected_no)?;
        print_checkpoint(writer, "Checkpoint 2 (offset 1536)", &pair.slot2, selected_no)?;

        if analyzer.used_checkpoint_fallback() {
            wprintln!(
                writer,
                "{}",
                "No valid checkpoint; decoding starts at the first data block (LSN 2048)".yellow()
            )?;
        } else {
            let (lsn, offset) = pair.start_position();
            wprintln!(
                writer,
                "Recovery start: LSN {} at file offset {}",
                lsn,
                offset
            )?;
        }
    }

    Ok(())
}

fn print_checkpoint(
    writer: &mut dyn Write,
    label: &str,
    cp: &Option<Checkpoint>,
    selected_no: Option<u64>,
) -> Result<(), RedoError> {
    wprintln!(writer, "{}", label.bold())?;
    match cp {
        Some(cp) if cp.is_valid => {
            let selected = selected_no == Some(cp.sequence_no);
            wprintln!(
                writer,
                "  Sequence no:  {}{}",
                cp.sequence_no,
                if selected {
                    format!(" {}", "(selected)".green())
                } else {
                    String::new()
                }
            )?;
            wprintln!(writer, "  LSN:          {}", cp.lsn)?;
            wprintln!(writer, "  File offset:  {}", cp.file_offset)?;
            wprintln!(writer, "  Buffer size:  {}", cp.buffer_size)?;
            wprintln!(writer, "  Checksum:     0x{:08x}", cp.checksum)?;
        }
        Some(_) => {
            wprintln!(writer, "  {}", "(zeroed, never written)".yellow())?;
        }
        None => {
            wprintln!(writer, "  {}", "(unreadable)".yellow())?;
        }
    }
    wprintln!(writer)?;
    Ok(())
}
