use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{wprint, wprintln};
use crate::redo::analysis::{analyze_file, Analysis, LogHeader};
use crate::redo::block::EndOfLog;
use crate::redo::format::LogFormat;
use crate::redo::heuristics::{readable_strings, split_fields};
use crate::redo::mlog::OperationClass;
use crate::redo::record::{LogRecord, RecordPayload};
use crate::util::hex::{format_hex32, hex_dump};
use crate::RedoError;

pub struct RecordsOptions {
    pub file: String,
    pub format: LogFormat,
    pub limit: Option<usize>,
    pub max_records: usize,
    pub op: Option<OperationClass>,
    pub verbose: bool,
    pub no_heuristics: bool,
    pub json: bool,
    pub csv: bool,
}

#[derive(Serialize)]
struct RecordsJson<'a> {
    file: &'a str,
    header: &'a LogHeader,
    checkpoint_fallback: bool,
    group_count: u32,
    capped: bool,
    record_count: usize,
    records: Vec<&'a LogRecord>,
}

pub fn execute(opts: &RecordsOptions, writer: &mut dyn Write) -> Result<(), RedoError> {
    let analysis = analyze_file(&opts.file, opts.format, opts.max_records)?;

    if analysis.checkpoint_fallback {
        eprintln!(
            "{}",
            "Warning: no valid checkpoint found, reading from the first data block".yellow()
        );
    }

    let filtered: Vec<&LogRecord> = analysis
        .records
        .iter()
        .filter(|rec| opts.op.map_or(true, |op| rec.operation_class() == op))
        .collect();

    if opts.json {
        let json = serde_json::to_string_pretty(&RecordsJson {
            file: &opts.file,
            header: &analysis.header,
            checkpoint_fallback: analysis.checkpoint_fallback,
            group_count: analysis.group_count,
            capped: analysis.capped,
            record_count: filtered.len(),
            records: filtered,
        })
        .map_err(|e| RedoError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    if opts.csv {
        return write_csv(&filtered, writer);
    }

    wprintln!(writer, "{}", "Redo Log Records".bold())?;
    wprintln!(writer, "  File:       {}", opts.file)?;
    wprintln!(writer, "  Start LSN:  {}", analysis.header.start_lsn)?;
    wprintln!(
        writer,
        "  Records:    {} decoded, {} shown{}",
        analysis.records.len(),
        filtered.len().min(opts.limit.unwrap_or(usize::MAX)),
        if analysis.capped {
            " (record cap reached)"
        } else {
            ""
        }
    )?;
    wprintln!(writer, "  Groups:     {}", analysis.group_count)?;
    wprintln!(writer)?;

    let shown = opts.limit.unwrap_or(filtered.len());
    for (i, rec) in filtered.iter().take(shown).enumerate() {
        print_record_line(writer, i + 1, rec)?;
        if opts.verbose {
            print_record_detail(writer, rec, opts.no_heuristics)?;
        }
    }
    if shown < filtered.len() {
        wprintln!(writer, "  ... {} more records", filtered.len() - shown)?;
    }

    wprintln!(writer)?;
    print_summary(writer, &analysis)?;
    Ok(())
}

fn print_record_line(
    writer: &mut dyn Write,
    index: usize,
    rec: &LogRecord,
) -> Result<(), RedoError> {
    let group = if rec.group_id > 0 {
        let marker = if rec.is_group_start {
            " start"
        } else if rec.is_group_end {
            " end"
        } else {
            ""
        };
        format!("group={}{}", rec.group_id, marker).cyan().to_string()
    } else {
        String::new()
    };

    let csum = if rec.checksum_valid {
        String::new()
    } else {
        format!(" {}", "csum!".yellow())
    };

    wprintln!(
        writer,
        "  {:>6}  lsn={:<12} {:<38} {:<7} space={:<6} page={:<8} len={:<5} {}{}",
        index,
        rec.start_lsn,
        rec.kind.to_string(),
        rec.operation_class().to_string(),
        rec.space_id,
        rec.page_no,
        rec.len,
        group,
        csum,
    )?;
    Ok(())
}

fn print_record_detail(
    writer: &mut dyn Write,
    rec: &LogRecord,
    no_heuristics: bool,
) -> Result<(), RedoError> {
    match &rec.payload {
        RecordPayload::ByteWrite { value, width } => {
            wprintln!(
                writer,
                "          write {} byte(s) at page offset {}: {:#x}",
                width,
                rec.page_offset,
                value
            )?;
        }
        RecordPayload::RecInsert { index, body } => {
            wprint!(
                writer,
                "          index: n_fields={} n_unique={}",
                index.n_fields,
                index.n_unique_fields
            )?;
            if let Some(ic) = &index.instant_columns {
                wprint!(
                    writer,
                    " instant_cols={} actual_n_fields={}",
                    ic.n_instant_cols,
                    ic.actual_n_fields
                )?;
            }
            wprintln!(writer)?;
            let fields: Vec<String> = index
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    format!(
                        "field_{}(len={},{})",
                        i,
                        f.length,
                        if f.not_null { "NOT_NULL" } else { "NULLABLE" }
                    )
                })
                .collect();
            if !fields.is_empty() {
                wprintln!(writer, "          fields: [{}]", fields.join(", "))?;
            }
            wprintln!(
                writer,
                "          body: cursor_offset={} end_seg_len={} payload={} bytes",
                body.cursor_offset,
                body.end_seg_len,
                body.payload.len()
            )?;
            if let Some(bits) = body.info_bits {
                wprintln!(
                    writer,
                    "          info_bits={:#04x} origin_offset={} mismatch_index={}",
                    bits,
                    body.origin_offset.unwrap_or(0),
                    body.mismatch_index.unwrap_or(0)
                )?;
            }
        }
        RecordPayload::CompactRec { index, bytes } => {
            wprintln!(
                writer,
                "          compact record: n_fields={} n_unique={} body={} bytes",
                index.n_fields,
                index.n_unique_fields,
                bytes.len()
            )?;
        }
        RecordPayload::PageOp { bytes } => {
            wprintln!(writer, "          page op remainder: {} bytes", bytes.len())?;
        }
        RecordPayload::DynamicMeta { version, metadata } => {
            wprintln!(
                writer,
                "          table_id={} version={} metadata={} bytes",
                rec.table_id,
                version,
                metadata.len()
            )?;
        }
        RecordPayload::StringWrite { length, .. } => {
            wprintln!(
                writer,
                "          string write: page offset {} length {}",
                rec.page_offset,
                length
            )?;
        }
        RecordPayload::Opaque { note, bytes } => {
            wprintln!(writer, "          opaque ({}): {} bytes", note, bytes.len())?;
        }
        RecordPayload::Empty => {}
        RecordPayload::Fixture { timestamp, data } => {
            wprintln!(
                writer,
                "          txn={} time={} data={} bytes",
                rec.transaction_id,
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                data.len()
            )?;
        }
    }

    if let Some(bytes) = rec.payload_bytes() {
        if let Some(strings) = readable_strings(bytes) {
            wprintln!(writer, "          strings: {}", strings.green())?;
        }
        if !no_heuristics {
            let guesses = split_fields(bytes);
            if !guesses.is_empty() {
                let rendered: Vec<String> = guesses
                    .iter()
                    .map(|g| format!("{}={}", g.label, g.value))
                    .collect();
                wprintln!(writer, "          guessed: {}", rendered.join(" "))?;
            }
        }
        if !bytes.is_empty() {
            let shown = &bytes[..bytes.len().min(64)];
            for line in hex_dump(shown, 0).lines() {
                wprintln!(writer, "          {}", line)?;
            }
            if bytes.len() > 64 {
                wprintln!(writer, "          ... {} more bytes", bytes.len() - 64)?;
            }
        }
    }
    Ok(())
}

fn print_summary(writer: &mut dyn Write, analysis: &Analysis) -> Result<(), RedoError> {
    wprintln!(writer, "{}", "Record Types".bold())?;
    for (name, count) in analysis.kind_counts() {
        wprintln!(writer, "  {:<40} {}", name, count)?;
    }
    if let Some(end) = analysis.end_of_log {
        let reason = match end {
            EndOfLog::EndOfFile => "end of file",
            EndOfLog::EndOfValidLog => "end of valid log data",
        };
        wprintln!(writer, "  Stopped at: {}", reason)?;
    }
    Ok(())
}

fn write_csv(records: &[&LogRecord], writer: &mut dyn Write) -> Result<(), RedoError> {
    wprintln!(
        writer,
        "index,lsn,type,class,space_id,page_no,page_offset,table_id,index_id,\
         transaction_id,len,group_id,is_group_start,is_group_end,checksum,\
         checksum_valid,strings"
    )?;
    for (i, rec) in records.iter().enumerate() {
        let strings = rec
            .payload_bytes()
            .and_then(readable_strings)
            .unwrap_or_default();
        wprintln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            i + 1,
            rec.start_lsn,
            csv_escape(rec.kind.to_string().as_str()),
            rec.operation_class(),
            rec.space_id,
            rec.page_no,
            rec.page_offset,
            rec.table_id,
            rec.index_id,
            rec.transaction_id,
            rec.len,
            rec.group_id,
            rec.is_group_start,
            rec.is_group_end,
            format_hex32(rec.checksum),
            rec.checksum_valid,
            csv_escape(&strings),
        )?;
    }
    Ok(())
}

/// RFC 4180 escaping: quote fields containing commas, quotes, or newlines.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(csv_escape("line\rbreak"), "\"line\rbreak\"");
        assert_eq!(csv_escape(""), "");
    }
}
