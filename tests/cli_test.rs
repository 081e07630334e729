#![cfg(feature = "cli")]
//! Integration tests for the CLI subcommands, capturing their output in
//! memory and asserting on the rendered text / JSON / CSV.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use chrono::DateTime;
use std::io::Write;
use tempfile::NamedTempFile;

use redoscope::cli;
use redoscope::redo::fixture::{write_fixture, FixtureHeader, FixtureRecord};
use redoscope::redo::format::LogFormat;
use redoscope::redo::mlog::OperationClass;
use redoscope::redo::record::FixtureKind;

const BLOCK_SIZE: usize = 512;
const BLOCK_HDR: usize = 12;
const CHECKSUM_OFFSET: usize = 508;

fn fixture_image() -> Vec<u8> {
    let header = FixtureHeader {
        group_id: 1,
        start_lsn: 1000,
        file_no: 1,
        created: DateTime::from_timestamp(1_724_500_800, 0).unwrap(),
        last_checkpoint: 5000,
        format: 1,
    };
    let mut insert = FixtureRecord::new(FixtureKind::Insert, 1001, 12345, b"sample insert data");
    insert.table_id = 100;
    let update = FixtureRecord::new(FixtureKind::Update, 1002, 12345, b"before|after");
    let commit = FixtureRecord::new(FixtureKind::Commit, 1003, 12345, b"commit");
    write_fixture(&header, &[insert, update, commit])
}

fn mysql_image() -> Vec<u8> {
    let mut cp1 = vec![0u8; BLOCK_SIZE];
    LittleEndian::write_u64(&mut cp1[0..], 3);
    LittleEndian::write_u64(&mut cp1[8..], 2048);
    LittleEndian::write_u64(&mut cp1[16..], 2048);

    let mut image = vec![0u8; BLOCK_SIZE];
    image.extend_from_slice(&cp1);
    image.extend_from_slice(&vec![0u8; 2 * BLOCK_SIZE]);

    // One data block: a string write followed by a MULTI_REC_END marker.
    let mut data = vec![30u8, 0x00, 0x00, 0x05, 0x00];
    data.extend_from_slice(b"hello");
    data.push(31);

    let mut block = vec![0u8; BLOCK_SIZE];
    BigEndian::write_u32(&mut block[0..], 4);
    BigEndian::write_u16(&mut block[4..], (BLOCK_HDR + data.len()) as u16);
    BigEndian::write_u16(&mut block[6..], 12);
    block[BLOCK_HDR..BLOCK_HDR + data.len()].copy_from_slice(&data);
    let crc = crc32c::crc32c(&block[..CHECKSUM_OFFSET]);
    BigEndian::write_u32(&mut block[CHECKSUM_OFFSET..], crc);
    image.extend_from_slice(&block);
    image
}

fn write_temp(image: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(image).unwrap();
    file.flush().unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_str().unwrap().to_string()
}

#[test]
fn test_records_table_output() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::records::execute(
        &cli::records::RecordsOptions {
            file: path_of(&file),
            format: LogFormat::Auto,
            limit: None,
            max_records: 10_000,
            op: None,
            verbose: false,
            no_heuristics: false,
            json: false,
            csv: false,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Redo Log Records"));
    assert!(text.contains("INSERT"));
    assert!(text.contains("UPDATE"));
    assert!(text.contains("COMMIT"));
    assert!(text.contains("lsn=1001"));
    assert!(text.contains("Record Types"));
}

#[test]
fn test_records_json_export() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::records::execute(
        &cli::records::RecordsOptions {
            file: path_of(&file),
            format: LogFormat::Auto,
            limit: None,
            max_records: 10_000,
            op: None,
            verbose: false,
            no_heuristics: false,
            json: true,
            csv: false,
        },
        &mut out,
    )
    .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["record_count"], 3);
    assert_eq!(json["group_count"], 0);
    assert_eq!(json["header"]["start_lsn"], 1000);
    assert_eq!(json["records"][0]["start_lsn"], 1001);
    assert_eq!(json["records"][0]["transaction_id"], 12345);
}

#[test]
fn test_records_csv_export() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::records::execute(
        &cli::records::RecordsOptions {
            file: path_of(&file),
            format: LogFormat::Auto,
            limit: None,
            max_records: 10_000,
            op: None,
            verbose: false,
            no_heuristics: false,
            json: false,
            csv: true,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4); // header + 3 records
    assert!(lines[0].starts_with("index,lsn,type,class"));
    assert!(lines[1].contains("INSERT"));
    assert!(lines[1].contains("12345"));
    assert!(lines[3].contains("COMMIT"));
}

#[test]
fn test_records_operation_filter() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::records::execute(
        &cli::records::RecordsOptions {
            file: path_of(&file),
            format: LogFormat::Auto,
            limit: None,
            max_records: 10_000,
            op: Some(OperationClass::Insert),
            verbose: false,
            no_heuristics: false,
            json: true,
            csv: false,
        },
        &mut out,
    )
    .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["record_count"], 1);
}

#[test]
fn test_records_verbose_shows_payload_strings() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::records::execute(
        &cli::records::RecordsOptions {
            file: path_of(&file),
            format: LogFormat::Auto,
            limit: None,
            max_records: 10_000,
            op: None,
            verbose: true,
            no_heuristics: true,
            json: false,
            csv: false,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("sample insert data"));
    assert!(text.contains("txn=12345"));
}

#[test]
fn test_header_command_mysql() {
    let file = write_temp(&mysql_image());
    let mut out = Vec::new();

    cli::header::execute(
        &cli::header::HeaderOptions {
            file: path_of(&file),
            format: LogFormat::Mysql,
            json: false,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("MySQL block format"));
    assert!(text.contains("Checkpoint 1 (offset 512)"));
    assert!(text.contains("Sequence no:  3"));
    assert!(text.contains("Recovery start: LSN 2048"));
}

#[test]
fn test_header_command_json() {
    let file = write_temp(&mysql_image());
    let mut out = Vec::new();

    cli::header::execute(
        &cli::header::HeaderOptions {
            file: path_of(&file),
            format: LogFormat::Mysql,
            json: true,
        },
        &mut out,
    )
    .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["header"]["group_id"], 3);
    assert_eq!(json["checkpoints"]["slot1"]["sequence_no"], 3);
    assert_eq!(json["checkpoint_fallback"], false);
}

#[test]
fn test_blocks_command() {
    let file = write_temp(&mysql_image());
    let mut out = Vec::new();

    cli::blocks::execute(
        &cli::blocks::BlocksOptions {
            file: path_of(&file),
            blocks: None,
            no_empty: false,
            verbose: false,
            json: false,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Redo Log Blocks"));
    assert!(text.contains("Block      4"));
    assert!(text.contains("first_rec=12"));
    assert!(text.contains("Displayed 1 data blocks"));
}

#[test]
fn test_search_command_finds_payload() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::search::execute(
        &cli::search::SearchOptions {
            file: path_of(&file),
            text: "insert".to_string(),
            format: LogFormat::Auto,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("1 matching records"));
    assert!(text.contains("lsn=1001"));
}

#[test]
fn test_search_command_no_match() {
    let file = write_temp(&fixture_image());
    let mut out = Vec::new();

    cli::search::execute(
        &cli::search::SearchOptions {
            file: path_of(&file),
            text: "nonexistent".to_string(),
            format: LogFormat::Auto,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("No payload contains"));
}

#[test]
fn test_records_command_missing_file() {
    let mut out = Vec::new();
    let err = cli::records::execute(
        &cli::records::RecordsOptions {
            file: "/nonexistent/redo.log".to_string(),
            format: LogFormat::Auto,
            limit: None,
            max_records: 10_000,
            op: None,
            verbose: false,
            no_heuristics: false,
            json: false,
            csv: false,
        },
        &mut out,
    )
    .unwrap_err();
    assert!(matches!(err, redoscope::RedoError::Io(_)));
}
