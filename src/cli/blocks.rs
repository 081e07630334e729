use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use colored::Colorize;
use serde::Serialize;

use crate::cli::wprintln;
use crate::redo::block::{
    validate_block_checksum, BlockHeader, BLOCK_HDR_SIZE, BLOCK_SIZE, FILE_HDR_SIZE,
};
use crate::util::hex::hex_dump;
use crate::RedoError;

pub struct BlocksOptions {
    pub file: String,
    pub blocks: Option<u64>,
    pub no_empty: bool,
    pub verbose: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct BlocksJson {
    file: String,
    file_size: u64,
    total_blocks: u64,
    data_blocks: u64,
    blocks: Vec<BlockJson>,
}

#[derive(Serialize)]
struct BlockJson {
    block_index: u64,
    block_no: u32,
    flush_flag: bool,
    data_len: u16,
    first_rec_group: u16,
    epoch_no: u32,
    checksum_valid: bool,
}

pub fn execute(opts: &BlocksOptions, writer: &mut dyn Write) -> Result<(), RedoError> {
    let mut file = File::open(&opts.file)
        .map_err(|e| RedoError::Io(format!("Cannot open {}: {}", opts.file, e)))?;
    let file_size = file
        .metadata()
        .map_err(|e| RedoError::Io(format!("Cannot stat {}: {}", opts.file, e)))?
        .len();

    if file_size < FILE_HDR_SIZE {
        return Err(RedoError::TruncatedHeader(format!(
            "{} is {} bytes, smaller than the {}-byte file header",
            opts.file, file_size, FILE_HDR_SIZE
        )));
    }

    let total_blocks = file_size / BLOCK_SIZE as u64;
    let data_blocks = total_blocks.saturating_sub(FILE_HDR_SIZE / BLOCK_SIZE as u64);
    let limit = opts.blocks.unwrap_or(data_blocks).min(data_blocks);

    if !opts.json {
        wprintln!(writer, "{}", "Redo Log Blocks".bold())?;
        wprintln!(writer, "  File:   {}", opts.file)?;
        wprintln!(writer, "  Size:   {} bytes", file_size)?;
        wprintln!(
            writer,
            "  Blocks: {} total ({} data)",
            total_blocks,
            data_blocks
        )?;
        wprintln!(writer)?;
    }

    let mut blocks_json = Vec::new();
    let mut displayed = 0u64;
    let mut empty_skipped = 0u64;
    let mut buf = vec![0u8; BLOCK_SIZE];

    for i in 0..limit {
        let block_idx = FILE_HDR_SIZE / BLOCK_SIZE as u64 + i;
        file.seek(SeekFrom::Start(block_idx * BLOCK_SIZE as u64))
            .map_err(|e| RedoError::Io(format!("Seek error: {}", e)))?;
        file.read_exact(&mut buf)
            .map_err(|e| RedoError::Io(format!("Read error at block {}: {}", block_idx, e)))?;

        let hdr = match BlockHeader::parse(&buf) {
            Some(h) => h,
            None => continue,
        };

        if opts.no_empty && !hdr.has_data() {
            empty_skipped += 1;
            continue;
        }

        let checksum_ok = validate_block_checksum(&buf);

        if opts.json {
            blocks_json.push(BlockJson {
                block_index: block_idx,
                block_no: hdr.block_no,
                flush_flag: hdr.flush_flag,
                data_len: hdr.data_len,
                first_rec_group: hdr.first_rec_group,
                epoch_no: hdr.epoch_no,
                checksum_valid: checksum_ok,
            });
        } else {
            let csum = if checksum_ok {
                "OK".green().to_string()
            } else {
                "INVALID".red().to_string()
            };
            let flush = if hdr.flush_flag { " FLUSH" } else { "" };
            wprintln!(
                writer,
                "  Block {:>6}  no={:<10} len={:<5} first_rec={:<5} epoch={:<10} csum={}{}",
                block_idx,
                hdr.block_no,
                hdr.data_len,
                hdr.first_rec_group,
                hdr.epoch_no,
                csum,
                flush,
            )?;

            if opts.verbose && hdr.has_data() {
                let data_end = (hdr.data_len as usize).clamp(BLOCK_HDR_SIZE, BLOCK_SIZE - 4);
                let base = block_idx * BLOCK_SIZE as u64 + BLOCK_HDR_SIZE as u64;
                for line in hex_dump(&buf[BLOCK_HDR_SIZE..data_end], base).lines() {
                    wprintln!(writer, "    {}", line)?;
                }
            }
        }

        displayed += 1;
    }

    if opts.json {
        let json = serde_json::to_string_pretty(&BlocksJson {
            file: opts.file.clone(),
            file_size,
            total_blocks,
            data_blocks,
            blocks: blocks_json,
        })
        .map_err(|e| RedoError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    if opts.no_empty && empty_skipped > 0 {
        wprintln!(writer, "  ({} empty blocks skipped)", empty_skipped)?;
    }
    wprintln!(writer)?;
    wprintln!(
        writer,
        "Displayed {} data blocks{}",
        displayed,
        if limit < data_blocks {
            format!(" (of {})", data_blocks)
        } else {
            String::new()
        }
    )?;

    Ok(())
}
