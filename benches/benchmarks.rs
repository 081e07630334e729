//! Criterion benchmarks for the hot parsing paths.
//!
//! Benchmarks cover:
//! - Compressed-integer decoding across the width classes
//! - Block header parsing
//! - Full record decoding over a synthetic multi-block log

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use redoscope::redo::analysis::{analyze_bytes, MAX_RECORDS};
use redoscope::redo::block::BlockHeader;
use redoscope::redo::compressed::{decode_compressed_u64, encode_compressed_u64};
use redoscope::redo::format::LogFormat;

const BLOCK_SIZE: usize = 512;
const BLOCK_HDR: usize = 12;
const CHECKSUM_OFFSET: usize = 508;

fn build_block(block_no: u32, payload: &[u8]) -> Vec<u8> {
    let mut block = vec![0u8; BLOCK_SIZE];
    BigEndian::write_u32(&mut block[0..], block_no);
    BigEndian::write_u16(&mut block[4..], (BLOCK_HDR + payload.len()) as u16);
    BigEndian::write_u16(&mut block[6..], 12);
    block[BLOCK_HDR..BLOCK_HDR + payload.len()].copy_from_slice(payload);
    let crc = crc32c::crc32c(&block[..CHECKSUM_OFFSET]);
    BigEndian::write_u32(&mut block[CHECKSUM_OFFSET..], crc);
    block
}

/// Synthetic log: file header plus `blocks` data blocks of string-write
/// records closed by MULTI_REC_END markers.
fn build_log(blocks: u32) -> Vec<u8> {
    let mut cp = vec![0u8; BLOCK_SIZE];
    LittleEndian::write_u64(&mut cp[0..], 1);
    LittleEndian::write_u64(&mut cp[8..], 2048);
    LittleEndian::write_u64(&mut cp[16..], 2048);

    let mut image = vec![0u8; BLOCK_SIZE];
    image.extend_from_slice(&cp);
    image.extend_from_slice(&vec![0u8; 2 * BLOCK_SIZE]);

    for block_no in 0..blocks {
        let mut data = Vec::new();
        for i in 0..20u16 {
            data.push(30u8);
            let mut buf = [0u8; 2];
            LittleEndian::write_u16(&mut buf, i * 8);
            data.extend_from_slice(&buf);
            LittleEndian::write_u16(&mut buf, 16);
            data.extend_from_slice(&buf);
            data.extend_from_slice(&[0x61; 16]);
        }
        data.push(31);
        image.extend_from_slice(&build_block(4 + block_no, &data));
    }
    image
}

fn bench_compressed_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("compressed_decode");
    for value in [0x40u64, 0x1234, 0x12_3456, 0x0123_4567, 0x2_3456_789A] {
        let mut bytes = Vec::new();
        encode_compressed_u64(value, &mut bytes);
        group.bench_function(format!("{}b", bytes.len()), |b| {
            b.iter(|| decode_compressed_u64(black_box(&bytes)))
        });
    }
    group.finish();
}

fn bench_block_header_parse(c: &mut Criterion) {
    let block = build_block(7, &[0x61; 400]);
    c.bench_function("block_header_parse", |b| {
        b.iter(|| BlockHeader::parse(black_box(&block)))
    });
}

fn bench_full_parse(c: &mut Criterion) {
    let image = build_log(256);
    let mut group = c.benchmark_group("full_parse");
    group.throughput(Throughput::Bytes(image.len() as u64));
    group.bench_function("256_blocks", |b| {
        b.iter(|| analyze_bytes(black_box(image.clone()), LogFormat::Mysql, MAX_RECORDS).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_compressed_decode,
    bench_block_header_parse,
    bench_full_parse
);
criterion_main!(benches);
