//! Benchmarks for frame, batch and numeric decoding

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use fanuc_focas::{
    decode_number, demux_batch, parse_directory, CommandRecord, Frame, FrameType, Opcode,
    DIRECTORY_RECORD_SIZE,
};

fn frame_benchmarks(c: &mut Criterion) {
    let payload = vec![0x5Au8; 240];
    let encoded = Frame::encode(FrameType::DataChunk, &payload).unwrap();

    c.bench_function("frame_encode_240", |b| {
        b.iter(|| Frame::encode(black_box(FrameType::DataChunk), black_box(&payload)))
    });
    c.bench_function("frame_decode_240", |b| {
        b.iter(|| Frame::decode(black_box(&encoded)))
    });
}

fn batch_benchmarks(c: &mut Criterion) {
    let opcode = Opcode::new(1, 1, 0x15);
    let requests: Vec<CommandRecord> = (100..164)
        .map(|key| CommandRecord::new(opcode).with_params(&[key, key]))
        .collect();
    let items: Vec<Vec<u8>> = (0..64)
        .map(|_| {
            let mut item = vec![0x00, 0x15, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0x00, 0x08];
            item.extend_from_slice(&[0, 0, 0x27, 0x10, 0, 10, 0, 2]);
            item
        })
        .collect();

    c.bench_function("batch_demux_64", |b| {
        b.iter(|| demux_batch(black_box(&requests), black_box(&items)))
    });
}

fn record_benchmarks(c: &mut Criterion) {
    let window = [0x00, 0x01, 0xE2, 0x40, 0x00, 0x0A, 0x00, 0x03];
    c.bench_function("decode_number", |b| {
        b.iter(|| decode_number(black_box(&window), 0))
    });

    let mut listing = vec![0u8; DIRECTORY_RECORD_SIZE * 10];
    for (i, record) in listing.chunks_exact_mut(DIRECTORY_RECORD_SIZE).enumerate() {
        record[1] = 1;
        record[28..33].copy_from_slice(format!("O{:04}", i).as_bytes());
    }
    c.bench_function("parse_directory_10", |b| {
        b.iter(|| parse_directory(black_box(&listing)))
    });
}

criterion_group!(benches, frame_benchmarks, batch_benchmarks, record_benchmarks);
criterion_main!(benches);
