//! Message codec benchmark suite.
//!
//! Benchmarks inbound decoding and outbound encoding at frame sizes typical
//! for a low-resolution MJPEG feed:
//! - Frame payloads: 8 KiB, 64 KiB, 256 KiB of base64
//! - Status and command messages
//!
//! Run with: cargo bench --bench codec
//! Results saved to: target/criterion/

use std::hint::black_box;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;

use camera_socket::{Command, InboundMessage};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const FRAME_SIZES: &[usize] = &[8 * 1024, 64 * 1024, 256 * 1024];

fn frame_message(size: usize) -> String {
    let bytes: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    json!({
        "type": "frame",
        "image": STANDARD.encode(bytes),
        "timestamp": 1_700_000_000_000u64,
    })
    .to_string()
}

// ============================================================================
// Benchmark: Inbound Decode
// ============================================================================

fn bench_decode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");

    for &size in FRAME_SIZES {
        let message = frame_message(size);
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &message, |b, text| {
            b.iter(|| InboundMessage::decode(black_box(text)));
        });
    }

    group.finish();
}

fn bench_decode_image(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_image");

    for &size in FRAME_SIZES {
        let Ok(InboundMessage::Frame(frame)) = InboundMessage::decode(&frame_message(size)) else {
            panic!("benchmark frame must decode");
        };
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| black_box(frame).decode_image());
        });
    }

    group.finish();
}

fn bench_decode_status(c: &mut Criterion) {
    let message = r#"{"type":"status","data":{"fps":12,"recording":false,"rssi":-61}}"#;
    c.bench_function("decode_status", |b| {
        b.iter(|| InboundMessage::decode(black_box(message)));
    });
}

// ============================================================================
// Benchmark: Outbound Encode
// ============================================================================

fn bench_encode_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_command");

    let commands = [
        ("request_frame", Command::RequestFrame),
        ("capture", Command::Capture),
        (
            "custom",
            Command::custom("setResolution", Some(json!({"width": 640, "height": 480}))),
        ),
    ];

    for (name, command) in &commands {
        group.bench_with_input(BenchmarkId::from_parameter(name), command, |b, command| {
            b.iter(|| black_box(command).encode());
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(
    benches,
    bench_decode_frame,
    bench_decode_image,
    bench_decode_status,
    bench_encode_commands
);
criterion_main!(benches);
