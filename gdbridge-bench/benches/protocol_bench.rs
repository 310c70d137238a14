//! Frame encoding/decoding benchmarks.

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gdbridge_protocol::{Frame, FrameReader, MessageSummary};
use tokio::runtime::Runtime;

fn create_test_body(payload_size: usize) -> Bytes {
    Bytes::from(format!(
        r#"{{"jsonrpc":"2.0","id":42,"method":"textDocument/didChange","params":{{"text":"{}"}}}}"#,
        "x".repeat(payload_size)
    ))
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for size in [100, 1000, 10000, 100000] {
        let frame = Frame::new(create_test_body(size));

        group.throughput(Throughput::Bytes(frame.content_length() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, frame| {
            b.iter(|| black_box(frame.encode()));
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for size in [100, 1000, 10000, 100000] {
        let encoded = Frame::new(create_test_body(size)).encode();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| {
                let mut buf = encoded.clone();
                black_box(Frame::decode(&mut buf).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_reader_small_chunks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("reader_many_frames");

    for count in [10, 100, 1000] {
        let mut wire = BytesMut::new();
        for _ in 0..count {
            wire.extend_from_slice(&Frame::new(create_test_body(200)).encode());
        }
        let wire = wire.freeze();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &wire, |b, wire| {
            b.to_async(&rt).iter(|| async move {
                let mut reader = FrameReader::new(&wire[..]);
                let mut n = 0;
                while let Some(frame) = reader.read_frame().await.unwrap() {
                    n += black_box(frame).content_length();
                }
                n
            });
        });
    }

    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_summary");

    for size in [100, 10000] {
        let body = create_test_body(size);

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &body, |b, body| {
            b.iter(|| black_box(MessageSummary::from_payload(body)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_reader_small_chunks,
    bench_summary,
);

criterion_main!(benches);
