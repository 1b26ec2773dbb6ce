//! Body capture and rendering benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use trafficlog::{Formatter, JsonFormatter, StreamFormatter};
use trafficlog_core::capture::{capture, ContentEncoding};
use trafficlog_core::{Body, PhaseRecord, RequestLine, RequestLogId};

fn payload(size: usize) -> Vec<u8> {
    let unit = br#"{"id":12345,"name":"widget","tags":["a","b"]},"#;
    unit.iter().copied().cycle().take(size).collect()
}

fn bench_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture");

    for size in [1024usize, 64 * 1024] {
        let data = payload(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("chunks", size), &data, |b, data| {
            let mut body = Body::from_chunks(data.chunks(4096).map(|c| c.to_vec()));
            b.iter(|| capture(black_box(&mut body), &ContentEncoding::identity()).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("stream", size), &data, |b, data| {
            let mut body = Body::from_reader(Cursor::new(data.clone()));
            b.iter(|| capture(black_box(&mut body), &ContentEncoding::identity()).unwrap())
        });

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();
        let gzip = ContentEncoding::from_header(Some("gzip"));
        group.bench_with_input(BenchmarkId::new("gzip", size), &compressed, |b, compressed| {
            let mut body = Body::from(compressed.clone());
            b.iter(|| capture(black_box(&mut body), &gzip).unwrap())
        });
    }

    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let req = http::Request::post("https://api.example/orders?page=2")
        .header("content-type", "application/json")
        .header("user-agent", "bench")
        .body(())
        .unwrap();
    let mut body = Body::from(payload(2048));
    let record = PhaseRecord::request(RequestLogId::generate(), RequestLine::from_request(&req))
        .with_headers(req.headers())
        .with_capture(capture(&mut body, &ContentEncoding::identity()));

    let mut group = c.benchmark_group("format");
    let json = JsonFormatter::new();
    group.bench_function("json", |b| b.iter(|| json.format(black_box(&record))));
    let stream = StreamFormatter::new().pretty_print(true);
    group.bench_function("stream", |b| b.iter(|| stream.format(black_box(&record))));
    group.finish();
}

criterion_group!(benches, bench_capture, bench_format);
criterion_main!(benches);
