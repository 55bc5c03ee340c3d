//! Byte queue and buffered device throughput benchmarks.
//!
//! - Queue: reserve/fill/free cycles, chunk adoption, line scanning
//! - Device: buffered reads from memory, fragmented pipe reads, text mode
//!
//! Inputs are deterministic so runs are comparable.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use iocore::bytes::{ByteQueue, Bytes};
use iocore::io::{Device, MemoryDevice, OpenMode, PipeDevice};

fn pattern(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn text(lines: usize) -> Bytes {
    let mut out = Vec::new();
    for i in 0..lines {
        out.extend_from_slice(format!("line number {i} with some payload\r\n").as_bytes());
    }
    Bytes::from(out)
}

// =============================================================================
// QUEUE BENCHMARKS
// =============================================================================

fn bench_queue_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("byte_queue");

    for &size in &[64usize, 1024, 16 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("reserve_free", size), &size, |b, &size| {
            let mut queue = ByteQueue::new();
            b.iter(|| {
                if let Some(slot) = queue.reserve(size) {
                    slot.fill(0xab);
                }
                queue.free(black_box(size));
            });
        });

        group.bench_with_input(BenchmarkId::new("append_read_chunk", size), &size, |b, &size| {
            let chunk = pattern(size);
            let mut queue = ByteQueue::new();
            b.iter(|| {
                queue.append(chunk.clone());
                black_box(queue.read_chunk())
            });
        });
    }

    group.throughput(Throughput::Bytes(64 * 1024));
    group.bench_function("read_lines", |b| {
        let data = text(2048);
        b.iter(|| {
            let mut queue = ByteQueue::new();
            queue.append(data.clone());
            let mut line = [0u8; 128];
            while let Some(n) = queue.read_line(&mut line) {
                if n == 0 {
                    break;
                }
                black_box(&line[..n]);
            }
        });
    });

    group.finish();
}

// =============================================================================
// DEVICE BENCHMARKS
// =============================================================================

fn bench_device_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("device");
    let data = pattern(256 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for &read_size in &[16usize, 512, 64 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("memory_read", read_size),
            &read_size,
            |b, &read_size| {
                b.iter(|| {
                    let mut dev = Device::new(MemoryDevice::from_bytes(data.clone()));
                    let _ = dev.open(OpenMode::READ_ONLY);
                    let mut buf = vec![0u8; read_size];
                    while let Ok(n) = dev.read_into(&mut buf) {
                        if n == 0 {
                            break;
                        }
                        black_box(&buf[..n]);
                    }
                });
            },
        );
    }

    group.bench_function("pipe_fragmented", |b| {
        b.iter(|| {
            let mut raw = PipeDevice::new().with_read_limit(1500);
            raw.feed(data.clone());
            let mut dev = Device::new(raw);
            let _ = dev.open(OpenMode::READ_ONLY);
            black_box(dev.read_all().map(|all| all.len()))
        });
    });

    let lines = text(4096);
    group.throughput(Throughput::Bytes(lines.len() as u64));
    group.bench_function("text_read_line", |b| {
        b.iter(|| {
            let mut dev = Device::new(MemoryDevice::from_bytes(lines.clone()));
            let _ = dev.open(OpenMode::READ_ONLY | OpenMode::TEXT);
            let mut count = 0usize;
            while let Ok(line) = dev.read_line(0) {
                if line.is_empty() {
                    break;
                }
                count += 1;
            }
            black_box(count)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_queue_operations, bench_device_reads);
criterion_main!(benches);
