/*
Measures the sample queue under contention: one producer pushing through the
device (queue + readiness notify) while several consumers drain it with
non-blocking takes. Shows how the single queue lock scales with readers.
*/

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use simtemp::{Configuration, ReadError, Sample, SampleFlags, SimTemp};
use std::{
    hint::black_box,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

const CONSUMER_COUNTS: &[usize] = &[1, 2, 4, 8];

// Samples pushed per iteration
const PUSHES: u64 = 20_000;

fn bench_publish_uncontended(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_publish");

    for flags in [SampleFlags::NEW, SampleFlags::NEW | SampleFlags::ALERT] {
        group.bench_function(format!("publish_take_{:#x}", flags.bits()), |b| {
            let dev = SimTemp::new(Configuration::default(), 128).unwrap();
            let _watch = dev.subscribe();
            b.iter(|| {
                dev.publish(black_box(Sample::new(1, 41_000, flags)));
                black_box(dev.try_take().ok());
            });
        });
    }
    group.finish();
}

fn bench_queue_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_contention");
    group.sample_size(10);

    for &consumers in CONSUMER_COUNTS {
        group.bench_with_input(
            BenchmarkId::new("producer_vs_readers", consumers),
            &consumers,
            |b, &consumers| {
                b.iter(|| {
                    let dev = Arc::new(SimTemp::new(Configuration::default(), 128).unwrap());
                    let done = Arc::new(AtomicBool::new(false));

                    let handles: Vec<_> = (0..consumers)
                        .map(|_| {
                            let dev = Arc::clone(&dev);
                            let done = Arc::clone(&done);
                            thread::spawn(move || {
                                let mut got = 0u64;
                                loop {
                                    match dev.try_take() {
                                        Ok(s) => {
                                            black_box(s);
                                            got += 1;
                                        }
                                        Err(ReadError::WouldBlock) if done.load(Ordering::Acquire) => break,
                                        Err(_) => std::hint::spin_loop(),
                                    }
                                }
                                got
                            })
                        })
                        .collect();

                    for ts in 0..PUSHES {
                        dev.publish(Sample::new(ts, 42_000, SampleFlags::NEW));
                    }
                    done.store(true, Ordering::Release);

                    let taken: u64 = handles.into_iter().map(|h| h.join().unwrap_or(0)).sum();
                    black_box(taken);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_publish_uncontended, bench_queue_contention);
criterion_main!(benches);
