//! End-to-end runs against a live sampler thread.

use std::{
    collections::HashSet,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use simtemp::{
    Configuration, Mode, ReadError, ReadMode, SimTempDevice, RECORD_SIZE, Sample,
    sensor::generator::Generator,
};

fn start(sampling_ms: u32, threshold_mc: i32, mode: Mode, capacity: usize) -> SimTempDevice {
    SimTempDevice::start_with(
        Configuration::new(sampling_ms, threshold_mc, mode),
        capacity,
        Generator::with_seed(7),
    )
    .unwrap()
}

#[test]
fn samples_arrive_in_order_with_rising_timestamps() {
    let device = start(10, 45_000, Mode::Normal, 64);
    let reader = device.open(ReadMode::Blocking);

    let samples: Vec<Sample> = (0..10)
        .map(|_| reader.next_sample_timeout(Duration::from_secs(2)).unwrap())
        .collect();

    for pair in samples.windows(2) {
        assert!(pair[1].timestamp_ns > pair[0].timestamp_ns);
    }
    for s in &samples {
        assert!((40_000..50_000).contains(&s.temp_mc));
        assert_eq!(s.is_alert(), s.temp_mc <= 45_000);
    }
    device.shutdown();
}

#[test]
fn ramp_mode_produces_the_staircase() {
    let device = start(10, 0, Mode::Ramp, 64);
    let reader = device.open(ReadMode::Blocking);

    let temps: Vec<i32> = (0..21)
        .map(|_| reader.next_sample_timeout(Duration::from_secs(2)).unwrap().temp_mc)
        .collect();

    let expected: Vec<i32> = (0..20).map(|i| 40_000 + 500 * i).chain([40_000]).collect();
    assert_eq!(temps, expected);
    device.shutdown();
}

#[test]
fn binary_read_round_trips_the_record() {
    let device = start(10, 60_000, Mode::Noisy, 16);
    let reader = device.open(ReadMode::Blocking);

    let mut buf = [0u8; RECORD_SIZE];
    assert_eq!(reader.read(&mut buf), Ok(RECORD_SIZE));
    let s = Sample::from_bytes(&buf).unwrap();
    assert!(s.is_alert());
    assert!((20_000..60_000).contains(&s.temp_mc));
    device.shutdown();
}

#[test]
fn full_queue_drops_and_keeps_counting() {
    let device = start(10, 45_000, Mode::Normal, 4);
    thread::sleep(Duration::from_millis(150));

    let core = Arc::clone(device.core());
    assert_eq!(core.queue().len(), 4);
    let stats = device.shutdown();
    assert!(stats.updates > 4, "updates={}", stats.updates);
}

#[test]
fn config_change_applies_while_running() {
    let device = start(10, 45_000, Mode::Normal, 128);
    let reader = device.open(ReadMode::Blocking);
    reader.next_sample_timeout(Duration::from_secs(2)).unwrap();

    device.core().config().set_threshold_mc(100_000);
    // flush anything generated before the change
    thread::sleep(Duration::from_millis(30));
    while reader.next_sample_timeout(Duration::from_millis(1)).is_ok() {}

    let s = reader.next_sample_timeout(Duration::from_secs(2)).unwrap();
    assert!(s.is_alert());
    device.shutdown();
}

#[test]
fn concurrent_readers_see_each_sample_once() {
    let device = start(10, 45_000, Mode::Normal, 128);
    let readers: Vec<_> = (0..3).map(|_| device.open(ReadMode::Blocking)).collect();

    let handles: Vec<_> = readers
        .into_iter()
        .map(|r| {
            thread::spawn(move || {
                let mut seen = Vec::new();
                let until = Instant::now() + Duration::from_millis(300);
                while Instant::now() < until {
                    if let Ok(s) = r.next_sample_timeout(Duration::from_millis(50)) {
                        seen.push(s.timestamp_ns);
                    }
                }
                seen
            })
        })
        .collect();

    let all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    let unique: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());
    assert!(!all.is_empty());
    device.shutdown();
}

#[test]
fn shutdown_releases_blocked_reader() {
    let device = start(10_000, 45_000, Mode::Normal, 8);
    let reader = device.open(ReadMode::Blocking);

    let blocked = thread::spawn(move || reader.next_sample());
    thread::sleep(Duration::from_millis(30));

    let started = Instant::now();
    device.shutdown();
    assert_eq!(blocked.join().unwrap(), Err(ReadError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn poll_signals_priority_for_alerts() {
    let device = start(10, 100_000, Mode::Normal, 8);
    let reader = device.open(ReadMode::NonBlocking);

    let r = reader.poll(Duration::from_secs(2));
    assert!(r.readable && r.priority);

    while reader.next_sample().is_ok() {}
    device.core().config().set_threshold_mc(-1);
    thread::sleep(Duration::from_millis(30));
    while reader.next_sample().is_ok() {}

    let r = reader.poll(Duration::from_secs(2));
    assert!(r.readable);
    assert!(!r.priority);
    device.shutdown();
}
