//! export.rs
//! Background CSV recorder for delivered samples.
//!
//! The consumer pushes rows into a lock-free ring and never touches the
//! file; a writer thread drains the ring in batches and flushes
//! periodically. Rows that do not fit in the ring are counted and dropped.
//!
//! Columns: `timestamp_ns,temp_mc,alert,mode`

use std::{
    fs::File,
    io::{self, BufWriter},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use crossbeam_queue::ArrayQueue;
use csv::Writer;
use log::{debug, error, warn};
use serde::Serialize;

use crate::control::config::Mode;
use crate::sensor::sample::Sample;

pub const RECORDER_CAPACITY: usize = 4096;
const DRAIN_BATCH: usize = 256;
const FLUSH_BATCHES: usize = 8;
const WRITER_POLL_MS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleRow {
    pub timestamp_ns: u64,
    pub temp_mc: i32,
    pub alert: u8,
    pub mode: Mode,
}

impl SampleRow {
    pub fn new(sample: &Sample, mode: Mode) -> Self {
        Self {
            timestamp_ns: sample.timestamp_ns,
            temp_mc: sample.temp_mc,
            alert: sample.is_alert() as u8,
            mode,
        }
    }
}

pub struct SampleRecorder {
    queue: Arc<ArrayQueue<SampleRow>>,
    running: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    handle: Option<thread::JoinHandle<io::Result<u64>>>,
}

impl SampleRecorder {
    /// Creates the file up front so a bad path fails here, not in the
    /// writer thread.
    pub fn start(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        let queue = Arc::new(ArrayQueue::new(RECORDER_CAPACITY));
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let queue = Arc::clone(&queue);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("simtemp-recorder".into())
                .spawn(move || write_rows(file, &queue, &running))?
        };

        debug!("[Recorder] writing to {}", path.as_ref().display());
        Ok(Self {
            queue,
            running,
            dropped: Arc::new(AtomicU64::new(0)),
            handle: Some(handle),
        })
    }

    /// Queues one row. Returns false when the ring is full.
    #[inline]
    pub fn record(&self, sample: &Sample, mode: Mode) -> bool {
        if self.queue.push(SampleRow::new(sample, mode)).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops the writer after a final drain. Returns the number of rows
    /// written.
    pub fn finish(mut self) -> io::Result<u64> {
        self.stop()
    }

    fn stop(&mut self) -> io::Result<u64> {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let written = handle
            .join()
            .map_err(|_| io::Error::other("recorder thread panicked"))??;

        let dropped = self.dropped();
        if dropped > 0 {
            warn!("[Recorder] {} rows dropped (ring full)", dropped);
        }
        debug!("[Recorder] finished: rows={} dropped={}", written, dropped);
        Ok(written)
    }
}

impl Drop for SampleRecorder {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop() {
                error!("[Recorder] final flush failed: {}", e);
            }
        }
    }
}

fn write_rows(file: File, queue: &ArrayQueue<SampleRow>, running: &AtomicBool) -> io::Result<u64> {
    let mut wtr = Writer::from_writer(BufWriter::new(file));
    let mut written = 0u64;
    let mut batches = 0usize;

    while running.load(Ordering::SeqCst) {
        let mut any = false;
        for _ in 0..DRAIN_BATCH {
            let Some(row) = queue.pop() else { break };
            wtr.serialize(row)?;
            written += 1;
            any = true;
        }
        if any {
            batches += 1;
            if batches >= FLUSH_BATCHES {
                wtr.flush()?;
                batches = 0;
            }
        } else {
            thread::sleep(Duration::from_millis(WRITER_POLL_MS));
        }
    }

    // final drain
    while let Some(row) = queue.pop() {
        wtr.serialize(row)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}
