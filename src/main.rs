//! main.rs
//! `simtemp` monitor: starts a simulated sensor, applies optional settings
//! through the attribute interface and prints every delivered sample.
//!
//! ```text
//! simtemp [--sampling MS] [--threshold MC] [--mode NAME] [--capacity N]
//!         [--duration SECS] [--csv PATH] [--test]
//! ```
//!
//! `--duration 0` runs until killed. `--test` exits 0 if an ALERT sample
//! shows up within 2 s, 1 otherwise.

use std::{
    process::ExitCode,
    time::{Duration, Instant},
};
use log::{error, info, warn};

use simtemp::{
    Configuration, ReadError, ReadMode, SampleReader, SimTempDevice,
    control::attributes::{self, Attribute},
    delivery::queue::DEFAULT_CAPACITY,
    utils::export::SampleRecorder,
};

const DEFAULT_DURATION_SECS: u64 = 10;
const SELF_TEST_THRESHOLD_MC: &str = "60000";
const SELF_TEST_WINDOW: Duration = Duration::from_secs(2);
const POLL_SLICE: Duration = Duration::from_millis(500);

const USAGE: &str = "usage: simtemp [--sampling MS] [--threshold MC] [--mode normal|noisy|ramp] \
[--capacity N] [--duration SECS] [--csv PATH] [--test]";

#[derive(Debug, Default)]
struct Options {
    settings: Vec<(Attribute, String)>,
    capacity: Option<usize>,
    duration: Option<u64>,
    csv: Option<String>,
    self_test: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();
    while let Some(flag) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{} needs a value", flag));
        match flag.as_str() {
            "--sampling" => opts.settings.push((Attribute::SamplingMs, value()?)),
            "--threshold" => opts.settings.push((Attribute::ThresholdMc, value()?)),
            "--mode" => opts.settings.push((Attribute::Mode, value()?)),
            "--capacity" => {
                let v = value()?;
                let n = v
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("invalid capacity '{}'", v))?;
                opts.capacity = Some(n);
            }
            "--duration" => {
                let v = value()?;
                opts.duration = Some(v.parse().map_err(|_| format!("invalid duration '{}'", v))?);
            }
            "--csv" => opts.csv = Some(value()?),
            "--test" => opts.self_test = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown argument '{}'\n{}", other, USAGE)),
        }
    }
    Ok(opts)
}

fn main() -> ExitCode {
    env_logger::init();

    let opts = match parse_args(std::env::args().skip(1)) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };

    let device = match SimTempDevice::start(
        Configuration::default(),
        opts.capacity.unwrap_or(DEFAULT_CAPACITY),
    ) {
        Ok(d) => d,
        Err(e) => {
            error!("[Main] failed to start device: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for (attr, input) in &opts.settings {
        if let Err(e) = attributes::store(device.core(), *attr, input) {
            eprintln!("{}: {}", attr, e);
            device.shutdown();
            return ExitCode::from(2);
        }
    }

    let reader = device.open(ReadMode::NonBlocking);
    let code = if opts.self_test {
        self_test(&device, &reader)
    } else {
        monitor(&device, &reader, &opts)
    };

    let stats = device.shutdown();
    info!("[Main] final stats: {}", stats);
    code
}

/// Forces every sample to alert and waits for the first one.
fn self_test(device: &SimTempDevice, reader: &SampleReader) -> ExitCode {
    if let Err(e) = attributes::store(device.core(), Attribute::ThresholdMc, SELF_TEST_THRESHOLD_MC) {
        error!("[SelfTest] cannot raise threshold: {}", e);
        return ExitCode::FAILURE;
    }

    let deadline = Instant::now() + SELF_TEST_WINDOW;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        if !reader.wait_readable(left) {
            continue;
        }
        // samples generated before the threshold change may come first
        while let Ok(s) = reader.next_sample() {
            if s.is_alert() {
                println!("ALERT received: {}", s);
                return ExitCode::SUCCESS;
            }
        }
    }

    eprintln!("no ALERT within {:?}", SELF_TEST_WINDOW);
    ExitCode::FAILURE
}

fn monitor(device: &SimTempDevice, reader: &SampleReader, opts: &Options) -> ExitCode {
    let recorder = match opts.csv.as_deref().map(SampleRecorder::start).transpose() {
        Ok(r) => r,
        Err(e) => {
            error!("[Main] cannot open csv output: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let duration = opts.duration.unwrap_or(DEFAULT_DURATION_SECS);
    let deadline = (duration > 0).then(|| Instant::now() + Duration::from_secs(duration));
    info!(
        "[Main] monitoring for {}",
        if duration > 0 { format!("{}s", duration) } else { "ever".to_string() }
    );

    let config = device.core().config();
    loop {
        let slice = match deadline {
            Some(d) => match d.checked_duration_since(Instant::now()) {
                Some(left) => left.min(POLL_SLICE),
                None => break,
            },
            None => POLL_SLICE,
        };
        if !reader.wait_readable(slice) {
            continue;
        }

        loop {
            match reader.next_sample() {
                Ok(sample) => {
                    let mode = config.mode();
                    println!("{} mode={}", sample, mode);
                    if let Some(rec) = &recorder {
                        rec.record(&sample, mode);
                    }
                }
                Err(ReadError::WouldBlock) => break,
                Err(e) => {
                    warn!("[Main] read stopped: {}", e);
                    break;
                }
            }
        }
    }

    if let Some(rec) = recorder {
        match rec.finish() {
            Ok(rows) => info!("[Main] wrote {} rows to {}", rows, opts.csv.as_deref().unwrap_or("")),
            Err(e) => {
                error!("[Main] csv export failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
