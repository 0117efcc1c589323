//! Wall-clock measurement and repeated timing of named operations.

use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_REPEAT: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => panic!("repeat count must be non-zero"),
};

/// Monotonic stopwatch for one measured block.
///
/// Dropping a stopwatch that was never stopped (a panic unwinding through the
/// block) still records the elapsed time in the log.
pub struct Stopwatch<'a> {
    label: &'a str,
    start: Instant,
    stopped: bool,
}

impl<'a> Stopwatch<'a> {
    pub fn start(label: &'a str) -> Self {
        Self {
            label,
            start: Instant::now(),
            stopped: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.stopped = true;
        debug!(label = self.label, elapsed_ms = elapsed.as_secs_f64() * 1e3, "stopwatch stopped");
        elapsed
    }
}

impl Drop for Stopwatch<'_> {
    fn drop(&mut self) {
        if !self.stopped {
            warn!(
                label = self.label,
                elapsed_ms = self.start.elapsed().as_secs_f64() * 1e3,
                "stopwatch dropped while running"
            );
        }
    }
}

/// Value produced by a measured block, with its duration.
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Run `block` between a start and stop of the monotonic clock.
///
/// The duration is taken whatever the block returns, so a block that yields
/// an `Err` is measured like any other.
pub fn measure<T, F>(label: &str, block: F) -> Timed<T>
where
    F: FnOnce() -> T,
{
    let stopwatch = Stopwatch::start(label);
    let value = block();
    let elapsed = stopwatch.stop();
    Timed { value, elapsed }
}

/// Samples gathered for one named benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    name: String,
    samples: Vec<Duration>,
}

impl BenchmarkResult {
    /// `None` when `samples` is empty.
    pub fn new(name: impl Into<String>, samples: Vec<Duration>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            samples,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Seconds.
    pub fn min(&self) -> f64 {
        self.samples
            .iter()
            .min()
            .map_or(0.0, Duration::as_secs_f64)
    }

    /// Seconds.
    pub fn mean(&self) -> f64 {
        let total: f64 = self.samples.iter().map(Duration::as_secs_f64).sum();
        total / self.samples.len() as f64
    }

    /// Seconds.
    pub fn max(&self) -> f64 {
        self.samples
            .iter()
            .max()
            .map_or(0.0, Duration::as_secs_f64)
    }
}

impl fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<40}    min: {:6.3}    mean: {:6.3}    max: {:6.3}",
            self.name,
            self.min(),
            self.mean(),
            self.max()
        )
    }
}

/// Call `operation` `repeat` times in sequence and collect one sample per
/// call. The first error is returned as-is and no further calls are made.
pub fn time_repeated<F, E>(
    name: &str,
    mut operation: F,
    repeat: NonZeroUsize,
) -> Result<BenchmarkResult, E>
where
    F: FnMut() -> Result<(), E>,
{
    let mut samples = Vec::with_capacity(repeat.get());
    for iteration in 1..=repeat.get() {
        println!("\n *** Running {} [Iteration: {}]", name, iteration);
        let timed = measure(name, &mut operation);
        timed.value?;
        samples.push(timed.elapsed);
    }
    let result = BenchmarkResult {
        name: name.to_string(),
        samples,
    };
    debug!(
        bench = name,
        min = result.min(),
        mean = result.mean(),
        max = result.max(),
        "benchmark complete"
    );
    Ok(result)
}

/// Like [`time_repeated`], returning the formatted report line.
pub fn run_timed<F, E>(name: &str, operation: F, repeat: NonZeroUsize) -> Result<String, E>
where
    F: FnMut() -> Result<(), E>,
{
    time_repeated(name, operation, repeat).map(|result| result.to_string())
}

/// One line per result, in the order given.
pub fn summarize<I, T>(results: I) -> String
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    results
        .into_iter()
        .map(|result| result.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
