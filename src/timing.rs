//! Scoped timing helpers reporting through `tracing`

use std::time::{Duration, Instant};
use tracing::debug;

/// Measures a labelled span of work, reporting on drop.
///
/// Callers that want the raw duration can call [`elapsed`] or
/// [`stop`]; otherwise the elapsed time is logged at debug level when
/// the stopwatch goes out of scope.
///
/// [`elapsed`]: Stopwatch::elapsed
/// [`stop`]: Stopwatch::stop
#[derive(Debug)]
pub struct Stopwatch {
    label: &'static str,
    start: Instant,
    reported: bool,
}

impl Stopwatch {
    /// Starts timing a labelled operation
    pub fn start(label: &'static str) -> Self {
        Stopwatch {
            label,
            start: Instant::now(),
            reported: false,
        }
    }

    /// Time elapsed since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stops the watch, reports once, and returns the elapsed time
    pub fn stop(mut self) -> Duration {
        let elapsed = self.elapsed();
        self.report(elapsed);
        elapsed
    }

    fn report(&mut self, elapsed: Duration) {
        if !self.reported {
            self.reported = true;
            debug!(label = self.label, ?elapsed, "timed");
        }
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        self.report(elapsed);
    }
}

/// Runs a closure under a stopwatch, returning its result and the
/// elapsed time
pub fn timed<T>(label: &'static str, f: impl FnOnce() -> T) -> (T, Duration) {
    let watch = Stopwatch::start(label);
    let result = f();
    (result, watch.stop())
}
