use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Underlying wall-time source sampled by `Clock::tick`.
///
/// Implementations must be monotonic: `now()` never returns a smaller value
/// than a previous call.
pub trait TimeSource {
    /// Elapsed time since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// `Instant`-backed source. The origin is the moment of construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicSource {
    origin: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}

/// Manually stepped source.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand the other to a `Clock`.
#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    now: Rc<Cell<Duration>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }

    /// Moves time forward by `secs` seconds. Negative or non-finite values are ignored.
    pub fn advance_secs(&self, secs: f64) {
        if let Ok(by) = Duration::try_from_secs_f64(secs) {
            self.advance(by);
        }
    }

    /// Sets the absolute time. Values earlier than the current time are ignored
    /// to keep the source monotonic.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl TimeSource for ManualSource {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
