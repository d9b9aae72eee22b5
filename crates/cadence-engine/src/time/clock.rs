use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::source::{MonotonicSource, TimeSource};

/// Largest value returned by the lerp helpers. Keeps results strictly below 1.0
/// even when `0.5^x` underflows to zero.
const MAX_BLEND: f64 = 1.0 - f64::EPSILON;

const DEFAULT_SMOOTHING: f64 = 0.7;

/// Clock construction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockConfig {
    /// Weight of the newest delta in `average_delta`, in `[0, 1]`.
    pub smoothing: f64,

    /// Wall-time to logical-time multiplier.
    pub scale: f64,

    /// Optional upper bound on a single tick's logical delta, in seconds.
    ///
    /// Keeps downstream systems stable after debugger pauses or long stalls.
    /// Logical time only advances by the clamped amount.
    pub max_delta: Option<f64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            scale: 1.0,
            max_delta: None,
        }
    }
}

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Logical time elapsed since the previous tick, in seconds.
    pub dt: f64,

    /// Logical time since the first tick, in seconds.
    pub runtime: f64,

    /// Number of ticks that observed a wall-time advance.
    pub frame_index: u64,
}

/// Handle through which the clock owner and the scheduler share one clock.
pub type SharedClock = Rc<RefCell<Clock>>;

/// Logical frame clock.
///
/// Logical time is wall time scaled by `scale`, accumulated tick by tick so that
/// changing the scale or pausing never rewrites history. All times are `f64`
/// seconds so long sessions do not lose sub-millisecond resolution.
pub struct Clock {
    source: Box<dyn TimeSource>,

    last_wall: Option<Duration>,
    boot_time: f64,
    current_time: f64,
    previous_time: f64,
    delta: f64,
    average_delta: f64,
    frame_index: u64,

    smoothing: f64,
    scale: f64,
    max_delta: Option<f64>,
    active: bool,
}

impl Clock {
    /// Creates a clock over the process monotonic timer with default settings.
    pub fn new() -> Self {
        Self::with_config(ClockConfig::default())
    }

    pub fn with_config(config: ClockConfig) -> Self {
        Self::with_source(MonotonicSource::new(), config)
    }

    /// Creates a clock that samples `source` on every tick.
    pub fn with_source(source: impl TimeSource + 'static, config: ClockConfig) -> Self {
        let smoothing = if config.smoothing.is_nan() {
            log::warn!("clock smoothing is NaN, using {DEFAULT_SMOOTHING}");
            DEFAULT_SMOOTHING
        } else {
            config.smoothing.clamp(0.0, 1.0)
        };

        let scale = if valid_scale(config.scale) {
            config.scale
        } else {
            log::warn!("invalid clock scale {}, using 1.0", config.scale);
            1.0
        };

        let max_delta = config.max_delta.filter(|m| {
            let ok = m.is_finite() && *m > 0.0;
            if !ok {
                log::warn!("ignoring invalid clock max_delta {m}");
            }
            ok
        });

        Self {
            source: Box::new(source),
            last_wall: None,
            boot_time: 0.0,
            current_time: 0.0,
            previous_time: 0.0,
            delta: 0.0,
            average_delta: 0.0,
            frame_index: 0,
            smoothing,
            scale,
            max_delta,
            active: true,
        }
    }

    /// Wraps the clock in the shared handle the scheduler consumes.
    pub fn into_shared(self) -> SharedClock {
        Rc::new(RefCell::new(self))
    }

    /// Samples the time source and advances logical time.
    ///
    /// - the first tick fixes the boot instant and reports a zero delta
    /// - a tick with no wall-time advance is a no-op
    /// - a paused tick records wall time but reports a zero delta
    pub fn tick(&mut self) -> FrameTime {
        let wall = self.source.now();

        let Some(last) = self.last_wall else {
            self.last_wall = Some(wall);
            self.current_time = wall.as_secs_f64() * self.scale;
            self.previous_time = self.current_time;
            self.boot_time = self.current_time;
            return self.snapshot();
        };

        let wall_dt = wall.saturating_sub(last);
        if wall_dt.is_zero() {
            return self.snapshot();
        }

        self.last_wall = Some(wall);
        self.frame_index = self.frame_index.wrapping_add(1);

        let mut dt = if self.active {
            wall_dt.as_secs_f64() * self.scale
        } else {
            0.0
        };
        if let Some(max) = self.max_delta {
            dt = dt.min(max);
        }

        let next = self.current_time + dt;
        if next <= self.current_time {
            // Paused, zero scale, or below f64 resolution at this magnitude.
            self.delta = 0.0;
            return self.snapshot();
        }

        self.previous_time = self.current_time;
        self.current_time = next;
        self.delta = self.current_time - self.previous_time;
        self.average_delta =
            self.average_delta * (1.0 - self.smoothing) + self.delta * self.smoothing;

        self.snapshot()
    }

    /// Re-baselines wall time so the next tick carries no delta for the time
    /// elapsed until now. Logical time is kept.
    ///
    /// Useful after the host loop was suspended.
    pub fn reset(&mut self) {
        if self.last_wall.is_some() {
            self.last_wall = Some(self.source.now());
        }
    }

    /// Logical seconds since the first tick. This is the scheduler's time base.
    pub fn runtime(&self) -> f64 {
        self.current_time - self.boot_time
    }

    /// Absolute logical time at the latest tick.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Logical time at the previous advancing tick.
    pub fn previous_time(&self) -> f64 {
        self.previous_time
    }

    pub fn boot_time(&self) -> f64 {
        self.boot_time
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn average_delta(&self) -> f64 {
        self.average_delta
    }

    /// Ticks that observed a wall-time advance, paused ones included.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Changes the wall-to-logical multiplier for future ticks only.
    ///
    /// Negative or non-finite factors are ignored.
    pub fn set_scale(&mut self, factor: f64) {
        if valid_scale(factor) {
            self.scale = factor;
        } else {
            log::warn!("ignoring invalid clock scale {factor}");
        }
    }

    /// Frame-rate independent blend factor for a per-second `rate`, using the
    /// latest delta. Always in `[0, 1)`.
    pub fn lerp_rate(&self, rate: f64) -> f64 {
        blend_factor(self.delta, rate)
    }

    /// Same as `lerp_rate` but driven by the smoothed delta.
    pub fn lerp_avg_rate(&self, rate: f64) -> f64 {
        blend_factor(self.average_delta, rate)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pause(&mut self) {
        self.active = false;
    }

    pub fn play(&mut self) {
        self.active = true;
    }

    /// Flips between paused and playing. Returns the new `active` state.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        self.active
    }

    fn snapshot(&self) -> FrameTime {
        FrameTime {
            dt: self.delta,
            runtime: self.runtime(),
            frame_index: self.frame_index,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("runtime", &self.runtime())
            .field("delta", &self.delta)
            .field("average_delta", &self.average_delta)
            .field("frame_index", &self.frame_index)
            .field("scale", &self.scale)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

fn valid_scale(factor: f64) -> bool {
    factor.is_finite() && factor >= 0.0
}

fn blend_factor(dt: f64, rate: f64) -> f64 {
    let x = dt * rate;
    // Also rejects NaN.
    if !(x > 0.0) {
        return 0.0;
    }
    (1.0 - 0.5f64.powf(x)).min(MAX_BLEND)
}
