use crate::sched::{Scheduler, TickReport};
use crate::time::{FrameTime, SharedClock};

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a, E, P = ()> {
    /// Clock snapshot taken at the start of the frame.
    pub time: FrameTime,
    /// What the scheduler fired this frame.
    pub tick: TickReport,
    pub scheduler: &'a Scheduler<E, P>,
    pub clock: &'a SharedClock,
}

impl<E, P> FrameCtx<'_, E, P> {
    /// Frame-length corrected blend factor for a per-second `rate`.
    ///
    /// Shorthand for `Clock::lerp_rate` on the shared clock.
    pub fn lerp_rate(&self, rate: f64) -> f64 {
        self.clock.borrow().lerp_rate(rate)
    }

    pub fn lerp_avg_rate(&self, rate: f64) -> f64 {
        self.clock.borrow().lerp_avg_rate(rate)
    }
}
