//! Cadence engine crate.
//!
//! Frame-driven timing core: a logical clock and the event/timer scheduler
//! that runs off it, plus the host-loop contract that ticks both.

pub mod core;
pub mod sched;
pub mod time;

pub mod logging;

pub use sched::{ClassId, Listener, Scheduler, SchedulerError, TimerFn};
pub use time::{Clock, ClockConfig, SharedClock};
