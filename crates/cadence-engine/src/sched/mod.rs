//! Event and timer scheduling.
//!
//! One `Scheduler` owns four registries:
//! - continuous listeners, fired on every `trigger` of their `(class, event)` pair
//! - one-shot listeners, fired by the next `trigger` and then dropped
//! - timeouts, fired once after a delay of clock runtime
//! - windows, fired once after an interval, grouped by class and event type
//!
//! Timeouts and windows are purely time-driven and drain in `Scheduler::tick`,
//! which the host loop calls once per frame right after `Clock::tick`.

mod callback;
mod class;
mod due;
mod error;
mod listeners;
mod scheduler;
mod timeout;
mod window;

pub use callback::{Listener, TimerFn};
pub use class::ClassId;
pub use error::{Result, SchedulerError};
pub use scheduler::{Scheduler, TickReport};
