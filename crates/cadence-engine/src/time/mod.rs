//! Time subsystem.
//!
//! Provides the logical clock that every scheduled callback is measured against.
//! Intended usage:
//! - one `Clock` per host loop, shared with the scheduler through `SharedClock`
//! - call `tick()` once per presented frame, before the scheduler ticks

mod clock;
mod source;

pub use clock::{Clock, ClockConfig, FrameTime, SharedClock};
pub use source::{ManualSource, MonotonicSource, TimeSource};
