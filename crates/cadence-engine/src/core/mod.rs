//! Core engine-facing contracts.
//!
//! Defines the interface between the host loop and consumer code, and the
//! loop itself. The loop owns the clock/scheduler tick order so consumers
//! cannot get it wrong.

mod app;
mod ctx;
mod frame_loop;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
pub use frame_loop::{FrameLoop, LoopConfig};
