use std::hash::Hash;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::sched::{Scheduler, TickReport};
use crate::time::{Clock, FrameTime, SharedClock};

use super::app::{App, AppControl};
use super::ctx::FrameCtx;

/// Host loop pacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopConfig {
    /// Frames per second the loop sleeps towards. Frames that overrun their
    /// budget start the next one immediately.
    pub target_fps: f64,

    /// Stop after this many frames. `None` runs until the app exits.
    pub max_frames: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            max_frames: None,
        }
    }
}

/// Owns the shared clock and its scheduler, and ticks them in order.
pub struct FrameLoop<E, P = ()> {
    clock: SharedClock,
    scheduler: Scheduler<E, P>,
}

impl<E, P> FrameLoop<E, P>
where
    E: Clone + Eq + Hash,
{
    pub fn new(clock: Clock) -> Self {
        let clock = clock.into_shared();
        let scheduler = Scheduler::new(Rc::clone(&clock));
        Self { clock, scheduler }
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &Scheduler<E, P> {
        &self.scheduler
    }

    /// Runs one frame of timing work: `Clock::tick`, then `Scheduler::tick`.
    pub fn step(&self) -> (FrameTime, TickReport) {
        let time = self.clock.borrow_mut().tick();
        let tick = self.scheduler.tick();
        (time, tick)
    }

    /// Drives `app` until it returns `AppControl::Exit` or `max_frames` is
    /// reached. Returns the number of frames run.
    pub fn run<A>(&self, app: &mut A, config: LoopConfig) -> Result<u64>
    where
        A: App<E, P>,
    {
        if !(config.target_fps.is_finite() && config.target_fps > 0.0) {
            bail!("target_fps must be positive and finite, got {}", config.target_fps);
        }
        let budget = Duration::from_secs_f64(1.0 / config.target_fps);

        app.setup(&self.scheduler).context("app setup failed")?;
        log::debug!("frame loop started at {} fps", config.target_fps);

        let mut frames = 0u64;
        while config.max_frames.is_none_or(|max| frames < max) {
            let started = Instant::now();
            let (time, tick) = self.step();
            frames += 1;

            let mut ctx = FrameCtx {
                time,
                tick,
                scheduler: &self.scheduler,
                clock: &self.clock,
            };
            if app.on_frame(&mut ctx) == AppControl::Exit {
                log::debug!("app requested exit after {frames} frames");
                break;
            }

            if let Some(rest) = budget.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        Ok(frames)
    }
}
