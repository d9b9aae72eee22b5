use std::cell::Cell;
use std::rc::Rc;

use anyhow::{Context, Result};
use cadence_engine::core::{App, AppControl, FrameCtx, FrameLoop, LoopConfig};
use cadence_engine::logging::{init_logging, LoggingConfig};
use cadence_engine::{ClassId, Clock, ClockConfig, Listener, Scheduler, TimerFn};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Event {
    Launch,
    Stage,
    Blink,
    Shutdown,
}

/// Headless mission demo: a countdown on timeouts, a beacon on a window, and a
/// stage counter on continuous listeners.
struct Mission {
    control: Option<ClassId>,
    stages: Rc<Cell<u32>>,
    done: Rc<Cell<bool>>,
    glow: f64,
}

impl Mission {
    fn new() -> Self {
        Self {
            control: None,
            stages: Rc::new(Cell::new(0)),
            done: Rc::new(Cell::new(false)),
            glow: 0.0,
        }
    }
}

impl App<Event, u32> for Mission {
    fn setup(&mut self, scheduler: &Scheduler<Event, u32>) -> Result<()> {
        let control = scheduler.register_class("control");
        let beacon = scheduler.register_class("beacon");
        self.control = Some(control);

        for (n, delay) in [(3, 0.0), (2, 1.0), (1, 2.0)] {
            let countdown = TimerFn::new(move |now| log::info!("[{now:6.3}s] T-{n}"));
            scheduler.subscribe_after(control, Event::Launch, &countdown, delay)?;
        }

        let sched = scheduler.clone();
        let liftoff = TimerFn::new(move |now| {
            log::info!("[{now:6.3}s] liftoff");
            if let Err(e) = sched.trigger(control, Event::Stage, &1) {
                log::error!("stage trigger failed: {e}");
            }
        });
        scheduler.subscribe_after(control, Event::Launch, &liftoff, 3.0)?;

        let stages = Rc::clone(&self.stages);
        let stage = Listener::new(move |now, n: &u32| {
            stages.set(stages.get() + 1);
            log::info!("[{now:6.3}s] stage {n} separation");
        });
        scheduler.subscribe(control, Event::Stage, &stage)?;

        let first = Listener::new(|now, _: &u32| {
            log::info!("[{now:6.3}s] first stage event observed");
        });
        scheduler.subscribe_once(control, Event::Stage, &first)?;

        scheduler.subscribe_window(
            beacon,
            Event::Blink,
            &TimerFn::new(|now| log::info!("[{now:6.3}s] beacon blink")),
            1.5,
        )?;

        let done = Rc::clone(&self.done);
        let shutdown = Listener::new(move |now, _: &u32| {
            log::info!("[{now:6.3}s] shutdown requested");
            done.set(true);
        });
        scheduler.subscribe(control, Event::Shutdown, &shutdown)?;

        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, Event, u32>) -> AppControl {
        // Ease towards full glow at the same speed regardless of frame rate.
        self.glow += (1.0 - self.glow) * ctx.lerp_rate(2.0);

        let Some(control) = self.control else {
            return AppControl::Exit;
        };

        if self.stages.get() == 1 && ctx.time.runtime >= 3.5 {
            if let Err(e) = ctx.scheduler.trigger(control, Event::Stage, &2) {
                log::error!("stage trigger failed: {e}");
                return AppControl::Exit;
            }
        }
        if self.stages.get() >= 2 && !self.done.get() {
            if let Err(e) = ctx.scheduler.trigger(control, Event::Shutdown, &0) {
                log::error!("shutdown trigger failed: {e}");
                return AppControl::Exit;
            }
        }

        if self.done.get() {
            log::info!("glow settled at {:.3} after {} frames", self.glow, ctx.time.frame_index);
            AppControl::Exit
        } else {
            AppControl::Continue
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let clock = Clock::with_config(ClockConfig {
        max_delta: Some(0.25),
        ..ClockConfig::default()
    });
    let frame_loop: FrameLoop<Event, u32> = FrameLoop::new(clock);

    let config = LoopConfig {
        target_fps: 60.0,
        max_frames: Some(600),
    };
    let frames = frame_loop
        .run(&mut Mission::new(), config)
        .context("mission loop failed")?;

    log::info!("mission ended after {frames} frames");
    Ok(())
}
