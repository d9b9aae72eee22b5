use crate::sched::Scheduler;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by `FrameLoop`.
pub trait App<E, P = ()> {
    /// Called once before the first frame. Register classes and initial
    /// subscriptions here.
    fn setup(&mut self, scheduler: &Scheduler<E, P>) -> anyhow::Result<()> {
        let _ = scheduler;
        Ok(())
    }

    /// Called once per frame, after the clock and the scheduler have ticked.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, E, P>) -> AppControl;
}
