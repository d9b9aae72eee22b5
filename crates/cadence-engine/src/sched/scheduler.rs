use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::time::SharedClock;

use super::callback::{Listener, TimerFn};
use super::class::{ClassId, ClassTable};
use super::error::{Result, SchedulerError};
use super::listeners::ListenerTable;
use super::timeout::TimeoutQueue;
use super::window::WindowQueue;

/// Outcome of one `Scheduler::tick`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Runtime every callback in this tick was invoked with.
    pub runtime: f64,
    pub timeouts_fired: usize,
    pub windows_fired: usize,
}

struct Registry<E, P> {
    classes: ClassTable,
    continuous: ListenerTable<E, P>,
    once: ListenerTable<E, P>,
    timeouts: TimeoutQueue<E>,
    windows: WindowQueue<E>,
}

impl<E, P> Registry<E, P> {
    fn check(&self, class: ClassId) -> Result<()> {
        if self.classes.contains(class) {
            Ok(())
        } else {
            Err(SchedulerError::UnregisteredClass(class))
        }
    }
}

/// Event and timer scheduler driven once per frame.
///
/// `Scheduler` is a handle: clones share the same registries, so consumer
/// modules can each keep one. `E` is the event type (usually a small enum) and
/// `P` is the payload passed through `trigger`.
///
/// No registry borrow is held while a callback runs, so callbacks may
/// subscribe, unsubscribe, or trigger on the same scheduler.
pub struct Scheduler<E, P = ()> {
    inner: Rc<RefCell<Registry<E, P>>>,
    clock: SharedClock,
}

impl<E, P> Clone for Scheduler<E, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            clock: Rc::clone(&self.clock),
        }
    }
}

impl<E, P> fmt::Debug for Scheduler<E, P>
where
    E: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(reg) => f
                .debug_struct("Scheduler")
                .field("classes", &reg.classes.len())
                .field("timeouts", &reg.timeouts.len())
                .field("windows", &reg.windows.len())
                .finish(),
            Err(_) => f.write_str("Scheduler { <dispatching> }"),
        }
    }
}

impl<E, P> Scheduler<E, P>
where
    E: Clone + Eq + Hash,
{
    /// Creates a scheduler that reads its time base from `clock`.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                classes: ClassTable::new(),
                continuous: ListenerTable::new(),
                once: ListenerTable::new(),
                timeouts: TimeoutQueue::new(),
                windows: WindowQueue::new(),
            })),
            clock,
        }
    }

    /// The clock this scheduler reads.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Current logical runtime of the shared clock.
    pub fn runtime(&self) -> f64 {
        self.clock.borrow().runtime()
    }

    // ── classes ───────────────────────────────────────────────────────────

    /// Registers a consumer class and returns its token.
    ///
    /// Registering a name that is already registered returns the existing
    /// token and leaves its subscriptions untouched.
    pub fn register_class(&self, name: &str) -> ClassId {
        let mut reg = self.inner.borrow_mut();
        let (id, fresh) = reg.classes.register(name);
        if fresh {
            reg.continuous.add_class(id);
            reg.once.add_class(id);
            log::debug!("registered event class {name:?} as {id}");
        } else {
            log::warn!("event class {name:?} is already registered, reusing {id}");
        }
        id
    }

    /// Drops every subscription of `class` and retires its token.
    pub fn unregister_class(&self, class: ClassId) -> Result<()> {
        let mut reg = self.inner.borrow_mut();
        reg.check(class)?;
        let dropped = reg.continuous.drop_class(class)
            + reg.once.drop_class(class)
            + reg.timeouts.drop_class(class)
            + reg.windows.drop_class(class);
        reg.classes.unregister(class);
        log::debug!("unregistered event class {class}, dropped {dropped} subscriptions");
        Ok(())
    }

    pub fn is_registered(&self, class: ClassId) -> bool {
        self.inner.borrow().classes.contains(class)
    }

    pub fn class_name(&self, class: ClassId) -> Option<String> {
        self.inner.borrow().classes.name(class).map(str::to_owned)
    }

    // ── continuous / one-shot ─────────────────────────────────────────────

    /// Adds a listener fired on every `trigger` of the pair, in subscription
    /// order. Subscribing the same listener twice is a no-op.
    pub fn subscribe(&self, class: ClassId, event: E, listener: &Listener<P>) -> Result<()> {
        let mut reg = self.inner.borrow_mut();
        reg.check(class)?;
        reg.continuous.add(class, event, listener);
        Ok(())
    }

    /// Removes a continuous listener by identity.
    pub fn unsubscribe(&self, class: ClassId, event: E, listener: &Listener<P>) -> bool {
        self.inner.borrow_mut().continuous.remove(class, &event, listener)
    }

    /// Adds a listener fired by the next `trigger` of the pair only.
    pub fn subscribe_once(&self, class: ClassId, event: E, listener: &Listener<P>) -> Result<()> {
        let mut reg = self.inner.borrow_mut();
        reg.check(class)?;
        reg.once.add(class, event, listener);
        Ok(())
    }

    /// Cancels a pending one-shot listener by identity.
    pub fn unsubscribe_once(&self, class: ClassId, event: E, listener: &Listener<P>) -> bool {
        self.inner.borrow_mut().once.remove(class, &event, listener)
    }

    /// Fires the pair's continuous listeners, then its one-shot listeners,
    /// synchronously. Returns the number of callbacks invoked.
    ///
    /// Both lists are captured before the first callback runs: changes made by
    /// callbacks apply to the next trigger. The one-shot list is cleared up
    /// front, so one-shots added during dispatch wait for the next trigger.
    pub fn trigger(&self, class: ClassId, event: E, payload: &P) -> Result<usize> {
        let now = self.runtime();
        let (continuous, once) = {
            let mut reg = self.inner.borrow_mut();
            reg.check(class)?;
            let continuous = reg.continuous.snapshot(class, &event);
            let once = reg.once.take(class, &event);
            (continuous, once)
        };

        for listener in continuous.iter().chain(once.iter()) {
            listener.call(now, payload);
        }
        Ok(continuous.len() + once.len())
    }

    pub fn listener_count(&self, class: ClassId, event: E) -> usize {
        self.inner.borrow().continuous.count(class, &event)
    }

    pub fn once_count(&self, class: ClassId, event: E) -> usize {
        self.inner.borrow().once.count(class, &event)
    }

    // ── timeouts ──────────────────────────────────────────────────────────

    /// Schedules `timer` to fire once, `delay` seconds of runtime from now.
    pub fn subscribe_after(
        &self,
        class: ClassId,
        event: E,
        timer: &TimerFn,
        delay: f64,
    ) -> Result<()> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(SchedulerError::InvalidDelay(delay));
        }
        let due = self.runtime() + delay;
        let mut reg = self.inner.borrow_mut();
        reg.check(class)?;
        reg.timeouts.insert(class, event, timer, due);
        Ok(())
    }

    /// Cancels the earliest pending timeout for the triple.
    pub fn unsubscribe_after(&self, class: ClassId, event: E, timer: &TimerFn) -> bool {
        self.inner.borrow_mut().timeouts.remove(class, &event, timer)
    }

    pub fn pending_timeouts(&self) -> usize {
        self.inner.borrow().timeouts.len()
    }

    // ── windows ───────────────────────────────────────────────────────────

    /// Schedules `timer` to fire once, `interval` seconds of runtime from now,
    /// grouped under the class and event type.
    ///
    /// Windows are not re-armed after firing; subscribe again to repeat.
    pub fn subscribe_window(
        &self,
        class: ClassId,
        event: E,
        timer: &TimerFn,
        interval: f64,
    ) -> Result<()> {
        if !(interval.is_finite() && interval >= 0.0) {
            return Err(SchedulerError::InvalidInterval(interval));
        }
        let due = self.runtime() + interval;
        let mut reg = self.inner.borrow_mut();
        reg.check(class)?;
        reg.windows.insert(class, event, timer, due);
        Ok(())
    }

    pub fn unsubscribe_window(&self, class: ClassId, event: E, timer: &TimerFn) -> bool {
        self.inner.borrow_mut().windows.remove(class, &event, timer)
    }

    pub fn pending_windows(&self) -> usize {
        self.inner.borrow().windows.len()
    }

    pub fn window_count(&self, class: ClassId, event: E) -> usize {
        self.inner.borrow().windows.count(class, &event)
    }

    /// Earliest runtime at which a timeout or window is due.
    pub fn next_due(&self) -> Option<f64> {
        let mut reg = self.inner.borrow_mut();
        let timeout = reg.timeouts.next_due();
        let window = reg.windows.next_due();
        match (timeout, window) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ── tick ──────────────────────────────────────────────────────────────

    /// Fires due timeouts, then due windows.
    ///
    /// Runtime is read once; every callback of the tick sees the same value.
    /// Timeouts fire in ascending due order. Windows fire in ascending due
    /// order across all classes, ties broken by subscription order. Work
    /// scheduled by a callback during this tick fires on a later tick, even
    /// with a zero delay.
    pub fn tick(&self) -> TickReport {
        let now = self.runtime();
        let mut report = TickReport {
            runtime: now,
            ..TickReport::default()
        };

        // Both watermarks are taken before any callback runs, so a window
        // subscribed by a timeout callback waits for a later tick.
        let (timeout_limit, window_limit) = {
            let reg = self.inner.borrow();
            (reg.timeouts.watermark(), reg.windows.watermark())
        };

        loop {
            let next = self.inner.borrow_mut().timeouts.pop_due(now, timeout_limit);
            let Some(timer) = next else { break };
            timer.call(now);
            report.timeouts_fired += 1;
        }

        loop {
            let next = self.inner.borrow_mut().windows.pop_due(now, window_limit);
            let Some(timer) = next else { break };
            timer.call(now);
            report.windows_fired += 1;
        }

        if report.timeouts_fired + report.windows_fired > 0 {
            log::trace!(
                "tick at {now:.4}s fired {} timeouts, {} windows",
                report.timeouts_fired,
                report.windows_fired
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Clock, ClockConfig, ManualSource};
    use approx::assert_relative_eq;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    enum Ev {
        Spawn,
        Hit,
        Blink,
    }

    type Log<T> = Rc<RefCell<Vec<T>>>;

    fn log<T>() -> Log<T> {
        Rc::new(RefCell::new(Vec::new()))
    }

    struct Fixture {
        src: ManualSource,
        clock: SharedClock,
        sched: Scheduler<Ev, i32>,
    }

    impl Fixture {
        fn new() -> Self {
            let src = ManualSource::new();
            let clock = Clock::with_source(src.clone(), ClockConfig::default()).into_shared();
            clock.borrow_mut().tick();
            let sched = Scheduler::new(Rc::clone(&clock));
            Self { src, clock, sched }
        }

        fn advance(&self, secs: f64) -> TickReport {
            self.src.advance_secs(secs);
            self.clock.borrow_mut().tick();
            self.sched.tick()
        }
    }

    fn counter(hits: &Rc<RefCell<usize>>) -> TimerFn {
        let hits = Rc::clone(hits);
        TimerFn::new(move |_| *hits.borrow_mut() += 1)
    }

    fn tagged<T: Copy + 'static>(out: &Log<T>, tag: T) -> Listener<i32> {
        let out = Rc::clone(out);
        Listener::new(move |_, _: &i32| out.borrow_mut().push(tag))
    }

    fn tagged_timer<T: Copy + 'static>(out: &Log<T>, tag: T) -> TimerFn {
        let out = Rc::clone(out);
        TimerFn::new(move |_| out.borrow_mut().push(tag))
    }

    // ── classes ───────────────────────────────────────────────────────────

    #[test]
    fn foreign_class_is_rejected() {
        let f = Fixture::new();
        let other = Fixture::new();
        let foreign = other.sched.register_class("hud");
        let l = Listener::new(|_, _: &i32| {});
        let t = TimerFn::new(|_| {});

        let err = SchedulerError::UnregisteredClass(foreign);
        assert_eq!(f.sched.subscribe(foreign, Ev::Spawn, &l), Err(err.clone()));
        assert_eq!(f.sched.subscribe_once(foreign, Ev::Spawn, &l), Err(err.clone()));
        assert_eq!(f.sched.subscribe_after(foreign, Ev::Spawn, &t, 1.0), Err(err.clone()));
        assert_eq!(f.sched.subscribe_window(foreign, Ev::Spawn, &t, 1.0), Err(err.clone()));
        assert_eq!(f.sched.trigger(foreign, Ev::Spawn, &0), Err(err));
        assert!(!f.sched.unsubscribe(foreign, Ev::Spawn, &l));
    }

    #[test]
    fn reregistering_keeps_subscriptions() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        f.sched.subscribe(hud, Ev::Spawn, &tagged(&out, 1)).unwrap();

        let again = f.sched.register_class("hud");
        assert_eq!(again, hud);
        assert_eq!(f.sched.trigger(hud, Ev::Spawn, &0), Ok(1));
        assert_eq!(*out.borrow(), vec![1]);
    }

    #[test]
    fn unregister_drops_everything_and_retires_token() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        f.sched.subscribe(hud, Ev::Spawn, &Listener::new(|_, _: &i32| {})).unwrap();
        f.sched.subscribe_after(hud, Ev::Spawn, &counter(&hits), 1.0).unwrap();
        f.sched.subscribe_window(hud, Ev::Blink, &counter(&hits), 1.0).unwrap();

        f.sched.unregister_class(hud).unwrap();
        assert!(!f.sched.is_registered(hud));
        assert_eq!(f.sched.pending_timeouts(), 0);
        assert_eq!(f.sched.pending_windows(), 0);
        let idle = TickReport {
            runtime: 2.0,
            timeouts_fired: 0,
            windows_fired: 0,
        };
        assert_eq!(f.advance(2.0), idle);
        assert_eq!(*hits.borrow(), 0);
        assert!(f.sched.unregister_class(hud).is_err());

        let fresh = f.sched.register_class("hud");
        assert_ne!(fresh, hud);
        assert_eq!(f.sched.listener_count(fresh, Ev::Spawn), 0);
        assert_eq!(f.sched.class_name(fresh).as_deref(), Some("hud"));
    }

    // ── trigger ───────────────────────────────────────────────────────────

    #[test]
    fn continuous_fires_until_unsubscribed() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        let l = tagged(&out, 'a');
        f.sched.subscribe(hud, Ev::Hit, &l).unwrap();

        for _ in 0..3 {
            f.sched.trigger(hud, Ev::Hit, &0).unwrap();
        }
        assert!(f.sched.unsubscribe(hud, Ev::Hit, &l));
        assert!(!f.sched.unsubscribe(hud, Ev::Hit, &l));
        f.sched.trigger(hud, Ev::Hit, &0).unwrap();
        assert_eq!(out.borrow().len(), 3);
    }

    #[test]
    fn listeners_receive_runtime_and_payload() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let seen = log();
        let out = Rc::clone(&seen);
        let record = Listener::new(move |t, p: &i32| out.borrow_mut().push((t, *p)));
        f.sched.subscribe(hud, Ev::Hit, &record).unwrap();

        f.advance(1.5);
        f.sched.trigger(hud, Ev::Hit, &7).unwrap();
        let (t, p) = seen.borrow()[0];
        assert_relative_eq!(t, 1.5);
        assert_eq!(p, 7);
    }

    #[test]
    fn continuous_in_order_then_once() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        f.sched.subscribe_once(hud, Ev::Hit, &tagged(&out, 3)).unwrap();
        f.sched.subscribe(hud, Ev::Hit, &tagged(&out, 1)).unwrap();
        f.sched.subscribe(hud, Ev::Hit, &tagged(&out, 2)).unwrap();

        assert_eq!(f.sched.trigger(hud, Ev::Hit, &0), Ok(3));
        assert_eq!(*out.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_subscribe_is_noop() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        let l = tagged(&out, 1);
        f.sched.subscribe(hud, Ev::Hit, &l).unwrap();
        f.sched.subscribe(hud, Ev::Hit, &l.clone()).unwrap();
        assert_eq!(f.sched.listener_count(hud, Ev::Hit), 1);
    }

    #[test]
    fn once_fires_each_listener_exactly_once() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        f.sched.subscribe_once(hud, Ev::Spawn, &tagged(&out, 'a')).unwrap();
        f.sched.subscribe_once(hud, Ev::Spawn, &tagged(&out, 'b')).unwrap();
        assert_eq!(f.sched.once_count(hud, Ev::Spawn), 2);

        assert_eq!(f.sched.trigger(hud, Ev::Spawn, &0), Ok(2));
        assert_eq!(f.sched.trigger(hud, Ev::Spawn, &0), Ok(0));
        assert_eq!(*out.borrow(), vec!['a', 'b']);
        assert_eq!(f.sched.once_count(hud, Ev::Spawn), 0);
    }

    #[test]
    fn once_can_be_cancelled() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        let l = tagged(&out, 'a');
        f.sched.subscribe_once(hud, Ev::Spawn, &l).unwrap();
        assert!(f.sched.unsubscribe_once(hud, Ev::Spawn, &l));
        assert_eq!(f.sched.trigger(hud, Ev::Spawn, &0), Ok(0));
    }

    #[test]
    fn trigger_is_scoped_to_pair() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let cam = f.sched.register_class("camera");
        let out = log();
        f.sched.subscribe(hud, Ev::Hit, &tagged(&out, "hud-hit")).unwrap();
        f.sched.subscribe(cam, Ev::Hit, &tagged(&out, "cam-hit")).unwrap();
        f.sched.subscribe(hud, Ev::Spawn, &tagged(&out, "hud-spawn")).unwrap();

        f.sched.trigger(hud, Ev::Hit, &0).unwrap();
        assert_eq!(*out.borrow(), vec!["hud-hit"]);
    }

    #[test]
    fn unsubscribe_during_dispatch_applies_next_trigger() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        let b = tagged(&out, 'b');

        let sched = f.sched.clone();
        let victim = b.clone();
        let a_out = Rc::clone(&out);
        let a = Listener::new(move |_, _: &i32| {
            a_out.borrow_mut().push('a');
            sched.unsubscribe(hud, Ev::Hit, &victim);
        });
        f.sched.subscribe(hud, Ev::Hit, &a).unwrap();
        f.sched.subscribe(hud, Ev::Hit, &b).unwrap();

        f.sched.trigger(hud, Ev::Hit, &0).unwrap();
        f.sched.trigger(hud, Ev::Hit, &0).unwrap();
        assert_eq!(*out.borrow(), vec!['a', 'b', 'a']);
    }

    #[test]
    fn once_added_during_dispatch_waits_for_next_trigger() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        let late = tagged(&out, 'o');

        let sched = f.sched.clone();
        let l = Listener::new(move |_, _: &i32| {
            sched.subscribe_once(hud, Ev::Hit, &late).unwrap();
        });
        f.sched.subscribe(hud, Ev::Hit, &l).unwrap();

        assert_eq!(f.sched.trigger(hud, Ev::Hit, &0), Ok(1));
        assert!(out.borrow().is_empty());
        assert_eq!(f.sched.trigger(hud, Ev::Hit, &0), Ok(2));
        assert_eq!(*out.borrow(), vec!['o']);
    }

    #[test]
    fn nested_trigger_from_listener() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        f.sched.subscribe(hud, Ev::Spawn, &tagged(&out, "spawn")).unwrap();

        let sched = f.sched.clone();
        let relay = Listener::new(move |_, p: &i32| {
            sched.trigger(hud, Ev::Spawn, p).unwrap();
        });
        f.sched.subscribe(hud, Ev::Hit, &relay).unwrap();

        f.sched.trigger(hud, Ev::Hit, &0).unwrap();
        assert_eq!(*out.borrow(), vec!["spawn"]);
    }

    #[test]
    fn trigger_leaves_timers_alone() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        f.sched.subscribe_after(hud, Ev::Hit, &counter(&hits), 0.0).unwrap();
        f.sched.subscribe_window(hud, Ev::Hit, &counter(&hits), 0.0).unwrap();

        assert_eq!(f.sched.trigger(hud, Ev::Hit, &0), Ok(0));
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(f.sched.pending_timeouts(), 1);
    }

    // ── timeouts ──────────────────────────────────────────────────────────

    #[test]
    fn timeouts_fire_in_due_order() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        for delay in [5.0, 1.0, 3.0] {
            f.sched
                .subscribe_after(hud, Ev::Spawn, &tagged_timer(&out, delay), delay)
                .unwrap();
        }

        assert_eq!(f.advance(0.5).timeouts_fired, 0);
        assert_eq!(f.advance(5.0).timeouts_fired, 3);
        assert_eq!(*out.borrow(), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn colliding_due_times_both_fire() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        f.sched.subscribe_after(hud, Ev::Spawn, &counter(&hits), 2.0).unwrap();
        f.sched.subscribe_after(hud, Ev::Spawn, &counter(&hits), 2.0).unwrap();
        assert_eq!(f.sched.pending_timeouts(), 2);

        f.advance(2.0);
        f.advance(2.0);
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn timeouts_fire_at_due_tick_with_tick_runtime() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let seen = log();
        let out = Rc::clone(&seen);
        f.advance(1.0);
        f.sched
            .subscribe_after(hud, Ev::Spawn, &TimerFn::new(move |t| out.borrow_mut().push(t)), 0.5)
            .unwrap();
        assert_relative_eq!(f.sched.next_due().unwrap(), 1.5);

        f.advance(0.25);
        assert!(seen.borrow().is_empty());
        let report = f.advance(0.5);
        assert_eq!(*seen.borrow(), vec![report.runtime]);
        assert_relative_eq!(report.runtime, 1.75);
    }

    #[test]
    fn invalid_delay_is_rejected() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let t = TimerFn::new(|_| {});
        assert_eq!(
            f.sched.subscribe_after(hud, Ev::Spawn, &t, -1.0),
            Err(SchedulerError::InvalidDelay(-1.0))
        );
        assert!(f.sched.subscribe_after(hud, Ev::Spawn, &t, f64::NAN).is_err());
        assert!(f.sched.subscribe_window(hud, Ev::Spawn, &t, f64::INFINITY).is_err());
        assert_eq!(f.sched.pending_timeouts(), 0);
    }

    #[test]
    fn unsubscribe_after_cancels_pending() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        let t = counter(&hits);
        f.sched.subscribe_after(hud, Ev::Spawn, &t, 1.0).unwrap();
        assert!(f.sched.unsubscribe_after(hud, Ev::Spawn, &t));
        f.advance(2.0);
        assert_eq!(*hits.borrow(), 0);

        f.sched.subscribe_after(hud, Ev::Spawn, &t, 1.0).unwrap();
        f.advance(2.0);
        assert_eq!(*hits.borrow(), 1);
        assert!(!f.sched.unsubscribe_after(hud, Ev::Spawn, &t));
    }

    #[test]
    fn zero_delay_from_callback_fires_next_tick() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        let follow_up = counter(&hits);

        let sched = f.sched.clone();
        let chain = TimerFn::new(move |_| {
            sched.subscribe_after(hud, Ev::Spawn, &follow_up, 0.0).unwrap();
        });
        f.sched.subscribe_after(hud, Ev::Spawn, &chain, 1.0).unwrap();

        assert_eq!(f.advance(1.0).timeouts_fired, 1);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(f.advance(0.016).timeouts_fired, 1);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn window_from_timeout_callback_waits_for_next_tick() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        let blink = counter(&hits);

        let sched = f.sched.clone();
        let arm = TimerFn::new(move |_| {
            sched.subscribe_window(hud, Ev::Blink, &blink, 0.0).unwrap();
        });
        f.sched.subscribe_after(hud, Ev::Spawn, &arm, 1.0).unwrap();

        let report = f.advance(1.0);
        assert_eq!(report.timeouts_fired, 1);
        assert_eq!(report.windows_fired, 0);
        assert_eq!(*hits.borrow(), 0);

        assert_eq!(f.advance(0.016).windows_fired, 1);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn cancel_from_timeout_stops_later_timeout_in_same_tick() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        let victim = counter(&hits);

        let sched = f.sched.clone();
        let target = victim.clone();
        let cancel = TimerFn::new(move |_| {
            sched.unsubscribe_after(hud, Ev::Spawn, &target);
        });
        f.sched.subscribe_after(hud, Ev::Spawn, &cancel, 1.0).unwrap();
        f.sched.subscribe_after(hud, Ev::Spawn, &victim, 1.0).unwrap();

        let report = f.advance(1.0);
        assert_eq!(report.timeouts_fired, 1);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(f.sched.pending_timeouts(), 0);

        f.advance(1.0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn paused_clock_holds_timers() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        f.sched.subscribe_after(hud, Ev::Spawn, &counter(&hits), 1.0).unwrap();

        f.clock.borrow_mut().pause();
        f.advance(10.0);
        assert_eq!(*hits.borrow(), 0);

        f.clock.borrow_mut().play();
        f.advance(1.0);
        assert_eq!(*hits.borrow(), 1);
    }

    // ── windows ───────────────────────────────────────────────────────────

    #[test]
    fn window_fires_once_per_registration() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        let t = counter(&hits);
        f.sched.subscribe_window(hud, Ev::Blink, &t, 2.0).unwrap();
        assert_eq!(f.sched.window_count(hud, Ev::Blink), 1);

        assert_eq!(f.advance(1.0).windows_fired, 0);
        assert_eq!(f.advance(1.5).windows_fired, 1);
        assert_eq!(f.advance(5.0).windows_fired, 0);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(f.sched.window_count(hud, Ev::Blink), 0);

        f.sched.subscribe_window(hud, Ev::Blink, &t, 2.0).unwrap();
        f.advance(2.0);
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn windows_fire_in_global_due_order() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let cam = f.sched.register_class("camera");
        let out = log();
        f.sched.subscribe_window(hud, Ev::Blink, &tagged_timer(&out, "hud-3"), 3.0).unwrap();
        f.sched.subscribe_window(cam, Ev::Hit, &tagged_timer(&out, "cam-1"), 1.0).unwrap();
        f.sched.subscribe_window(hud, Ev::Spawn, &tagged_timer(&out, "hud-1"), 1.0).unwrap();

        assert_eq!(f.advance(4.0).windows_fired, 3);
        assert_eq!(*out.borrow(), vec!["cam-1", "hud-1", "hud-3"]);
    }

    #[test]
    fn timeouts_sweep_before_windows() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let out = log();
        f.sched.subscribe_window(hud, Ev::Blink, &tagged_timer(&out, "window"), 0.5).unwrap();
        f.sched.subscribe_after(hud, Ev::Blink, &tagged_timer(&out, "timeout"), 1.0).unwrap();

        f.advance(1.0);
        assert_eq!(*out.borrow(), vec!["timeout", "window"]);
    }

    #[test]
    fn cancel_from_timeout_stops_window_in_same_tick() {
        let f = Fixture::new();
        let hud = f.sched.register_class("hud");
        let hits = Rc::new(RefCell::new(0));
        let blink = counter(&hits);

        let sched = f.sched.clone();
        let victim = blink.clone();
        let cancel = TimerFn::new(move |_| {
            sched.unsubscribe_window(hud, Ev::Blink, &victim);
        });
        f.sched.subscribe_window(hud, Ev::Blink, &blink, 1.0).unwrap();
        f.sched.subscribe_after(hud, Ev::Blink, &cancel, 1.0).unwrap();

        let report = f.advance(1.0);
        assert_eq!(report.timeouts_fired, 1);
        assert_eq!(report.windows_fired, 0);
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(f.sched.pending_windows(), 0);
    }

    #[test]
    fn schedulers_do_not_share_state() {
        let a = Fixture::new();
        let b = Fixture::new();
        let hud_a = a.sched.register_class("hud");
        let hud_b = b.sched.register_class("hud");
        a.sched.subscribe_after(hud_a, Ev::Spawn, &TimerFn::new(|_| {}), 1.0).unwrap();

        assert_eq!(b.sched.pending_timeouts(), 0);
        assert!(!b.sched.is_registered(hud_a));
        assert!(b.sched.is_registered(hud_b));
        assert_eq!(b.sched.next_due(), None);
    }
}
