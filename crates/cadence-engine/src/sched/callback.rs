use std::fmt;
use std::ptr;
use std::rc::Rc;

/// Callback for continuous and one-shot subscriptions.
///
/// Invoked with the scheduler runtime and the producer's payload. Clones share
/// identity: unsubscribing with any clone removes the subscription.
pub struct Listener<P> {
    f: Rc<dyn Fn(f64, &P)>,
}

impl<P> Listener<P> {
    pub fn new(f: impl Fn(f64, &P) + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// Identity comparison. Two separately constructed listeners are never the
    /// same, even when built from the same closure body.
    pub fn same(&self, other: &Self) -> bool {
        ptr::addr_eq(Rc::as_ptr(&self.f), Rc::as_ptr(&other.f))
    }

    pub(crate) fn call(&self, runtime: f64, payload: &P) {
        (self.f)(runtime, payload)
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self { f: Rc::clone(&self.f) }
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.f))
    }
}

/// Callback for timeouts and windows. Invoked with the scheduler runtime.
#[derive(Clone)]
pub struct TimerFn {
    f: Rc<dyn Fn(f64)>,
}

impl TimerFn {
    pub fn new(f: impl Fn(f64) + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    pub fn same(&self, other: &Self) -> bool {
        ptr::addr_eq(Rc::as_ptr(&self.f), Rc::as_ptr(&other.f))
    }

    pub(crate) fn call(&self, runtime: f64) {
        (self.f)(runtime)
    }

    /// Address of the shared closure. Stable while any clone is alive.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.f) as *const () as usize
    }
}

impl fmt::Debug for TimerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerFn({:p})", Rc::as_ptr(&self.f))
    }
}
