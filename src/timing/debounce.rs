use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    foundation::core::Millis,
    timing::scheduler::{Scheduler, TimerHandle},
};

struct State<T> {
    latest: Option<T>,
    timer: Option<TimerHandle>,
    cancelled: bool,
    fired: u64,
}

struct Inner<T> {
    scheduler: Scheduler,
    delay: Millis,
    action: Box<dyn Fn(T)>,
    state: RefCell<State<T>>,
}

/// Collapses bursts of calls into one action invocation with the last input.
///
/// Each call restarts the quiet period; the action runs `delay` ms after the last call of a
/// burst. Cloning yields another handle to the same debouncer.
pub struct Debouncer<T: 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: 'static> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.inner.state.borrow();
        f.debug_struct("Debouncer")
            .field("delay", &self.inner.delay)
            .field("pending", &st.latest.is_some())
            .field("cancelled", &st.cancelled)
            .field("fired", &st.fired)
            .finish()
    }
}

/// Build a debouncer that runs `action` on `scheduler` after `delay` ms of quiet.
pub fn make_debouncer<T: 'static>(
    scheduler: &Scheduler,
    delay: Millis,
    action: impl Fn(T) + 'static,
) -> Debouncer<T> {
    Debouncer {
        inner: Rc::new(Inner {
            scheduler: scheduler.clone(),
            delay,
            action: Box::new(action),
            state: RefCell::new(State {
                latest: None,
                timer: None,
                cancelled: false,
                fired: 0,
            }),
        }),
    }
}

impl<T: 'static> Debouncer<T> {
    /// Record `input` and restart the quiet period. Ignored once cancelled.
    pub fn call(&self, input: T) {
        let mut st = self.inner.state.borrow_mut();
        if st.cancelled {
            tracing::trace!("debouncer cancelled, dropping call");
            return;
        }
        st.latest = Some(input);
        if let Some(timer) = st.timer.take() {
            timer.cancel();
        }
        let weak = Rc::downgrade(&self.inner);
        st.timer = Some(self.inner.scheduler.schedule(self.inner.delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire();
            }
        }));
    }

    /// Drop any pending input and disarm permanently.
    pub fn cancel(&self) {
        let mut st = self.inner.state.borrow_mut();
        st.cancelled = true;
        st.latest = None;
        if let Some(timer) = st.timer.take() {
            timer.cancel();
        }
    }

    /// Whether an invocation is scheduled.
    pub fn is_pending(&self) -> bool {
        self.inner.state.borrow().latest.is_some()
    }

    /// Whether [`Debouncer::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.borrow().cancelled
    }

    /// Number of action invocations so far.
    pub fn fired(&self) -> u64 {
        self.inner.state.borrow().fired
    }
}

impl<T: 'static> Inner<T> {
    fn fire(&self) {
        let input = {
            let mut st = self.state.borrow_mut();
            st.timer = None;
            if st.cancelled {
                return;
            }
            let input = st.latest.take();
            if input.is_some() {
                st.fired += 1;
            }
            input
        };
        if let Some(input) = input {
            (self.action)(input);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/debounce.rs"]
mod tests;
