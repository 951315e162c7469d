use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::foundation::core::Millis;

type Callback = Box<dyn FnOnce()>;

/// Default frame interval (~60 Hz).
pub const DEFAULT_FRAME_INTERVAL_MS: Millis = 16;

// Upper bound on timers fired by one `run_until_idle` call.
const MAX_IDLE_FIRES: usize = 100_000;

struct Inner {
    now: Millis,
    next_seq: u64,
    frame_interval: Millis,
    timers: BTreeMap<(Millis, u64), Callback>,
}

/// Single-threaded virtual clock driving every timer in a session.
///
/// Time only moves through [`Scheduler::advance`], so tests control it exactly. Timers due at the
/// same instant fire in scheduling order. Callbacks run with no scheduler borrow held and may
/// schedule or cancel other timers.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
}

/// Handle to one scheduled callback.
#[derive(Clone, Debug)]
pub struct TimerHandle {
    key: (Millis, u64),
    inner: Weak<RefCell<Inner>>,
}

impl TimerHandle {
    /// Drop the callback if it has not fired yet. Returns whether it was still pending.
    pub fn cancel(&self) -> bool {
        match self.inner.upgrade() {
            Some(inner) => inner.borrow_mut().timers.remove(&self.key).is_some(),
            None => false,
        }
    }

    /// Whether the callback is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().timers.contains_key(&self.key))
    }

    /// Virtual time the callback is due at.
    pub fn due(&self) -> Millis {
        self.key.0
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL_MS)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("pending", &inner.timers.len())
            .finish()
    }
}

impl Scheduler {
    /// Clock at `t = 0` with the given frame interval.
    pub fn new(frame_interval: Millis) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                now: 0,
                next_seq: 0,
                frame_interval: frame_interval.max(1),
                timers: BTreeMap::new(),
            })),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.inner.borrow().now
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.inner.borrow().timers.keys().next().map(|(due, _)| *due)
    }

    /// Run `f` once, `delay` ms from now.
    pub fn schedule(&self, delay: Millis, f: impl FnOnce() + 'static) -> TimerHandle {
        let due = self.now().saturating_add(delay);
        self.schedule_at(due, Box::new(f))
    }

    /// Run `f` at the next frame boundary strictly after now.
    pub fn request_frame(&self, f: impl FnOnce() + 'static) -> TimerHandle {
        let due = {
            let inner = self.inner.borrow();
            (inner.now / inner.frame_interval + 1) * inner.frame_interval
        };
        self.schedule_at(due, Box::new(f))
    }

    fn schedule_at(&self, due: Millis, f: Callback) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let key = (due, inner.next_seq);
        inner.next_seq += 1;
        inner.timers.insert(key, f);
        TimerHandle {
            key,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Move the clock forward by `ms`, firing every timer that falls due on the way.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, ms: Millis) -> usize {
        let target = self.now().saturating_add(ms);
        let mut fired = 0;
        while let Some(cb) = self.pop_due(target) {
            cb();
            fired += 1;
        }
        self.inner.borrow_mut().now = target;
        fired
    }

    /// Fire timers in due order until none are left.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some(due) = self.next_due() {
            if fired >= MAX_IDLE_FIRES {
                tracing::warn!(fired, "scheduler still busy, giving up on idle");
                break;
            }
            let now = self.now();
            fired += self.advance(due.saturating_sub(now));
        }
        fired
    }

    fn pop_due(&self, target: Millis) -> Option<Callback> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.timers.keys().next()?;
        if key.0 > target {
            return None;
        }
        let cb = inner.timers.remove(&key)?;
        inner.now = key.0;
        Some(cb)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/scheduler.rs"]
mod tests;
