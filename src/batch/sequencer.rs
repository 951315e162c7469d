use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::{
    foundation::{
        core::{Millis, Size},
        error::BatchError,
    },
    timing::scheduler::{Scheduler, TimerHandle},
};

/// Where a batch run is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchState {
    /// No run in progress.
    Idle,
    /// Size `step` of the job has been signalled.
    Running {
        /// Index into the job, terminal sentinel included.
        step: usize,
    },
}

struct Run {
    id: u64,
    job: Vec<Size>,
    step: usize,
    timer: Option<TimerHandle>,
}

struct Shared {
    scheduler: Scheduler,
    pause: Millis,
    signal: Box<dyn Fn(Size)>,
    run: RefCell<Option<Run>>,
    next_id: Cell<u64>,
}

/// Drives an ordered list of capture sizes, one per pause.
///
/// Every job ends with the [`Size::ZERO`] sentinel, which tells the receiver to restore its
/// normal size. The pause separates consecutive signals and also follows the sentinel before the
/// sequencer is idle again.
#[derive(Clone)]
pub struct BatchSequencer {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for BatchSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSequencer")
            .field("pause", &self.shared.pause)
            .field("state", &self.state())
            .finish()
    }
}

impl BatchSequencer {
    /// Sequencer that emits sizes through `signal`, `pause` ms apart.
    pub fn new(scheduler: &Scheduler, pause: Millis, signal: impl Fn(Size) + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                scheduler: scheduler.clone(),
                pause,
                signal: Box::new(signal),
                run: RefCell::new(None),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Start a run over `sizes` and signal the first entry immediately.
    #[tracing::instrument(skip(self, sizes), fields(sizes = sizes.len()))]
    pub fn start(&self, sizes: &[Size]) -> Result<(), BatchError> {
        if let BatchState::Running { step } = self.state() {
            return Err(BatchError::AlreadyRunning { step });
        }
        let mut job = sizes.to_vec();
        job.push(Size::ZERO);
        let first = job[0];
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);
        *self.shared.run.borrow_mut() = Some(Run {
            id,
            job,
            step: 0,
            timer: None,
        });
        tracing::info!("batch started");
        Shared::emit(&self.shared, id, first);
        Ok(())
    }

    /// Stop the run without signalling the remaining sizes.
    pub fn cancel(&self) -> bool {
        let run = self.shared.run.borrow_mut().take();
        match run {
            Some(run) => {
                if let Some(timer) = run.timer {
                    timer.cancel();
                }
                tracing::info!(step = run.step, "batch cancelled");
                true
            }
            None => false,
        }
    }

    /// Current state.
    pub fn state(&self) -> BatchState {
        match self.shared.run.borrow().as_ref() {
            Some(run) => BatchState::Running { step: run.step },
            None => BatchState::Idle,
        }
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.shared.run.borrow().is_some()
    }

    /// Size to capture at the current step; `None` when idle or on the sentinel.
    pub fn capture_size(&self) -> Option<Size> {
        let run = self.shared.run.borrow();
        run.as_ref()
            .and_then(|r| r.job.get(r.step).copied())
            .filter(|size| !size.is_empty())
    }
}

impl Shared {
    // Signal `size`, then arm the pause that leads to the next step.
    fn emit(this: &Rc<Self>, id: u64, size: Size) {
        tracing::debug!(%size, "batch step");
        (this.signal)(size);

        let weak = Rc::downgrade(this);
        let timer = this
            .scheduler
            .schedule(this.pause, move || Shared::advance(&weak, id));
        // The signal may have cancelled or replaced the run.
        match this.run.borrow_mut().as_mut() {
            Some(run) if run.id == id => run.timer = Some(timer),
            _ => {
                timer.cancel();
            }
        }
    }

    fn advance(weak: &Weak<Self>, id: u64) {
        let Some(this) = weak.upgrade() else {
            return;
        };
        let next = {
            let mut slot = this.run.borrow_mut();
            let Some(run) = slot.as_mut().filter(|r| r.id == id) else {
                return;
            };
            run.timer = None;
            run.step += 1;
            let next = run.job.get(run.step).copied();
            if next.is_none() {
                *slot = None;
            }
            next
        };
        match next {
            Some(size) => Shared::emit(&this, id, size),
            None => tracing::info!("batch finished"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/sequencer.rs"]
mod tests;
