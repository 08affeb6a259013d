#![forbid(unsafe_code)]

//! Cancellable delayed callbacks on a virtual clock.
//!
//! The [`Scheduler`] never blocks and never spawns threads. The host drives
//! it: [`Scheduler::advance`] moves the clock forward by a duration and fires
//! every callback that came due, [`Scheduler::tick_at`] does the same against
//! a wall-clock [`Instant`]. Tests use `advance` for deterministic timing.
//!
//! # Invariants
//!
//! 1. Callbacks fire in `(due, scheduling order)` order.
//! 2. A callback never runs while the scheduler is borrowed, so callbacks may
//!    schedule or cancel other timers.
//! 3. A zero delay never fires synchronously inside `schedule`; it fires on
//!    the next `advance`/`run_due`.
//! 4. Dropping a [`TimerHandle`] does not cancel the timer.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use web_time::{Duration, Instant};

struct Task {
    id: u64,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

struct Timers {
    origin: Instant,
    now: Duration,
    next_id: u64,
    tasks: Vec<Task>,
}

impl Timers {
    fn take_next_due(&mut self, target: Duration) -> Option<Task> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        let task = self.tasks.remove(index);
        self.now = self.now.max(task.due);
        Some(task)
    }
}

/// Single-threaded timer queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<Timers>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timers = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("now", &timers.now)
            .field("pending", &timers.tasks.len())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler whose clock starts at zero now.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Timers {
                origin: Instant::now(),
                now: Duration::ZERO,
                next_id: 1,
                tasks: Vec::new(),
            })),
        }
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Run `callback` once `delay` has elapsed.
    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerHandle {
        let mut timers = self.inner.borrow_mut();
        let id = timers.next_id;
        timers.next_id += 1;
        let due = timers.now + delay;
        timers.tasks.push(Task {
            id,
            due,
            callback: Box::new(callback),
        });
        tracing::trace!(timer = id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerHandle {
            id,
            delay,
            timers: Rc::downgrade(&self.inner),
        }
    }

    /// Advance the clock by `by`, firing due callbacks. Returns how many fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        self.run_until(target)
    }

    /// Fire callbacks already due at the current time.
    pub fn run_due(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Advance the clock to a wall-clock instant.
    pub fn tick_at(&self, at: Instant) -> usize {
        let origin = self.inner.borrow().origin;
        self.run_until(at.saturating_duration_since(origin))
    }

    /// Fire every timer pending at call time, however far in the future.
    pub fn flush(&self) -> usize {
        let last = self.inner.borrow().tasks.iter().map(|t| t.due).max();
        match last {
            Some(due) => self.run_until(due),
            None => 0,
        }
    }

    fn run_until(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let next = self.inner.borrow_mut().take_next_due(target);
            let Some(task) = next else {
                break;
            };
            tracing::trace!(timer = task.id, "timer fired");
            (task.callback)();
            fired += 1;
        }
        let mut timers = self.inner.borrow_mut();
        timers.now = timers.now.max(target);
        fired
    }
}

/// Handle to a scheduled callback.
#[derive(Clone)]
pub struct TimerHandle {
    id: u64,
    delay: Duration,
    timers: Weak<RefCell<Timers>>,
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl TimerHandle {
    /// The delay the timer was scheduled with.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel the timer. Returns `true` if it had not fired yet.
    pub fn cancel(&self) -> bool {
        let Some(timers) = self.timers.upgrade() else {
            return false;
        };
        let mut timers = timers.borrow_mut();
        let before = timers.tasks.len();
        timers.tasks.retain(|t| t.id != self.id);
        let cancelled = timers.tasks.len() != before;
        if cancelled {
            tracing::trace!(timer = self.id, "timer cancelled");
        }
        cancelled
    }

    /// Whether the timer is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.timers
            .upgrade()
            .is_some_and(|t| t.borrow().tasks.iter().any(|task| task.id == self.id))
    }
}
