//! Millisecond tick arithmetic.
//!
//! The device clock is a free-running `u32` millisecond counter that wraps
//! roughly every 49.7 days.  Every interval check in the firmware goes
//! through [`elapsed_since`], which stays correct across one wrap as long
//! as the true elapsed time is below the counter range.  Never compare
//! `now >= then + interval` directly.

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic millisecond counter value.
pub type Tick = u32;

/// Wraparound-safe elapsed milliseconds from `earlier` to `now`.
#[inline]
pub const fn elapsed_since(now: Tick, earlier: Tick) -> u32 {
    now.wrapping_sub(earlier)
}

/// `true` once at least `interval` ms have passed since `earlier`.
#[inline]
pub const fn has_elapsed(now: Tick, earlier: Tick, interval: u32) -> bool {
    elapsed_since(now, earlier) >= interval
}

/// Source of monotonic time.
pub trait Clock {
    /// Current tick.
    fn now(&self) -> Tick;

    /// Milliseconds since boot without truncation.  Clocks that only have
    /// the wrapping counter report that.
    fn uptime_ms(&self) -> u64 {
        u64::from(self.now())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Tick {
        (**self).now()
    }

    fn uptime_ms(&self) -> u64 {
        (**self).uptime_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Manual clock (tests, simulation)
// ───────────────────────────────────────────────────────────────

/// Hand-driven clock.  Clones share the same counter, so a test can keep
/// one handle and give another to the code under test.
///
/// With a non-zero `step`, every [`Clock::now`] read advances the counter,
/// which lets deadline loops terminate without a real timer.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Tick>>,
    uptime: Rc<Cell<u64>>,
    step: u32,
}

impl ManualClock {
    pub fn new(start: Tick) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
            uptime: Rc::new(Cell::new(0)),
            step: 0,
        }
    }

    /// Same counter, but every read advances it by `step` ms.
    pub fn with_step(&self, step: u32) -> Self {
        Self {
            now: Rc::clone(&self.now),
            uptime: Rc::clone(&self.uptime),
            step,
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
        self.uptime.set(self.uptime.get() + u64::from(ms));
    }

    /// Jump the counter; uptime is left alone.
    pub fn set(&self, tick: Tick) {
        self.now.set(tick);
    }

    pub fn get(&self) -> Tick {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        let t = self.now.get();
        if self.step > 0 {
            self.advance(self.step);
        }
        t
    }

    fn uptime_ms(&self) -> u64 {
        self.uptime.get()
    }
}
