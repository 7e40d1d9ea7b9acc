//! Periodic task scheduler.
//!
//! The scheduler notifies a [`SchedulerDelegate`] when a task is due; the
//! main loop implements the delegate and routes the call to the service.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  main loop ── tick(now) ──▶ Scheduler                        │
//! │                               │ elapsed_since(now, last)     │
//! │                               │   >= interval ?              │
//! │                               ▼                              │
//! │                       last += interval                       │
//! │                       SchedulerDelegate::on_schedule_fired   │
//! │                               │                              │
//! │                               ▼                              │
//! │                       NodeService::report()                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timing rules:
//!
//! - Every comparison uses wrapping tick subtraction, so the `u32`
//!   millisecond counter rolling over is invisible.
//! - `last_fired` advances by exactly one interval per fire (not to
//!   `now`), so the schedule stays phase-locked to its start and slow loop
//!   iterations never accumulate drift.
//! - A task fires at most once per `tick` call.  After a stall the backlog
//!   drains one fire per subsequent tick instead of a burst.

use log::{debug, info};

use crate::app::ports::SchedulerDelegate;
use crate::clock::{Tick, elapsed_since};

/// Maximum number of concurrent tasks (stack-allocated).
const MAX_TASKS: usize = 4;

/// Internal bookkeeping for a live task.
#[derive(Debug, Clone)]
struct TaskEntry {
    /// Human-readable label passed back to the delegate.
    label: &'static str,
    interval_ms: u32,
    /// Nominal time of the last fire (or registration).
    last_fired: Tick,
    enabled: bool,
}

/// Fixed-capacity periodic scheduler.
pub struct Scheduler {
    tasks: [Option<TaskEntry>; MAX_TASKS],
    /// Global enable flag.
    enabled: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: [None, None, None, None],
            enabled: true,
        }
    }

    /// Register a task whose first fire is one interval after `now`.
    /// Returns the slot index, or `None` if full or `interval_ms` is zero.
    pub fn add(&mut self, label: &'static str, interval_ms: u32, now: Tick) -> Option<usize> {
        if interval_ms == 0 {
            return None;
        }
        let (i, slot) = self.tasks.iter_mut().enumerate().find(|(_, s)| s.is_none())?;
        info!("Scheduler: added '{}' every {}ms at slot {}", label, interval_ms, i);
        *slot = Some(TaskEntry {
            label,
            interval_ms,
            last_fired: now,
            enabled: true,
        });
        Some(i)
    }

    /// Remove a task by slot index.
    pub fn remove(&mut self, slot: usize) {
        if let Some(entry) = self.tasks.get_mut(slot).and_then(Option::take) {
            info!("Scheduler: removed '{}' from slot {}", entry.label, slot);
        }
    }

    /// Enable or disable one task.  Re-enabling restarts its phase at `now`.
    pub fn set_task_enabled(&mut self, slot: usize, enabled: bool, now: Tick) {
        if let Some(Some(entry)) = self.tasks.get_mut(slot) {
            if enabled && !entry.enabled {
                entry.last_fired = now;
            }
            entry.enabled = enabled;
        }
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Run every due task once.  Call on each main-loop iteration, at any
    /// (non-uniform) rate.
    pub fn tick(&mut self, now: Tick, delegate: &mut dyn SchedulerDelegate) {
        if !self.enabled {
            return;
        }

        for entry in self.tasks.iter_mut().flatten() {
            if !entry.enabled {
                continue;
            }
            let elapsed = elapsed_since(now, entry.last_fired);
            if elapsed < entry.interval_ms {
                continue;
            }
            entry.last_fired = entry.last_fired.wrapping_add(entry.interval_ms);
            if elapsed >= entry.interval_ms.saturating_mul(2) {
                debug!(
                    "Scheduler: '{}' behind by {}ms, catching up",
                    entry.label,
                    elapsed - entry.interval_ms
                );
            }
            delegate.on_schedule_fired(entry.label);
        }
    }

    /// Number of active (enabled) tasks.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().flatten().filter(|e| e.enabled).count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
