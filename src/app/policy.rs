//! Failure-count / cooldown policy for hub status pushes.
//!
//! ```text
//!   failures < threshold ──▶ attempt
//!          │ failure (count saturates at threshold, cooldown armed)
//!          ▼
//!   Suppressed ── cooldown elapsed ──▶ one probe attempt
//!          ▲                               │
//!          └────── probe failed ───────────┤
//!                                          └── any success ──▶ failures = 0
//! ```

use log::{info, warn};

use crate::clock::{Tick, elapsed_since};

/// Verdict for one prospective attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Normal attempt, below the failure threshold.
    Allowed,
    /// Cooldown expired: this is the single probe attempt.
    Probe,
    /// Still cooling down, skip the network entirely.
    Suppressed,
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Suppressed)
    }
}

#[derive(Debug, Clone)]
pub struct FailurePolicy {
    threshold: u8,
    cooldown_ms: u32,
    consecutive_failures: u8,
    /// Tick of the failure that armed the cooldown.
    suppressed_at: Option<Tick>,
}

impl FailurePolicy {
    pub fn new(threshold: u8, cooldown_ms: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown_ms,
            consecutive_failures: 0,
            suppressed_at: None,
        }
    }

    pub fn consecutive_failures(&self) -> u8 {
        self.consecutive_failures
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn is_tripped(&self) -> bool {
        self.consecutive_failures >= self.threshold
    }

    /// Decide whether an attempt may run at `now`.
    pub fn admit(&mut self, now: Tick) -> Admission {
        if !self.is_tripped() {
            return Admission::Allowed;
        }
        match self.suppressed_at {
            Some(at) if elapsed_since(now, at) < self.cooldown_ms => Admission::Suppressed,
            _ => {
                // Disarm so exactly one attempt passes; its result re-arms
                // (failure) or clears (success) the policy.
                self.suppressed_at = None;
                info!(
                    "Report policy: cooldown over, probing hub ({} consecutive failures)",
                    self.consecutive_failures
                );
                Admission::Probe
            }
        }
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            info!(
                "Report policy: hub reachable again after {} failure(s)",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
        self.suppressed_at = None;
    }

    pub fn record_failure(&mut self, now: Tick) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1).min(self.threshold);
        if self.is_tripped() {
            self.suppressed_at = Some(now);
            warn!(
                "Report policy: {} consecutive failures, suppressing pushes for {}s",
                self.consecutive_failures,
                self.cooldown_ms / 1000
            );
        }
    }
}
