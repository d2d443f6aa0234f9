//! Debounce policy for filter edits
//!
//! At most one reload is issued per quiet window: every edit restarts the
//! window, and the reload fires once the window elapses with no further
//! edits. Time is passed in by the caller so the policy is deterministic
//! under test.

use std::time::{Duration, Instant};

/// Default quiet window after the last filter keystroke
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    window: Duration,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        DebouncePolicy::new(DEFAULT_DEBOUNCE)
    }
}

impl DebouncePolicy {
    pub fn new(window: Duration) -> Self {
        DebouncePolicy { window }
    }

    /// Reload on every edit
    pub fn immediate() -> Self {
        DebouncePolicy::new(Duration::ZERO)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_immediate(&self) -> bool {
        self.window.is_zero()
    }
}

/// Tracks the deadline of a pending debounced action
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    policy: DebouncePolicy,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(policy: DebouncePolicy) -> Self {
        Debouncer {
            policy,
            deadline: None,
        }
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    /// Record an edit at `now`, restarting the quiet window
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.policy.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once when the window has elapsed; clears the deadline
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
