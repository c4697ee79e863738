//! Cancel-on-reschedule timer for auto-save.
//!
//! The debouncer never reads the clock itself; callers pass `Instant`s in,
//! which keeps it independent of any event loop.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    delay: Duration,
    pending: Option<(K, Instant)>,
}

impl<K: PartialEq> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer for `key`, replacing any earlier deadline.
    ///
    /// If a different key was pending it is returned, so the caller can
    /// deal with it immediately instead of losing it.
    pub fn schedule(&mut self, key: K, now: Instant) -> Option<K> {
        let displaced = match self.pending.take() {
            Some((previous, _)) if previous != key => Some(previous),
            _ => None,
        };
        self.pending = Some((key, now + self.delay));
        displaced
    }

    pub fn cancel(&mut self) -> Option<K> {
        self.pending.take().map(|(key, _)| key)
    }

    pub fn pending(&self) -> Option<&K> {
        self.pending.as_ref().map(|(key, _)| key)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending key once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<K> {
        if self.deadline().is_some_and(|at| at <= now) {
            self.cancel()
        } else {
            None
        }
    }
}
