//! Single-shot, cancellable alarms on a shared logical clock.
//!
//! Alarms never fire on their own. The event loop advances the [`Timeline`] and
//! asks each owner for its earliest due alarm, so firing order is always
//! `(deadline, arming sequence)` and every handler runs on the loop's thread.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Clock {
    now_ms: Cell<u64>,
    next_seq: Cell<u64>,
}

/// Shared handle to the loop's clock.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    clock: Rc<Clock>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms.get()
    }

    /// Moves the clock forward. Earlier timestamps are ignored.
    pub fn advance_to(&self, now_ms: u64) {
        if now_ms > self.clock.now_ms.get() {
            self.clock.now_ms.set(now_ms);
        }
    }

    pub fn advance_by(&self, delta_ms: u64) {
        self.advance_to(self.now_ms().saturating_add(delta_ms));
    }

    fn next_seq(&self) -> u64 {
        let seq = self.clock.next_seq.get();
        self.clock.next_seq.set(seq + 1);
        seq
    }
}

/// When an armed alarm is due. Orders by deadline, then by arming order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    pub at_ms: u64,
    pub seq: u64,
}

#[derive(Debug)]
pub struct Alarm<M> {
    timeline: Timeline,
    armed: Option<(Deadline, M)>,
}

impl<M> Alarm<M> {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            armed: None,
        }
    }

    /// Arms the alarm `delay_ms` from now, replacing any pending deadline.
    pub fn set_alarm(&mut self, delay_ms: u64, message: M) {
        let deadline = Deadline {
            at_ms: self.timeline.now_ms().saturating_add(delay_ms),
            seq: self.timeline.next_seq(),
        };
        self.armed = Some((deadline, message));
    }

    pub fn cancel_alarm(&mut self) {
        self.armed = None;
    }

    pub fn alarm_pending(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<Deadline> {
        self.armed.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Disarms and hands back the message once the deadline has passed.
    pub fn take_due(&mut self) -> Option<M> {
        let due = matches!(&self.armed, Some((deadline, _)) if deadline.at_ms <= self.timeline.now_ms());
        if due {
            self.armed.take().map(|(_, message)| message)
        } else {
            None
        }
    }

    /// Disarms and hands back the message regardless of the deadline.
    pub fn take_now(&mut self) -> Option<M> {
        self.armed.take().map(|(_, message)| message)
    }
}
