//! Repeating timers for loop regions
//!
//! The scheduler registers one repeating timer per live loop region through a
//! [`TimerFacility`]. The host owns the facility and delivers each firing back
//! to the scheduler on the same thread that handles edits, so a firing never
//! interleaves with a tick.
//!
//! [`VirtualTimers`] is a deterministic facility driven by an explicit clock.

use serde::Serialize;
use std::collections::BTreeMap;

/// Opaque handle of a registered timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerHandle(pub u64);

/// Runtime timer facility
pub trait TimerFacility {
    /// Start a timer that fires every `period` seconds, first after one period
    fn start_repeating(&mut self, period: f64) -> TimerHandle;

    /// Stop a timer; it must never fire again. Unknown handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// One due firing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerFiring {
    pub handle: TimerHandle,
    /// Clock time the firing was due at
    pub due: f64,
}

#[derive(Debug, Clone)]
struct VirtualTimer {
    period: f64,
    next_due: f64,
}

/// Timers on a logical clock that only moves when told to.
#[derive(Debug, Default)]
pub struct VirtualTimers {
    now: f64,
    next_id: u64,
    timers: BTreeMap<TimerHandle, VirtualTimer>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    pub fn period(&self, handle: TimerHandle) -> Option<f64> {
        self.timers.get(&handle).map(|t| t.period)
    }

    /// Pop the earliest firing due at or before `until`, moving the clock to it.
    ///
    /// Firings come out in due-time order (ties broken by handle). Pull them
    /// one at a time so a cancellation made while handling one firing takes
    /// effect before the next.
    pub fn pop_due(&mut self, until: f64) -> Option<TimerFiring> {
        let (handle, due) = self
            .timers
            .iter()
            .filter(|(_, t)| t.next_due <= until)
            .min_by(|a, b| a.1.next_due.total_cmp(&b.1.next_due).then(a.0.cmp(b.0)))
            .map(|(h, t)| (*h, t.next_due))?;

        if let Some(timer) = self.timers.get_mut(&handle) {
            timer.next_due += timer.period;
        }
        if due > self.now {
            self.now = due;
        }
        Some(TimerFiring { handle, due })
    }

    /// Move the clock forward without firing anything.
    ///
    /// Call after draining [`pop_due`](Self::pop_due) for the same `until`.
    pub fn advance_to(&mut self, until: f64) {
        if until > self.now {
            self.now = until;
        }
    }
}

impl TimerFacility for VirtualTimers {
    fn start_repeating(&mut self, period: f64) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            handle,
            VirtualTimer {
                period,
                next_due: self.now + period,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(timers: &mut VirtualTimers, until: f64) -> Vec<(u64, f64)> {
        let mut out = Vec::new();
        while let Some(f) = timers.pop_due(until) {
            out.push((f.handle.0, f.due));
        }
        timers.advance_to(until);
        out
    }

    #[test]
    fn test_first_firing_after_one_period() {
        let mut timers = VirtualTimers::new();
        let h = timers.start_repeating(1.0);
        assert!(drain(&mut timers, 0.5).is_empty());
        assert_eq!(drain(&mut timers, 1.0), vec![(h.0, 1.0)]);
        assert_eq!(timers.now(), 1.0);
    }

    #[test]
    fn test_firings_interleave_in_due_order() {
        let mut timers = VirtualTimers::new();
        let a = timers.start_repeating(1.0);
        let b = timers.start_repeating(1.5);
        let fired = drain(&mut timers, 3.0);
        assert_eq!(
            fired,
            vec![(a.0, 1.0), (b.0, 1.5), (a.0, 2.0), (a.0, 3.0), (b.0, 3.0)]
        );
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timers = VirtualTimers::new();
        let a = timers.start_repeating(1.0);
        assert_eq!(drain(&mut timers, 1.0).len(), 1);
        timers.cancel(a);
        assert!(!timers.is_active(a));
        assert!(drain(&mut timers, 10.0).is_empty());
        // Cancelling twice is harmless
        timers.cancel(a);
    }

    #[test]
    fn test_timer_started_later_counts_from_now() {
        let mut timers = VirtualTimers::new();
        timers.advance_to(5.0);
        let h = timers.start_repeating(0.5);
        assert_eq!(timers.pop_due(10.0).unwrap().due, 5.5);
        assert_eq!(timers.period(h), Some(0.5));
    }
}
