//! The synthesis engine seam
//!
//! The engine never produces audio itself. It asks a [`Synth`] for the current
//! audio-clock time and hands it fully described note events.

use super::types::NoteEvent;

/// External synthesis engine
pub trait Synth {
    /// Monotonic audio-clock time in seconds; the scheduler's time base
    fn now(&self) -> f64;

    /// Schedule notes at `event.start_time` on the audio clock
    fn trigger_notes(&mut self, event: NoteEvent);

    /// Release every sounding note and reset the transport
    fn stop_all(&mut self);
}

/// A synth that records what it is asked to do, with a clock the caller drives.
///
/// Used by tests and by the offline renderer of the command line tool.
#[derive(Debug, Default)]
pub struct RecordingSynth {
    now: f64,
    events: Vec<NoteEvent>,
    stop_count: usize,
}

impl RecordingSynth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the audio clock; it never goes backwards
    pub fn set_now(&mut self, now: f64) {
        if now > self.now {
            self.now = now;
        }
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<NoteEvent> {
        std::mem::take(&mut self.events)
    }

    /// How many times `stop_all` was requested
    pub fn stop_count(&self) -> usize {
        self.stop_count
    }
}

impl Synth for RecordingSynth {
    fn now(&self) -> f64 {
        self.now
    }

    fn trigger_notes(&mut self, event: NoteEvent) {
        log::trace!("trigger {:?} at {:.3}", event.pitches, event.start_time);
        self.events.push(event);
    }

    fn stop_all(&mut self) {
        self.stop_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let mut synth = RecordingSynth::new();
        synth.set_now(2.0);
        synth.set_now(1.0);
        assert_eq!(synth.now(), 2.0);
    }
}
