//! # Playback Module
//!
//! Turn a styled document into note events, once when a paragraph is
//! finished and repeatedly for every loop region inside it.
//!
//! ## Purpose
//! This module is the runtime half of the engine:
//! 1. **Mapping** - a letter plus its style becomes pitch, velocity, waveform and effects
//! 2. **Scheduling** - paragraph activation, one-shot playback and loop timers
//! 3. **Live mode** - single keystrokes sounded as they are typed
//!
//! ## Sub-modules
//! - `types` - NoteEvent, EffectChain, PlaybackReport type definitions
//! - `mapping` - Letter table, velocity curve, color and effect rules
//! - `synth` - The [`Synth`] seam and a recording implementation
//! - `timers` - The [`TimerFacility`] seam and a virtual-clock implementation
//! - `scheduler` - The paragraph state machine and active loop table
//! - `live` - Live keystroke mode
//!
//! ## Example
//! ```rust
//! use tonetype::ast::Document;
//! use tonetype::config::EngineConfig;
//! use tonetype::playback::{RecordingSynth, Scheduler, VirtualTimers};
//!
//! let doc = Document::from_plain_text("ab[c].");
//! let mut scheduler = Scheduler::new(EngineConfig::default());
//! let mut synth = RecordingSynth::new();
//! let mut timers = VirtualTimers::new();
//!
//! let reports = scheduler.tick(&doc, &mut synth, &mut timers);
//!
//! assert_eq!(reports.len(), 1);
//! assert_eq!(synth.events()[0].pitches, vec!["C3", "D3"]); // chord "ab"
//! assert_eq!(scheduler.loops(0).len(), 1); // "[c]"
//! ```
//!
//! ## Time
//! All times are seconds on the synth's audio clock. Letters and chords last
//! `base_duration`, rests last `rest_duration`, and a loop repeats every time
//! its interior's tokens add up to.
//!
//! ## Related Modules
//! - `notation` - Produces the token sequences played here
//! - `loops` - Finds loop regions and gives them stable keys

mod types;
mod mapping;
mod synth;
mod timers;
mod scheduler;
mod live;


pub use types::{
    Distortion, EffectChain, NoteEvent, PlaybackReport, PlaybackSource, Reverb, SoundSpec,
    Vibrato, Waveform,
};
pub use mapping::{
    effect_chain, letter_to_note, make_rng, map_char, map_token, random_note, velocity, waveform,
    Modifiers, NOTE_POOL,
};
pub use synth::{RecordingSynth, Synth};
pub use timers::{TimerFacility, TimerFiring, TimerHandle, VirtualTimers};
pub use scheduler::{is_live_text, wants_activation, LoopTimer, ParagraphState, Scheduler};
pub use live::{is_in_live_region, KeystrokeOutcome, LivePlayer};
