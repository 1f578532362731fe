//! Playback type definitions
//!
//! This module defines what the engine hands to the synthesis engine, and what
//! it reports back to the host after each playback.

use crate::loops::RegionKey;
use serde::Serialize;

/// Oscillator family, chosen by color
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Distortion {
    pub amount: f64,
    pub wet: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vibrato {
    /// Rate in Hz
    pub frequency: f64,
    pub depth: f64,
    pub wet: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reverb {
    /// Tail length in seconds
    pub decay: f64,
    pub pre_delay: f64,
    pub wet: f64,
}

/// Declarative effect chain placed ahead of a note trigger.
///
/// Effects stack: a bold, italic, underlined letter gets all three.
/// Signal order is vibrato → distortion → reverb.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EffectChain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrato: Option<Vibrato>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion: Option<Distortion>,
    pub reverb: Reverb,
}

/// Everything the mapping engine derives for one letter or chord
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoundSpec {
    /// Note names such as `"C4"`; more than one for a chord
    pub pitches: Vec<&'static str>,
    pub duration: f64,
    /// 0.0 to 1.0
    pub velocity: f64,
    pub waveform: Waveform,
    pub effects: EffectChain,
}

/// A note trigger handed to the synthesis engine
///
/// # Fields
/// - `pitches`: note names sounded together
/// - `duration`: release after this many audio-clock seconds
/// - `start_time`: absolute audio-clock time of the attack
/// - `velocity`: 0.0 to 1.0
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub pitches: Vec<&'static str>,
    pub duration: f64,
    pub start_time: f64,
    pub velocity: f64,
    pub waveform: Waveform,
    pub effects: EffectChain,
}

impl NoteEvent {
    pub fn from_spec(spec: SoundSpec, start_time: f64) -> Self {
        Self {
            pitches: spec.pitches,
            duration: spec.duration,
            start_time,
            velocity: spec.velocity,
            waveform: spec.waveform,
            effects: spec.effects,
        }
    }
}

/// What caused a playback
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackSource {
    /// The paragraph was just activated
    OneShot,
    /// A loop timer fired
    Loop(RegionKey),
}

/// Summary of one scheduled playback, for hosts that pulse loops or flash letters
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReport {
    pub paragraph: usize,
    pub source: PlaybackSource,
    pub start_time: f64,
    /// Time the scheduled tokens span, rests included
    pub duration: f64,
    /// Letter indices in the order they sound
    pub letter_indices: Vec<usize>,
}
