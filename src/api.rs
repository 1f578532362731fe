//! # Public API
//!
//! This module contains the main entry points for hosts of the engine.
//!
//! ## One-call Helpers
//!
//! - [`tokenize_text()`] - Tokenize unstyled text (handy for previews and tests)
//! - [`compile_paragraph()`] - Read one line of markup and split it into its
//!   one-shot body and its loop regions, without scheduling anything
//!
//! ## Sessions
//!
//! A [`Session`] owns everything a running editor needs: the current document,
//! the scheduler, live mode, the synth and the timer facility. The host calls
//! [`Session::edit`] after every change to the document, [`Session::keystroke`]
//! for every key typed, and [`Session::timer_fired`] whenever one of its timers
//! goes off.
//!
//! ```rust
//! use tonetype::api::Session;
//! use tonetype::config::EngineConfig;
//! use tonetype::markup::parse_document;
//! use tonetype::playback::{RecordingSynth, VirtualTimers};
//!
//! let mut session = Session::new(EngineConfig::default(), RecordingSynth::new(), VirtualTimers::new());
//! session.edit(parse_document("<b>ab</b>[c].")?);
//! session.advance(1.0);
//!
//! // one-shot "ab", then "c" at 0.34, 0.68
//! assert_eq!(session.synth().events().len(), 3);
//! # Ok::<(), tonetype::ToneTypeError>(())
//! ```

use crate::ast::{Caret, Document, Paragraph, TokenSequence};
use crate::config::EngineConfig;
use crate::error::ToneTypeError;
use crate::loops::{find_loop_regions, LoopRegion, RegionKey};
use crate::markup::parse_paragraph;
use crate::notation::{tokenize, tokenize_excluding, tokenize_range};
use crate::playback::{
    KeystrokeOutcome, LivePlayer, PlaybackReport, RecordingSynth, Scheduler, Synth,
    TimerFacility, TimerHandle, VirtualTimers,
};
use crate::style::resolve;

/// Tokenize a string of unstyled text.
///
/// # Example
/// ```rust
/// use tonetype::api::tokenize_text;
/// use tonetype::config::EngineConfig;
///
/// let seq = tokenize_text("ab c / d", &EngineConfig::default());
/// assert_eq!(seq.letter_groups(), vec!["ab", "c", "", "d"]);
/// ```
pub fn tokenize_text(text: &str, config: &EngineConfig) -> TokenSequence {
    let stream = resolve(&Paragraph::plain(text), config.base_size_pt);
    tokenize(&stream, config)
}

/// A paragraph split into what plays once and what loops
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledParagraph {
    /// Tokens played when the paragraph activates (loop interiors left out)
    pub one_shot: TokenSequence,
    /// Every top-level loop region in textual order, with its interior tokens
    pub loops: Vec<(RegionKey, TokenSequence)>,
}

/// Read one line of markup and tokenize it the way the scheduler would.
///
/// # Errors
/// Returns [`ToneTypeError::MarkupError`] if the markup is malformed.
pub fn compile_paragraph(markup: &str, config: &EngineConfig) -> Result<CompiledParagraph, ToneTypeError> {
    let paragraph = parse_paragraph(markup)?;
    let stream = resolve(&paragraph, config.base_size_pt);
    let regions = find_loop_regions(&stream, &config.symbols);

    let excluded: Vec<_> = regions.iter().map(LoopRegion::interior).collect();
    let one_shot = tokenize_excluding(&stream, 0..stream.len(), &excluded, config);
    let loops = regions
        .into_iter()
        .map(|r| {
            let seq = tokenize_range(&stream, r.interior(), config);
            (r.key, seq)
        })
        .collect();

    Ok(CompiledParagraph { one_shot, loops })
}

/// A running engine bound to one synth and one timer facility
pub struct Session<S: Synth, T: TimerFacility> {
    document: Document,
    scheduler: Scheduler,
    live: LivePlayer,
    synth: S,
    timers: T,
}

impl<S: Synth, T: TimerFacility> Session<S, T> {
    pub fn new(config: EngineConfig, synth: S, timers: T) -> Self {
        Self {
            document: Document::default(),
            scheduler: Scheduler::new(config.clone()),
            live: LivePlayer::new(config),
            synth,
            timers,
        }
    }

    /// Replace the document and run an edit tick.
    ///
    /// Returns the one-shot playbacks the edit triggered.
    pub fn edit(&mut self, document: Document) -> Vec<PlaybackReport> {
        self.document = document;
        self.tick()
    }

    /// Re-run an edit tick on the current document
    pub fn tick(&mut self) -> Vec<PlaybackReport> {
        self.scheduler
            .tick(&self.document, &mut self.synth, &mut self.timers)
    }

    /// A key was pressed at `caret`; sounds it if the caret is in a live region
    pub fn keystroke(&mut self, caret: Caret, key: char) -> KeystrokeOutcome {
        self.live
            .keystroke(&self.document, caret, key, &mut self.synth)
    }

    /// Deliver a timer firing from the host
    pub fn timer_fired(&mut self, handle: TimerHandle) -> Option<PlaybackReport> {
        self.scheduler
            .on_timer(handle, &self.document, &mut self.synth)
    }

    /// Cancel every loop and silence the synth
    pub fn stop_all(&mut self) {
        self.scheduler.stop_all(&mut self.synth, &mut self.timers);
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }
}

impl Session<RecordingSynth, VirtualTimers> {
    /// Let `seconds` of audio-clock time pass, delivering every due firing.
    ///
    /// The synth's clock follows each firing, so loop playbacks start at the
    /// moment their timer was due.
    pub fn advance(&mut self, seconds: f64) -> Vec<PlaybackReport> {
        let until = self.timers.now() + seconds;
        let mut reports = Vec::new();
        while let Some(firing) = self.timers.pop_due(until) {
            self.synth.set_now(firing.due);
            if let Some(report) = self.timer_fired(firing.handle) {
                reports.push(report);
            }
        }
        self.timers.advance_to(until);
        self.synth.set_now(until);
        reports
    }
}
