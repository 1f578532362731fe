//! Paragraph activation and loop scheduling
//!
//! Converts the current document into audio events on every edit tick and on
//! every loop-timer firing.
//!
//! # Paragraph State Machine
//! ```text
//!            trimmed text ends with terminator
//!  Inactive ──────────────────────────────────▶ Active
//!     ▲        (one-shot play, empty loop list)    │
//!     │                                            │ every tick: rescan loops,
//!     │   terminator gone / live prefix /          │ arm new ones, cancel gone ones
//!     └──────── paragraph removed / stop ──────────┘
//!                (cancel all of its timers)
//! ```
//!
//! A paragraph is `Active` exactly while it has an entry in the active loop
//! table, so the table is the only state the scheduler keeps.
//!
//! # Time
//! Every playback starts at the synth's `now()`. A timer that fires late still
//! asks for "now", but the tokens inside one playback are laid out back to
//! back on the audio clock, so their relative timing is exact.

use crate::ast::{Document, Paragraph, StyledChar, Token, TokenSequence};
use crate::config::{EngineConfig, NotationSymbols};
use crate::loops::{find_loop_regions, find_region, LoopRegion, RegionKey};
use crate::notation::{tokenize_excluding, tokenize_range};
use crate::style::resolve;
use super::mapping::{make_rng, map_token};
use super::synth::Synth;
use super::timers::{TimerFacility, TimerHandle};
use super::types::{NoteEvent, PlaybackReport, PlaybackSource};
use rand::rngs::StdRng;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphState {
    Inactive,
    Active,
}

/// A running loop: which region it plays and the timer driving it
#[derive(Debug, Clone, PartialEq)]
pub struct LoopTimer {
    pub key: RegionKey,
    pub handle: TimerHandle,
    pub period: f64,
}

/// Whether a paragraph's text marks it as live (never scheduled)
pub fn is_live_text(text: &str, symbols: &NotationSymbols) -> bool {
    text.trim().starts_with(symbols.live_open)
}

/// Whether a paragraph's text asks for it to be active
pub fn wants_activation(text: &str, symbols: &NotationSymbols) -> bool {
    !is_live_text(text, symbols) && text.trim().ends_with(symbols.terminator)
}

pub struct Scheduler {
    config: EngineConfig,
    /// Active loop table: paragraph index → its running loops
    active: BTreeMap<usize, Vec<LoopTimer>>,
    /// Reverse lookup for dispatching timer firings
    timer_owners: HashMap<TimerHandle, (usize, RegionKey)>,
    rng: StdRng,
}

impl Scheduler {
    pub fn new(config: EngineConfig) -> Self {
        let rng = make_rng(config.seed);
        Self {
            config,
            active: BTreeMap::new(),
            timer_owners: HashMap::new(),
            rng,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self, paragraph: usize) -> ParagraphState {
        if self.active.contains_key(&paragraph) {
            ParagraphState::Active
        } else {
            ParagraphState::Inactive
        }
    }

    pub fn active_paragraphs(&self) -> Vec<usize> {
        self.active.keys().copied().collect()
    }

    /// Running loops of a paragraph, in the order they were armed
    pub fn loops(&self, paragraph: usize) -> &[LoopTimer] {
        self.active.get(&paragraph).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn timer_count(&self) -> usize {
        self.timer_owners.len()
    }

    /// Re-derive everything from the current document.
    ///
    /// Call after every edit. Returns a report for each one-shot playback fired.
    pub fn tick(
        &mut self,
        document: &Document,
        synth: &mut dyn Synth,
        timers: &mut dyn TimerFacility,
    ) -> Vec<PlaybackReport> {
        let removed: Vec<usize> = self
            .active
            .keys()
            .copied()
            .filter(|&idx| idx >= document.paragraphs.len())
            .collect();
        for idx in removed {
            log::debug!("paragraph {} removed from document", idx);
            self.deactivate(idx, timers);
        }

        let mut reports = Vec::new();
        for (idx, paragraph) in document.paragraphs.iter().enumerate() {
            if let Some(report) = self.tick_paragraph(idx, paragraph, synth, timers) {
                reports.push(report);
            }
        }
        reports
    }

    fn tick_paragraph(
        &mut self,
        idx: usize,
        paragraph: &Paragraph,
        synth: &mut dyn Synth,
        timers: &mut dyn TimerFacility,
    ) -> Option<PlaybackReport> {
        let text = paragraph.text();
        if !wants_activation(&text, &self.config.symbols) {
            if self.active.contains_key(&idx) {
                self.deactivate(idx, timers);
            }
            return None;
        }

        let stream = resolve(paragraph, self.config.base_size_pt);
        let regions = find_loop_regions(&stream, &self.config.symbols);

        let mut report = None;
        if !self.active.contains_key(&idx) {
            log::debug!("paragraph {} activated", idx);
            self.active.insert(idx, Vec::new());

            let excluded: Vec<_> = regions.iter().map(LoopRegion::interior).collect();
            let body = tokenize_excluding(&stream, 0..stream.len(), &excluded, &self.config);
            if !body.is_empty() {
                report = Some(self.play(idx, PlaybackSource::OneShot, &body, synth));
            }
        }

        self.sync_loops(idx, &stream, &regions, timers);
        report
    }

    /// Cancel loops whose region is gone, arm loops for regions not yet running
    fn sync_loops(
        &mut self,
        idx: usize,
        stream: &[StyledChar],
        regions: &[LoopRegion],
        timers: &mut dyn TimerFacility,
    ) {
        let Some(running) = self.active.get_mut(&idx) else {
            return;
        };

        let mut cancelled = Vec::new();
        running.retain(|lt| {
            let still_there = find_region(regions, &lt.key).is_some();
            if !still_there {
                timers.cancel(lt.handle);
                cancelled.push(lt.handle);
            }
            still_there
        });
        for handle in cancelled {
            if let Some((_, key)) = self.timer_owners.remove(&handle) {
                log::debug!("paragraph {}: loop [{}] cancelled", idx, key.content);
            }
        }

        for region in regions {
            if running.iter().any(|lt| lt.key == region.key) {
                continue;
            }
            let seq = tokenize_range(stream, region.interior(), &self.config);
            if seq.is_empty() {
                continue;
            }
            // Only reachable with a config built in code with zero durations;
            // from_yaml rejects those. A zero period would fire endlessly.
            let period = if seq.total_duration > 0.0 {
                seq.total_duration
            } else {
                self.config.loop_fallback_period
            };
            let handle = timers.start_repeating(period);
            log::debug!(
                "paragraph {}: loop [{}] armed every {:.3}s",
                idx,
                region.key.content,
                period
            );
            running.push(LoopTimer {
                key: region.key.clone(),
                handle,
                period,
            });
            self.timer_owners.insert(handle, (idx, region.key.clone()));
        }
    }

    fn deactivate(&mut self, idx: usize, timers: &mut dyn TimerFacility) {
        if let Some(running) = self.active.remove(&idx) {
            for lt in running {
                timers.cancel(lt.handle);
                self.timer_owners.remove(&lt.handle);
            }
            log::debug!("paragraph {} deactivated", idx);
        }
    }

    /// Handle a loop timer firing.
    ///
    /// The region's current interior is re-tokenized so edits and formatting
    /// changes made since the loop was armed are heard. Returns `None` when the
    /// handle is stale or the region no longer plays anything.
    pub fn on_timer(
        &mut self,
        handle: TimerHandle,
        document: &Document,
        synth: &mut dyn Synth,
    ) -> Option<PlaybackReport> {
        let (idx, key) = self.timer_owners.get(&handle).cloned()?;
        let paragraph = document.paragraphs.get(idx)?;

        let stream = resolve(paragraph, self.config.base_size_pt);
        let regions = find_loop_regions(&stream, &self.config.symbols);
        let Some(region) = find_region(&regions, &key) else {
            log::trace!("paragraph {}: loop [{}] vanished, skipping", idx, key.content);
            return None;
        };

        let seq = tokenize_range(&stream, region.interior(), &self.config);
        if seq.is_empty() {
            return None;
        }
        Some(self.play(idx, PlaybackSource::Loop(key), &seq, synth))
    }

    /// Cancel every loop, forget every activation and silence the synth.
    ///
    /// Safe to call at any time, any number of times. Paragraphs that still end
    /// with the terminator re-activate (one-shot included) on the next tick.
    pub fn stop_all(&mut self, synth: &mut dyn Synth, timers: &mut dyn TimerFacility) {
        let count = self.timer_owners.len();
        for handle in self.timer_owners.keys() {
            timers.cancel(*handle);
        }
        self.timer_owners.clear();
        self.active.clear();
        synth.stop_all();
        log::info!("stopped all playback ({} loops cancelled)", count);
    }

    fn play(
        &mut self,
        idx: usize,
        source: PlaybackSource,
        seq: &TokenSequence,
        synth: &mut dyn Synth,
    ) -> PlaybackReport {
        let start_time = synth.now();
        let (duration, letter_indices) = self.schedule_tokens(&seq.tokens, start_time, synth);
        PlaybackReport {
            paragraph: idx,
            source,
            start_time,
            duration,
            letter_indices,
        }
    }

    /// Lay tokens out back to back from `start_time`.
    ///
    /// Returns the time spanned and the letter indices that sounded.
    pub fn schedule_tokens(
        &mut self,
        tokens: &[Token],
        start_time: f64,
        synth: &mut dyn Synth,
    ) -> (f64, Vec<usize>) {
        let mut t = start_time;
        let mut letter_indices = Vec::new();
        for token in tokens {
            if let Some(spec) = map_token(token, &self.config, &mut self.rng) {
                synth.trigger_notes(NoteEvent::from_spec(spec, t));
                letter_indices.extend(token.letters().iter().map(|l| l.letter_index));
            }
            t += token.duration;
        }
        (t - start_time, letter_indices)
    }
}
