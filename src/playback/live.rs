//! Live keystroke mode
//!
//! While the caret sits inside a live region, every letter key sounds
//! immediately, in the style at the caret. Nothing is buffered or tokenized:
//! one qualifying keystroke is one note event. The silence key releases
//! everything that is sounding instead.
//!
//! The caret is inside a live region when, in its paragraph's text before the
//! caret, the last live-open marker comes after the last live-close marker.
//! A paragraph that starts with the live-open marker is therefore live for
//! everything typed after it, until it is closed.

use crate::ast::{Caret, Document, StyleAttributes};
use crate::config::{EngineConfig, NotationSymbols};
use crate::style::resolve;
use super::mapping::{make_rng, map_char, Modifiers};
use super::synth::Synth;
use super::types::NoteEvent;
use rand::rngs::StdRng;

#[derive(Debug, Clone, PartialEq)]
pub enum KeystrokeOutcome {
    /// Caret outside a live region, or a key that does not play
    Ignored,
    Played(NoteEvent),
    /// The silence key released all sounding notes
    Silenced,
}

/// Whether `offset` (a character offset) lies inside a live region of `text`
pub fn is_in_live_region(text: &str, offset: usize, symbols: &NotationSymbols) -> bool {
    let mut last_open = None;
    let mut last_close = None;
    for (i, c) in text.chars().take(offset).enumerate() {
        if c == symbols.live_open {
            last_open = Some(i);
        } else if c == symbols.live_close {
            last_close = Some(i);
        }
    }
    match (last_open, last_close) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Plays keystrokes typed inside live regions
pub struct LivePlayer {
    config: EngineConfig,
    rng: StdRng,
}

impl LivePlayer {
    pub fn new(config: EngineConfig) -> Self {
        // Offset the seed so live draws do not mirror the scheduler's
        let rng = make_rng(config.seed.map(|s| s.wrapping_add(1)));
        Self { config, rng }
    }

    /// Handle a key pressed at `caret`, before the character is inserted.
    pub fn keystroke(
        &mut self,
        document: &Document,
        caret: Caret,
        key: char,
        synth: &mut dyn Synth,
    ) -> KeystrokeOutcome {
        let symbols = &self.config.symbols;
        let plays = key.is_ascii_alphabetic() || key == symbols.random;
        if !plays && key != symbols.silence {
            return KeystrokeOutcome::Ignored;
        }

        let Some(paragraph) = document.paragraphs.get(caret.paragraph) else {
            return KeystrokeOutcome::Ignored;
        };
        let text = paragraph.text();
        if !is_in_live_region(&text, caret.offset, symbols) {
            return KeystrokeOutcome::Ignored;
        }

        if key == symbols.silence {
            log::debug!("live silence in paragraph {}", caret.paragraph);
            synth.stop_all();
            return KeystrokeOutcome::Silenced;
        }

        let attrs = self.caret_style(document, caret);
        let Some(spec) = map_char(key, Modifiers::default(), &attrs, &self.config, &mut self.rng) else {
            return KeystrokeOutcome::Ignored;
        };
        let event = NoteEvent::from_spec(spec, synth.now());
        synth.trigger_notes(event.clone());
        KeystrokeOutcome::Played(event)
    }

    /// Style inherited at the caret: the character before it, else the one
    /// after it, else unstyled text
    fn caret_style(&self, document: &Document, caret: Caret) -> StyleAttributes {
        let base = StyleAttributes::plain(self.config.base_size_pt);
        let Some(paragraph) = document.paragraphs.get(caret.paragraph) else {
            return base;
        };
        let stream = resolve(paragraph, self.config.base_size_pt);
        caret
            .offset
            .checked_sub(1)
            .and_then(|i| stream.get(i))
            .or_else(|| stream.get(caret.offset))
            .map(|c| c.attrs)
            .unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColorBucket, Paragraph, SpanStyle, StyledNode};
    use crate::playback::synth::RecordingSynth;
    use crate::playback::types::Waveform;

    fn player() -> LivePlayer {
        LivePlayer::new(EngineConfig {
            seed: Some(9),
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_live_region_detection() {
        let s = NotationSymbols::default();
        assert!(is_in_live_region("(ab", 3, &s));
        assert!(is_in_live_region("(ab", 1, &s));
        assert!(!is_in_live_region("(ab", 0, &s));
        assert!(!is_in_live_region("(ab) c", 6, &s));
        assert!(is_in_live_region("(ab) (c", 7, &s));
        assert!(!is_in_live_region("abc", 3, &s));
        assert!(is_in_live_region("x (ab) y", 4, &s));
    }

    #[test]
    fn test_letter_in_live_paragraph_plays_once() {
        let doc = Document::new(vec![Paragraph::plain("(ab")]);
        let mut synth = RecordingSynth::new();
        synth.set_now(3.0);
        let outcome = player().keystroke(&doc, Caret { paragraph: 0, offset: 3 }, 'c', &mut synth);
        match outcome {
            KeystrokeOutcome::Played(event) => {
                assert_eq!(event.pitches, vec!["E3"]);
                assert_eq!(event.start_time, 3.0);
            }
            other => panic!("Expected Played, got {:?}", other),
        }
        assert_eq!(synth.events().len(), 1);
    }

    #[test]
    fn test_outside_live_region_is_ignored() {
        let doc = Document::new(vec![Paragraph::plain("ab")]);
        let mut synth = RecordingSynth::new();
        let outcome = player().keystroke(&doc, Caret { paragraph: 0, offset: 2 }, 'c', &mut synth);
        assert_eq!(outcome, KeystrokeOutcome::Ignored);
        assert!(synth.events().is_empty());
    }

    #[test]
    fn test_non_playing_keys_are_ignored() {
        let doc = Document::new(vec![Paragraph::plain("(ab")]);
        let mut synth = RecordingSynth::new();
        let mut live = player();
        for key in ['1', ' ', '.', '!'] {
            let outcome = live.keystroke(&doc, Caret { paragraph: 0, offset: 3 }, key, &mut synth);
            assert_eq!(outcome, KeystrokeOutcome::Ignored);
        }
        assert!(synth.events().is_empty());
    }

    #[test]
    fn test_silence_key_stops_everything() {
        let doc = Document::new(vec![Paragraph::plain("(ab")]);
        let mut synth = RecordingSynth::new();
        let outcome = player().keystroke(&doc, Caret { paragraph: 0, offset: 3 }, '/', &mut synth);
        assert_eq!(outcome, KeystrokeOutcome::Silenced);
        assert_eq!(synth.stop_count(), 1);
        assert!(synth.events().is_empty());
    }

    #[test]
    fn test_random_key_plays_from_pool() {
        let doc = Document::new(vec![Paragraph::plain("(")]);
        let mut synth = RecordingSynth::new();
        let outcome = player().keystroke(&doc, Caret { paragraph: 0, offset: 1 }, '?', &mut synth);
        assert!(matches!(outcome, KeystrokeOutcome::Played(_)));
    }

    #[test]
    fn test_uses_style_at_caret() {
        let doc = Document::new(vec![Paragraph::new(vec![
            StyledNode::text("("),
            StyledNode::span(SpanStyle::color(ColorBucket::Blue), vec![StyledNode::text("a")]),
        ])]);
        let mut synth = RecordingSynth::new();
        let outcome = player().keystroke(&doc, Caret { paragraph: 0, offset: 2 }, 'b', &mut synth);
        match outcome {
            KeystrokeOutcome::Played(event) => assert_eq!(event.waveform, Waveform::Sine),
            other => panic!("Expected Played, got {:?}", other),
        }
    }

    #[test]
    fn test_caret_in_missing_paragraph_is_ignored() {
        let doc = Document::default();
        let mut synth = RecordingSynth::new();
        let outcome = player().keystroke(&doc, Caret { paragraph: 4, offset: 0 }, 'a', &mut synth);
        assert_eq!(outcome, KeystrokeOutcome::Ignored);
    }
}
