//! # Notation Tokenizer
//!
//! Turns a styled character stream into the ordered [`Token`]s that get played.
//!
//! ## Rules (in precedence order)
//! 1. **Muted spans**: characters between quotes produce nothing. They still
//!    occupy stream positions, so every letter keeps its own style. An
//!    unmatched quote mutes to the end of the input.
//! 2. **Rests**: the rest marker outside quotes becomes a `Rest` of
//!    `rest_duration`.
//! 3. **Words**: everything else is split on whitespace, quotes, rests and
//!    loop brackets. A word with one letter is a `Letter`; a word with more is
//!    a `Chord` of its letters in order. The accent or random marker anywhere
//!    in a word flags the word's token. Other characters are dropped.
//! 4. Letters and chords last `base_duration`.
//!
//! The tokenizer is total: any input is valid notation, possibly silent. An
//! empty result means "nothing to schedule".

use crate::ast::*;
use crate::config::EngineConfig;
use std::ops::Range;

/// Tokenize a whole stream.
pub fn tokenize(stream: &[StyledChar], config: &EngineConfig) -> TokenSequence {
    tokenize_range(stream, 0..stream.len(), config)
}

/// Tokenize part of a stream, e.g. a loop region's interior.
///
/// Letter indices stay relative to the start of the full stream.
pub fn tokenize_range(stream: &[StyledChar], range: Range<usize>, config: &EngineConfig) -> TokenSequence {
    tokenize_excluding(stream, range, &[], config)
}

/// Tokenize part of a stream, skipping the `excluded` sub-ranges entirely.
///
/// Used for one-shot playback, which leaves loop-region interiors to their
/// own timers. An excluded range ends the current word.
pub fn tokenize_excluding(
    stream: &[StyledChar],
    range: Range<usize>,
    excluded: &[Range<usize>],
    config: &EngineConfig,
) -> TokenSequence {
    let end = range.end.min(stream.len());
    let start = range.start.min(end);
    let symbols = &config.symbols;

    let mut tokens = Vec::new();
    let mut word = WordBuilder::default();
    let mut in_quote = false;
    let mut letter_index = stream[..start].iter().filter(|c| c.ch.is_ascii_alphabetic()).count();

    let mut i = start;
    while i < end {
        if let Some(skip) = excluded.iter().find(|r| r.start == i && r.end > i) {
            word.flush(&mut tokens, config);
            let skip_end = skip.end.min(end);
            letter_index += stream[i..skip_end]
                .iter()
                .filter(|c| c.ch.is_ascii_alphabetic())
                .count();
            i = skip_end;
            continue;
        }

        let styled = &stream[i];
        let c = styled.ch;
        let is_letter = c.is_ascii_alphabetic();

        if c == symbols.quote {
            word.flush(&mut tokens, config);
            in_quote = !in_quote;
        } else if in_quote {
            // muted
        } else if c == symbols.rest {
            word.flush(&mut tokens, config);
            tokens.push(Token {
                kind: TokenKind::Rest,
                accent: false,
                random: false,
                duration: config.rest_duration,
            });
        } else if c.is_whitespace() || c == symbols.loop_open || c == symbols.loop_close {
            word.flush(&mut tokens, config);
        } else if is_letter {
            word.letters.push(Letter {
                ch: c,
                attrs: styled.attrs,
                letter_index,
            });
        } else if c == symbols.accent {
            word.accent = true;
        } else if c == symbols.random {
            word.random = true;
        }

        if is_letter {
            letter_index += 1;
        }
        i += 1;
    }
    word.flush(&mut tokens, config);

    let total_duration = tokens.iter().map(|t| t.duration).sum();
    TokenSequence { tokens, total_duration }
}

/// Letters and modifiers collected for the word being read
#[derive(Default)]
struct WordBuilder {
    letters: Vec<Letter>,
    accent: bool,
    random: bool,
}

impl WordBuilder {
    fn flush(&mut self, tokens: &mut Vec<Token>, config: &EngineConfig) {
        let mut letters = std::mem::take(&mut self.letters);
        let accent = std::mem::take(&mut self.accent);
        let random = std::mem::take(&mut self.random);

        let kind = match letters.len() {
            0 => return,
            1 => TokenKind::Letter(letters.swap_remove(0)),
            _ => {
                let attrs = letters[0].attrs;
                TokenKind::Chord { letters, attrs }
            }
        };
        tokens.push(Token {
            kind,
            accent,
            random,
            duration: config.base_duration,
        });
    }
}
