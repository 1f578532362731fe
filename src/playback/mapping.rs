//! Audio mapping: character + style + modifiers → sound parameters
//!
//! Pure apart from the random draw, which takes its generator as an argument.

use crate::ast::{ColorBucket, StyleAttributes, Token};
use crate::config::EngineConfig;
use crate::style::pt_to_px;
use super::types::{Distortion, EffectChain, Reverb, SoundSpec, Vibrato, Waveform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Every pitch the engine can play: naturals from C3 to B5
pub const NOTE_POOL: [&str; 21] = [
    "C3", "D3", "E3", "F3", "G3", "A3", "B3",
    "C4", "D4", "E4", "F4", "G4", "A4", "B4",
    "C5", "D5", "E5", "F5", "G5", "A5", "B5",
];

/// Accent and randomization flags of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub accent: bool,
    pub random: bool,
}

/// Generator for random pitches, seeded from the config when a seed is given
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Fixed letter → pitch lookup. `None` for anything that is not an ASCII letter.
///
/// Letters wrap around the pool: `a` is C3, `u` is B5, `v` is C3 again.
pub fn letter_to_note(ch: char) -> Option<&'static str> {
    if !ch.is_ascii_alphabetic() {
        return None;
    }
    let idx = (ch.to_ascii_lowercase() as usize - 'a' as usize) % NOTE_POOL.len();
    Some(NOTE_POOL[idx])
}

pub fn random_note(rng: &mut impl Rng) -> &'static str {
    NOTE_POOL[rng.gen_range(0..NOTE_POOL.len())]
}

/// Map a single character.
///
/// The random marker itself maps to a random pitch, so live typing of `?`
/// plays something. Other unmapped characters give `None` and must be skipped.
pub fn map_char(
    ch: char,
    modifiers: Modifiers,
    attrs: &StyleAttributes,
    config: &EngineConfig,
    rng: &mut impl Rng,
) -> Option<SoundSpec> {
    let pitch = if modifiers.random || ch == config.symbols.random {
        random_note(rng)
    } else {
        letter_to_note(ch)?
    };
    Some(sound(vec![pitch], modifiers, attrs, config))
}

/// Map a letter or chord token; rests give `None`.
///
/// A chord is one trigger with every member's pitch, shaped by the chord's style.
pub fn map_token(token: &Token, config: &EngineConfig, rng: &mut impl Rng) -> Option<SoundSpec> {
    let attrs = token.attrs()?;
    let modifiers = Modifiers {
        accent: token.accent,
        random: token.random,
    };
    let pitches: Vec<&'static str> = token
        .letters()
        .iter()
        .filter_map(|l| {
            if token.random {
                Some(random_note(rng))
            } else {
                letter_to_note(l.ch)
            }
        })
        .collect();
    if pitches.is_empty() {
        return None;
    }
    Some(sound(pitches, modifiers, attrs, config))
}

fn sound(
    pitches: Vec<&'static str>,
    modifiers: Modifiers,
    attrs: &StyleAttributes,
    config: &EngineConfig,
) -> SoundSpec {
    SoundSpec {
        pitches,
        duration: config.base_duration,
        velocity: velocity(attrs.size_pt, modifiers.accent, config),
        waveform: waveform(attrs.color),
        effects: effect_chain(attrs),
    }
}

/// Font size → loudness, plus the accent bonus, capped at the curve's maximum
pub fn velocity(size_pt: f64, accent: bool, config: &EngineConfig) -> f64 {
    let curve = &config.velocity;
    let px = pt_to_px(size_pt);
    let t = (px - curve.low_px) / (curve.high_px - curve.low_px);
    let base = (curve.min_velocity + t * (curve.max_velocity - curve.min_velocity))
        .clamp(curve.min_velocity, curve.max_velocity);
    if accent {
        (base + curve.accent_bonus).min(curve.max_velocity)
    } else {
        base
    }
}

pub fn waveform(color: ColorBucket) -> Waveform {
    match color {
        ColorBucket::Blue => Waveform::Sine,
        ColorBucket::Green => Waveform::Square,
        ColorBucket::Red | ColorBucket::Black => Waveform::Triangle,
    }
}

/// Style → effect chain. Effects stack rather than replace each other.
pub fn effect_chain(attrs: &StyleAttributes) -> EffectChain {
    let mut drive_wet: f64 = if attrs.bold { 0.45 } else { 0.0 };
    if attrs.color == ColorBucket::Red {
        drive_wet = drive_wet.max(0.6);
    }

    EffectChain {
        vibrato: attrs.italic.then_some(Vibrato {
            frequency: 5.0,
            depth: 0.16,
            wet: 0.5,
        }),
        distortion: (drive_wet > 0.0).then_some(Distortion {
            amount: 0.35,
            wet: drive_wet,
        }),
        reverb: Reverb {
            decay: 2.2,
            pre_delay: 0.03,
            wet: if attrs.underline { 0.28 } else { 0.15 },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Letter, TokenKind};

    fn plain() -> StyleAttributes {
        StyleAttributes::plain(12.0)
    }

    #[test]
    fn test_letter_table() {
        assert_eq!(letter_to_note('a'), Some("C3"));
        assert_eq!(letter_to_note('C'), Some("E3"));
        assert_eq!(letter_to_note('h'), Some("C4"));
        assert_eq!(letter_to_note('u'), Some("B5"));
        assert_eq!(letter_to_note('v'), Some("C3"));
        assert_eq!(letter_to_note('z'), Some("G3"));
        assert_eq!(letter_to_note('1'), None);
        assert_eq!(letter_to_note('é'), None);
    }

    #[test]
    fn test_unmapped_char_gives_no_sound() {
        let config = EngineConfig::default();
        let mut rng = make_rng(Some(1));
        assert!(map_char('#', Modifiers::default(), &plain(), &config, &mut rng).is_none());
    }

    #[test]
    fn test_random_marker_draws_from_pool() {
        let config = EngineConfig::default();
        let mut rng = make_rng(Some(1));
        for _ in 0..50 {
            let spec = map_char('?', Modifiers::default(), &plain(), &config, &mut rng).unwrap();
            assert!(NOTE_POOL.contains(&spec.pitches[0]));
        }
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = make_rng(Some(42));
        let mut b = make_rng(Some(42));
        let xs: Vec<_> = (0..10).map(|_| random_note(&mut a)).collect();
        let ys: Vec<_> = (0..10).map(|_| random_note(&mut b)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_velocity_curve() {
        let config = EngineConfig::default();
        // 9pt = 12px -> floor, 18pt = 24px -> ceiling
        assert_eq!(velocity(9.0, false, &config), 0.5);
        assert_eq!(velocity(18.0, false, &config), 1.0);
        assert_eq!(velocity(40.0, false, &config), 1.0);
        assert_eq!(velocity(6.0, false, &config), 0.5);
        // 12pt = 16px -> one third of the way up
        assert!((velocity(12.0, false, &config) - (0.5 + 0.5 / 3.0)).abs() < 1e-9);
        // Accent adds 0.2 but never passes the ceiling
        assert!((velocity(9.0, true, &config) - 0.7).abs() < 1e-9);
        assert_eq!(velocity(18.0, true, &config), 1.0);
    }

    #[test]
    fn test_velocity_is_monotonic() {
        let config = EngineConfig::default();
        let sizes = [6.0, 9.0, 10.0, 12.0, 14.0, 16.0, 18.0, 30.0];
        let vs: Vec<f64> = sizes.iter().map(|s| velocity(*s, false, &config)).collect();
        assert!(vs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_waveform_by_color() {
        assert_eq!(waveform(ColorBucket::Blue), Waveform::Sine);
        assert_eq!(waveform(ColorBucket::Green), Waveform::Square);
        assert_eq!(waveform(ColorBucket::Red), Waveform::Triangle);
        assert_eq!(waveform(ColorBucket::Black), Waveform::Triangle);
    }

    #[test]
    fn test_effects_stack() {
        let attrs = StyleAttributes {
            bold: true,
            italic: true,
            underline: true,
            ..plain()
        };
        let chain = effect_chain(&attrs);
        assert_eq!(chain.distortion.unwrap().wet, 0.45);
        assert!(chain.vibrato.is_some());
        assert_eq!(chain.reverb.wet, 0.28);

        let chain = effect_chain(&plain());
        assert!(chain.distortion.is_none());
        assert!(chain.vibrato.is_none());
        assert_eq!(chain.reverb.wet, 0.15);
    }

    #[test]
    fn test_red_adds_drive() {
        let red = StyleAttributes {
            color: ColorBucket::Red,
            ..plain()
        };
        assert_eq!(effect_chain(&red).distortion.unwrap().wet, 0.6);
        let red_bold = StyleAttributes { bold: true, ..red };
        assert_eq!(effect_chain(&red_bold).distortion.unwrap().wet, 0.6);
    }

    #[test]
    fn test_chord_token_maps_all_pitches() {
        let config = EngineConfig::default();
        let mut rng = make_rng(Some(3));
        let letter = |ch, letter_index| Letter {
            ch,
            attrs: plain(),
            letter_index,
        };
        let token = Token {
            kind: TokenKind::Chord {
                letters: vec![letter('a', 0), letter('c', 1), letter('e', 2)],
                attrs: plain(),
            },
            accent: true,
            random: false,
            duration: config.base_duration,
        };
        let spec = map_token(&token, &config, &mut rng).unwrap();
        assert_eq!(spec.pitches, vec!["C3", "E3", "G3"]);
        assert!(spec.velocity > velocity(12.0, false, &config));
        assert_eq!(spec.duration, 0.34);
    }

    #[test]
    fn test_rest_token_maps_to_nothing() {
        let config = EngineConfig::default();
        let mut rng = make_rng(Some(3));
        let rest = Token {
            kind: TokenKind::Rest,
            accent: false,
            random: false,
            duration: 2.0,
        };
        assert!(map_token(&rest, &config, &mut rng).is_none());
    }
}
