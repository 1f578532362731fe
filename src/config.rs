//! # Engine Configuration
//!
//! Every notation symbol and every timing or loudness constant the engine uses
//! lives in [`EngineConfig`]. The defaults reproduce the notation documented in
//! the crate root; a YAML file can override any subset of them:
//!
//! ```yaml
//! base-duration: 0.25
//! rest-duration: 1.0
//! terminator: "!"
//! accent: "*"
//! seed: 7
//! ```
//!
//! YAML is first read into [`RawConfig`] (every field optional, kebab-case
//! keys) and then validated into an [`EngineConfig`].

use crate::error::ToneTypeError;
use serde::Deserialize;
use std::path::Path;

/// Single-character markers that make up the notation.
#[derive(Debug, Clone, PartialEq)]
pub struct NotationSymbols {
    /// Ends a paragraph to activate it (`.`)
    pub terminator: char,
    pub loop_open: char,
    pub loop_close: char,
    /// Opens a live region; a paragraph starting with it is a live paragraph (`(`)
    pub live_open: char,
    pub live_close: char,
    pub accent: char,
    pub random: char,
    /// Delimits muted spans (`"`)
    pub quote: char,
    pub rest: char,
    /// Key that silences all sounding notes in live mode (`/`)
    pub silence: char,
}

impl Default for NotationSymbols {
    fn default() -> Self {
        Self {
            terminator: '.',
            loop_open: '[',
            loop_close: ']',
            live_open: '(',
            live_close: ')',
            accent: '!',
            random: '?',
            quote: '"',
            rest: '/',
            silence: '/',
        }
    }
}

/// Maps font size to note velocity.
///
/// Sizes are compared in CSS pixels: `low_px` and below play at
/// `min_velocity`, `high_px` and above at `max_velocity`, linear in between.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityCurve {
    pub low_px: f64,
    pub high_px: f64,
    pub min_velocity: f64,
    pub max_velocity: f64,
    pub accent_bonus: f64,
}

impl Default for VelocityCurve {
    fn default() -> Self {
        Self {
            low_px: 12.0,
            high_px: 24.0,
            min_velocity: 0.5,
            max_velocity: 1.0,
            accent_bonus: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub symbols: NotationSymbols,
    /// Duration of every letter and chord token, in audio-clock seconds
    pub base_duration: f64,
    /// Duration of a rest token
    pub rest_duration: f64,
    /// Loop period used when a region's tokens add up to nothing
    pub loop_fallback_period: f64,
    /// Font size of unstyled text, in points
    pub base_size_pt: f64,
    pub velocity: VelocityCurve,
    /// Seed for the random-pitch generator; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: NotationSymbols::default(),
            base_duration: 0.34,
            rest_duration: 2.0,
            loop_fallback_period: 0.2,
            base_size_pt: 12.0,
            velocity: VelocityCurve::default(),
            seed: None,
        }
    }
}

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub terminator: Option<String>,
    pub loop_open: Option<String>,
    pub loop_close: Option<String>,
    pub live_open: Option<String>,
    pub live_close: Option<String>,
    pub accent: Option<String>,
    pub random: Option<String>,
    pub quote: Option<String>,
    pub rest: Option<String>,
    pub silence: Option<String>,
    pub base_duration: Option<f64>,
    pub rest_duration: Option<f64>,
    pub loop_fallback_period: Option<f64>,
    pub base_size: Option<String>, // "12pt", "16px" or a quoted bare point value
    pub velocity_low_px: Option<f64>,
    pub velocity_high_px: Option<f64>,
    pub min_velocity: Option<f64>,
    pub max_velocity: Option<f64>,
    pub accent_bonus: Option<f64>,
    pub seed: Option<u64>,
}

impl EngineConfig {
    /// Parse and validate a YAML configuration. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ToneTypeError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_yaml::from_str(content)
            .map_err(|e| ToneTypeError::ConfigError(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ToneTypeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ToneTypeError> {
        let defaults = Self::default();
        let d = &defaults.symbols;

        let symbols = NotationSymbols {
            terminator: symbol("terminator", raw.terminator.as_deref(), d.terminator)?,
            loop_open: symbol("loop-open", raw.loop_open.as_deref(), d.loop_open)?,
            loop_close: symbol("loop-close", raw.loop_close.as_deref(), d.loop_close)?,
            live_open: symbol("live-open", raw.live_open.as_deref(), d.live_open)?,
            live_close: symbol("live-close", raw.live_close.as_deref(), d.live_close)?,
            accent: symbol("accent", raw.accent.as_deref(), d.accent)?,
            random: symbol("random", raw.random.as_deref(), d.random)?,
            quote: symbol("quote", raw.quote.as_deref(), d.quote)?,
            rest: symbol("rest", raw.rest.as_deref(), d.rest)?,
            silence: symbol("silence", raw.silence.as_deref(), d.silence)?,
        };
        check_distinct(&symbols)?;

        let base_size_pt = match raw.base_size.as_deref() {
            Some(s) => crate::style::parse_size_pt(s).ok_or_else(|| {
                ToneTypeError::ConfigError(format!("Invalid base-size: {}", s))
            })?,
            None => defaults.base_size_pt,
        };

        let velocity = VelocityCurve {
            low_px: raw.velocity_low_px.unwrap_or(defaults.velocity.low_px),
            high_px: raw.velocity_high_px.unwrap_or(defaults.velocity.high_px),
            min_velocity: raw.min_velocity.unwrap_or(defaults.velocity.min_velocity),
            max_velocity: raw.max_velocity.unwrap_or(defaults.velocity.max_velocity),
            accent_bonus: raw.accent_bonus.unwrap_or(defaults.velocity.accent_bonus),
        };
        if velocity.high_px <= velocity.low_px {
            return Err(ToneTypeError::ConfigError(
                "velocity-high-px must be greater than velocity-low-px".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&velocity.min_velocity)
            || !(0.0..=1.0).contains(&velocity.max_velocity)
            || velocity.min_velocity > velocity.max_velocity
        {
            return Err(ToneTypeError::ConfigError(
                "velocities must satisfy 0 <= min-velocity <= max-velocity <= 1".to_string(),
            ));
        }

        let config = Self {
            symbols,
            base_duration: positive("base-duration", raw.base_duration, defaults.base_duration)?,
            rest_duration: positive("rest-duration", raw.rest_duration, defaults.rest_duration)?,
            loop_fallback_period: positive(
                "loop-fallback-period",
                raw.loop_fallback_period,
                defaults.loop_fallback_period,
            )?,
            base_size_pt,
            velocity,
            seed: raw.seed,
        };
        log::debug!("loaded engine config: {:?}", config);
        Ok(config)
    }
}

fn symbol(name: &str, value: Option<&str>, default: char) -> Result<char, ToneTypeError> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() || c.is_whitespace() => Err(
            ToneTypeError::ConfigError(format!("{} cannot be a letter or whitespace", name)),
        ),
        (Some(c), None) => Ok(c),
        _ => Err(ToneTypeError::ConfigError(format!(
            "{} must be a single character, got {:?}",
            name, value
        ))),
    }
}

fn positive(name: &str, value: Option<f64>, default: f64) -> Result<f64, ToneTypeError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(ToneTypeError::ConfigError(format!(
            "{} must be positive, got {}",
            name, v
        ))),
        None => Ok(default),
    }
}

/// Rest and silence may share a character: one is read by the tokenizer, the
/// other by live mode. Every other pair must differ.
fn check_distinct(s: &NotationSymbols) -> Result<(), ToneTypeError> {
    let named = [
        ("terminator", s.terminator),
        ("loop-open", s.loop_open),
        ("loop-close", s.loop_close),
        ("live-open", s.live_open),
        ("live-close", s.live_close),
        ("accent", s.accent),
        ("random", s.random),
        ("quote", s.quote),
        ("rest", s.rest),
    ];
    for (i, (a_name, a)) in named.iter().enumerate() {
        for (b_name, b) in &named[i + 1..] {
            if a == b {
                return Err(ToneTypeError::ConfigError(format!(
                    "{} and {} both use {:?}",
                    a_name, b_name, a
                )));
            }
        }
    }
    if s.silence != s.rest && named.iter().any(|(_, c)| *c == s.silence) {
        return Err(ToneTypeError::ConfigError(format!(
            "silence {:?} collides with another symbol",
            s.silence
        )));
    }
    Ok(())
}
