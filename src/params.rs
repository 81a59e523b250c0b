//! # Plugin Parameters
//!
//! Parameters are the knobs and switches the user sees in the DAW. Each
//! parameter has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to
//!   save and recall presets. Once published, never change these IDs
//!   or existing presets will break.
//! - A **human-readable name** shown in the DAW's UI.
//! - A **range** and a **default value**.
//!
//! ## No Host-Side Smoothing
//!
//! None of these parameters carry a nih-plug smoother. The engine ramps
//! every delay time and width itself (see `dsp::smoother`), and it wants
//! the raw values exactly once per block, through
//! [`PluginParams::snapshot()`].
//!
//! ## Power Buttons
//!
//! The five `... On` switches rest at `true`, which means *bypassed*. An
//! effect runs when its switch is pressed to `false`.

use std::ops::RangeInclusive;
use std::sync::Arc;

use nih_plug::prelude::*;

use crate::settings::{
    ChainSettings, VoiceCount, CHORUS_LFO_RANGE_HZ, FLANGER_LFO_RANGE_HZ, MAX_DELAY_TIME_SECONDS,
    MIN_DELAY_TIME_SECONDS, VIBRATO_LFO_RANGE_HZ,
};
use crate::tempo::{LfoButtons, TempoButtons};

/// All user-facing parameters for the Loveless Mod Delay plugin.
#[derive(Params)]
pub struct PluginParams {
    // ─── Echo ───
    /// **Delay Time**: distance between the input and the first echo.
    ///
    /// Skewed so the short, slapback end of the range gets more knob
    /// travel.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback**: how much of each echo is fed back for the next one.
    /// Capped at 90% so the loop always decays.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    #[id = "dry"]
    pub dry_level: FloatParam,

    #[id = "wet"]
    pub wet_level: FloatParam,

    // ─── Flanger ───
    #[id = "fl_delay"]
    pub flanger_delay: FloatParam,

    #[id = "fl_width"]
    pub flanger_width: FloatParam,

    #[id = "fl_depth"]
    pub flanger_depth: FloatParam,

    /// **Flanger Feedback**: resonance of the flanger's own loop.
    #[id = "fl_fdbk"]
    pub flanger_feedback: FloatParam,

    #[id = "fl_rate"]
    pub flanger_lfo_freq: FloatParam,

    // ─── Vibrato ───
    /// **Vibrato Width**: the largest delay the vibrato sweeps through.
    /// Wider means a deeper pitch wobble.
    #[id = "vib_width"]
    pub vibrato_width: FloatParam,

    #[id = "vib_depth"]
    pub vibrato_depth: FloatParam,

    #[id = "vib_rate"]
    pub vibrato_lfo_freq: FloatParam,

    // ─── Chorus ───
    #[id = "ch_delay"]
    pub chorus_delay: FloatParam,

    #[id = "ch_width"]
    pub chorus_width: FloatParam,

    #[id = "ch_depth"]
    pub chorus_depth: FloatParam,

    #[id = "ch_rate"]
    pub chorus_lfo_freq: FloatParam,

    /// **Number of Voices**: total voices including the echo itself.
    #[id = "voices"]
    pub voices: EnumParam<VoiceCount>,

    // ─── Reverb ───
    /// **Dry Reverb**: reverb level on the untouched input.
    #[id = "dry_rev"]
    pub dry_reverb: FloatParam,

    /// **Wet Reverb**: reverb level on the effect output.
    #[id = "wet_rev"]
    pub wet_reverb: FloatParam,

    #[id = "room"]
    pub room_size: FloatParam,

    #[id = "damp"]
    pub damping: FloatParam,

    #[id = "rev_width"]
    pub reverb_width: FloatParam,

    // ─── Power buttons (true = bypassed) ───
    #[id = "fl_on"]
    pub flanger_on: BoolParam,

    #[id = "vib_on"]
    pub vibrato_on: BoolParam,

    #[id = "ch_on"]
    pub chorus_on: BoolParam,

    #[id = "dry_rev_on"]
    pub dry_reverb_on: BoolParam,

    #[id = "wet_rev_on"]
    pub wet_reverb_on: BoolParam,

    // ─── Tempo buttons (momentary) ───
    #[id = "tap"]
    pub tap: BoolParam,

    #[id = "tempo_up"]
    pub tempo_up: BoolParam,

    #[id = "tempo_down"]
    pub tempo_down: BoolParam,

    // ─── LFO buttons (momentary, act on the selected effect) ───
    #[id = "lfo_sync"]
    pub lfo_sync: BoolParam,

    #[id = "lfo_up"]
    pub lfo_up: BoolParam,

    #[id = "lfo_down"]
    pub lfo_down: BoolParam,
}

/// A linear 0-100% control.
fn percentage(name: &str, default: f32, max: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max })
        .with_unit("%")
        .with_value_to_string(formatters::v2s_f32_percentage(1))
        .with_string_to_value(formatters::s2v_f32_percentage())
}

/// A time control in seconds, shown in milliseconds.
fn seconds(name: &str, default: f32, min: f32, max: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min, max })
        .with_unit(" ms")
        .with_value_to_string(Arc::new(|value| format!("{:.1}", value * 1000.0)))
        .with_string_to_value(Arc::new(|string| {
            string
                .trim()
                .trim_end_matches("ms")
                .trim()
                .parse::<f32>()
                .ok()
                .map(|ms| ms / 1000.0)
        }))
}

/// An LFO rate in Hz.
fn rate(name: &str, default: f32, range: RangeInclusive<f32>) -> FloatParam {
    let (min, max) = range.into_inner();
    FloatParam::new(name, default, FloatRange::Linear { min, max })
        .with_unit(" Hz")
        .with_value_to_string(formatters::v2s_f32_rounded(2))
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                0.5,
                FloatRange::Skewed {
                    min: MIN_DELAY_TIME_SECONDS,
                    max: MAX_DELAY_TIME_SECONDS,
                    // Negative skew = more resolution at the low end.
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" s")
            .with_value_to_string(formatters::v2s_f32_rounded(3))
            .with_step_size(0.001),

            feedback: percentage("Feedback", 0.45, 0.9),
            dry_level: percentage("Dry Level", 1.0, 1.0),
            wet_level: percentage("Wet Level", 0.5, 1.0),

            flanger_delay: seconds("Flanger Delay", 0.005, 0.001, 0.02),
            flanger_width: seconds("Flanger Width", 0.010, 0.001, 0.02),
            flanger_depth: percentage("Flanger Depth", 1.0, 1.0),
            flanger_feedback: percentage("Flanger Feedback", 0.25, 0.5),
            flanger_lfo_freq: rate("Flanger LFO Frequency", 0.5, FLANGER_LFO_RANGE_HZ),

            vibrato_width: seconds("Vibrato Width", 0.02, 0.001, 0.04),
            vibrato_depth: percentage("Vibrato Depth", 1.0, 1.0),
            vibrato_lfo_freq: rate("Vibrato LFO Frequency", 2.0, VIBRATO_LFO_RANGE_HZ),

            chorus_delay: seconds("Chorus Delay", 0.03, 0.01, 0.05),
            chorus_width: seconds("Chorus Width", 0.01, 0.001, 0.03),
            chorus_depth: percentage("Chorus Depth", 1.0, 1.0),
            chorus_lfo_freq: rate("Chorus LFO Frequency", 0.5, CHORUS_LFO_RANGE_HZ),
            voices: EnumParam::new("Number of Voices", VoiceCount::Three),

            dry_reverb: percentage("Dry Reverb", 0.5, 1.0),
            wet_reverb: percentage("Wet Reverb", 0.5, 1.0),
            room_size: percentage("Room Size", 0.25, 0.5),
            damping: percentage("Damping", 0.8, 1.0),
            reverb_width: percentage("Reverb Width", 0.5, 1.0),

            flanger_on: BoolParam::new("Flanger On", true),
            vibrato_on: BoolParam::new("Vibrato On", true),
            chorus_on: BoolParam::new("Chorus On", true),
            dry_reverb_on: BoolParam::new("Dry Reverb On", true),
            wet_reverb_on: BoolParam::new("Wet Reverb On", true),

            tap: BoolParam::new("Tap Tempo", false),
            tempo_up: BoolParam::new("Tempo Up", false),
            tempo_down: BoolParam::new("Tempo Down", false),

            lfo_sync: BoolParam::new("LFO Sync", false),
            lfo_up: BoolParam::new("LFO Up", false),
            lfo_down: BoolParam::new("LFO Down", false),
        }
    }
}

impl PluginParams {
    /// Read every control once into a [`ChainSettings`], with `delay_time`
    /// standing in for the Delay Time knob (it may come from tap tempo).
    pub fn snapshot(&self, delay_time: f32) -> ChainSettings {
        ChainSettings {
            delay_time,
            feedback: self.feedback.value(),
            dry_level: self.dry_level.value(),
            wet_level: self.wet_level.value(),

            flanger_delay: self.flanger_delay.value(),
            flanger_width: self.flanger_width.value(),
            flanger_depth: self.flanger_depth.value(),
            flanger_feedback: self.flanger_feedback.value(),
            flanger_lfo_freq: self.flanger_lfo_freq.value(),

            vibrato_width: self.vibrato_width.value(),
            vibrato_depth: self.vibrato_depth.value(),
            vibrato_lfo_freq: self.vibrato_lfo_freq.value(),

            chorus_delay: self.chorus_delay.value(),
            chorus_width: self.chorus_width.value(),
            chorus_depth: self.chorus_depth.value(),
            chorus_lfo_freq: self.chorus_lfo_freq.value(),
            voices: self.voices.value(),

            dry_reverb: self.dry_reverb.value(),
            wet_reverb: self.wet_reverb.value(),
            room_size: self.room_size.value(),
            damping: self.damping.value(),
            reverb_width: self.reverb_width.value(),

            flanger_on: self.flanger_on.value(),
            vibrato_on: self.vibrato_on.value(),
            chorus_on: self.chorus_on.value(),
            dry_reverb_on: self.dry_reverb_on.value(),
            wet_reverb_on: self.wet_reverb_on.value(),
        }
    }

    pub fn tempo_buttons(&self) -> TempoButtons {
        TempoButtons {
            tap: self.tap.value(),
            tempo_up: self.tempo_up.value(),
            tempo_down: self.tempo_down.value(),
        }
    }

    pub fn lfo_buttons(&self) -> LfoButtons {
        LfoButtons {
            sync: self.lfo_sync.value(),
            rate_up: self.lfo_up.value(),
            rate_down: self.lfo_down.value(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A fresh parameter set snapshots to the engine's own defaults.
    #[test]
    fn test_default_snapshot_matches_chain_defaults() {
        let params = PluginParams::default();
        let snapshot = params.snapshot(params.delay_time.value());

        assert_eq!(snapshot, ChainSettings::default());
    }

    #[test]
    fn test_snapshot_uses_given_delay_time() {
        let params = PluginParams::default();
        assert_eq!(params.snapshot(1.25).delay_time, 1.25);
    }

    #[test]
    fn test_buttons_rest_released() {
        let params = PluginParams::default();
        assert_eq!(params.tempo_buttons(), TempoButtons::default());
        assert_eq!(params.lfo_buttons(), LfoButtons::default());
    }

    /// The time formatter shows milliseconds and parses them back.
    #[test]
    fn test_seconds_formatting() {
        let params = PluginParams::default();
        let display = params.flanger_delay.normalized_value_to_string(
            params.flanger_delay.preview_normalized(0.005),
            false,
        );
        assert_eq!(display, "5.0");

        let normalized = params.flanger_delay.string_to_normalized_value("12 ms");
        let plain = normalized.map(|n| params.flanger_delay.preview_plain(n));
        assert!(plain.is_some_and(|v| (v - 0.012).abs() < 1e-6));
    }

    #[test]
    fn test_lfo_rate_ranges() {
        let params = PluginParams::default();
        for (param, range) in [
            (&params.flanger_lfo_freq, FLANGER_LFO_RANGE_HZ),
            (&params.vibrato_lfo_freq, VIBRATO_LFO_RANGE_HZ),
            (&params.chorus_lfo_freq, CHORUS_LFO_RANGE_HZ),
        ] {
            assert!((param.preview_plain(0.0) - range.start()).abs() < 1e-6);
            assert!((param.preview_plain(1.0) - range.end()).abs() < 1e-6);
        }
    }
}
