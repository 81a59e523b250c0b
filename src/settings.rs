//! # Chain Settings
//!
//! Everything the engine needs to know about the controls for one block,
//! captured in a single plain value. The plugin reads every parameter
//! exactly once at the top of `process()` and hands the engine this
//! snapshot; nothing inside the sample loop ever looks at the live
//! parameters again, so a delay time can never be paired with a feedback
//! value from a different moment.

use std::ops::RangeInclusive;

use nih_plug::prelude::*;

/// Shortest base delay the Delay Time control allows.
pub const MIN_DELAY_TIME_SECONDS: f32 = 0.1;
/// Longest base delay the Delay Time control allows.
pub const MAX_DELAY_TIME_SECONDS: f32 = 3.0;

/// Flanger LFO Frequency range in Hz.
pub const FLANGER_LFO_RANGE_HZ: RangeInclusive<f32> = 0.1..=2.0;
/// Vibrato LFO Frequency range in Hz.
pub const VIBRATO_LFO_RANGE_HZ: RangeInclusive<f32> = 0.4..=8.0;
/// Chorus LFO Frequency range in Hz.
pub const CHORUS_LFO_RANGE_HZ: RangeInclusive<f32> = 0.1..=2.0;

/// Total number of chorus voices, counting the echo itself as one.
///
/// A closed set, so "voices minus two" can never reach a division by zero
/// below the two-voice special case.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceCount {
    #[id = "two"]
    #[name = "2"]
    Two,
    #[id = "three"]
    #[name = "3"]
    Three,
    #[id = "four"]
    #[name = "4"]
    Four,
    #[id = "five"]
    #[name = "5"]
    Five,
}

impl VoiceCount {
    /// 0 for two voices, up to 3 for five.
    pub fn index(self) -> usize {
        match self {
            VoiceCount::Two => 0,
            VoiceCount::Three => 1,
            VoiceCount::Four => 2,
            VoiceCount::Five => 3,
        }
    }

    /// Voices including the echo.
    pub fn total(self) -> usize {
        self.index() + 2
    }

    /// Swept chorus voices read from the chorus delay line.
    pub fn chorus_voices(self) -> usize {
        self.index() + 1
    }

    /// LFO phase offset, in cycles, of chorus voice `voice`. Voices count
    /// from 0; the last one, `chorus_voices() - 1`, is the one heard.
    ///
    /// Two voices share one sweep. Three voices stagger by a quarter
    /// cycle; more than that spread evenly around the cycle.
    pub fn phase_offset(self, voice: usize) -> f32 {
        match self {
            VoiceCount::Two => 0.0,
            VoiceCount::Three => 0.25 * voice as f32,
            VoiceCount::Four | VoiceCount::Five => voice as f32 / self.chorus_voices() as f32,
        }
    }

    /// Phase offset of the last chorus voice.
    pub fn last_phase_offset(self) -> f32 {
        self.phase_offset(self.chorus_voices() - 1)
    }
}

/// Which modulation path is heard. At most one can be active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectSelection {
    /// The plain feedback echo.
    None,
    Flanger,
    Vibrato,
    Chorus,
}

impl EffectSelection {
    /// The LFO Frequency range of the selected effect, if it has an LFO.
    pub fn lfo_range(self) -> Option<RangeInclusive<f32>> {
        match self {
            EffectSelection::None => None,
            EffectSelection::Flanger => Some(FLANGER_LFO_RANGE_HZ),
            EffectSelection::Vibrato => Some(VIBRATO_LFO_RANGE_HZ),
            EffectSelection::Chorus => Some(CHORUS_LFO_RANGE_HZ),
        }
    }
}

/// The three LFO rates in Hz.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LfoRates {
    pub flanger: f32,
    pub vibrato: f32,
    pub chorus: f32,
}

impl LfoRates {
    /// The rate belonging to `selection`.
    pub fn get(&self, selection: EffectSelection) -> Option<f32> {
        match selection {
            EffectSelection::None => None,
            EffectSelection::Flanger => Some(self.flanger),
            EffectSelection::Vibrato => Some(self.vibrato),
            EffectSelection::Chorus => Some(self.chorus),
        }
    }
}

/// A snapshot of every control value for one block.
///
/// Times are in seconds, frequencies in Hz, everything else is a linear
/// gain or amount.
///
/// The five `*_on` flags keep the polarity of the parameter store, where
/// `true` is the resting state of a power button: the effect is bypassed.
/// Use [`selection()`](Self::selection), [`runs_dry_reverb()`](Self::runs_dry_reverb)
/// and [`runs_wet_reverb()`](Self::runs_wet_reverb) rather than reading the
/// flags directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainSettings {
    pub delay_time: f32,
    pub feedback: f32,
    pub dry_level: f32,
    pub wet_level: f32,

    pub flanger_delay: f32,
    pub flanger_width: f32,
    pub flanger_depth: f32,
    pub flanger_feedback: f32,
    pub flanger_lfo_freq: f32,

    pub vibrato_width: f32,
    pub vibrato_depth: f32,
    pub vibrato_lfo_freq: f32,

    pub chorus_delay: f32,
    pub chorus_width: f32,
    pub chorus_depth: f32,
    pub chorus_lfo_freq: f32,
    pub voices: VoiceCount,

    pub dry_reverb: f32,
    pub wet_reverb: f32,
    pub room_size: f32,
    pub damping: f32,
    pub reverb_width: f32,

    pub flanger_on: bool,
    pub vibrato_on: bool,
    pub chorus_on: bool,
    pub dry_reverb_on: bool,
    pub wet_reverb_on: bool,
}

impl ChainSettings {
    /// The active modulation path, by fixed priority: flanger, then
    /// vibrato, then chorus. A path is selected when its flag is `false`.
    pub fn selection(&self) -> EffectSelection {
        if !self.flanger_on {
            EffectSelection::Flanger
        } else if !self.vibrato_on {
            EffectSelection::Vibrato
        } else if !self.chorus_on {
            EffectSelection::Chorus
        } else {
            EffectSelection::None
        }
    }

    /// Settings with the given path selected and the other two bypassed.
    pub fn with_selection(mut self, selection: EffectSelection) -> Self {
        self.flanger_on = selection != EffectSelection::Flanger;
        self.vibrato_on = selection != EffectSelection::Vibrato;
        self.chorus_on = selection != EffectSelection::Chorus;
        self
    }

    pub fn lfo_rates(&self) -> LfoRates {
        LfoRates {
            flanger: self.flanger_lfo_freq,
            vibrato: self.vibrato_lfo_freq,
            chorus: self.chorus_lfo_freq,
        }
    }

    /// Settings with the three LFO rates replaced.
    pub fn with_lfo_rates(mut self, rates: LfoRates) -> Self {
        self.flanger_lfo_freq = rates.flanger;
        self.vibrato_lfo_freq = rates.vibrato;
        self.chorus_lfo_freq = rates.chorus;
        self
    }

    /// The dry-path reverb runs when its flag is `false`.
    pub fn runs_dry_reverb(&self) -> bool {
        !self.dry_reverb_on
    }

    /// The wet-path reverb runs when its flag is `false`.
    pub fn runs_wet_reverb(&self) -> bool {
        !self.wet_reverb_on
    }
}

impl Default for ChainSettings {
    /// The parameter store's defaults: a 500 ms echo with every
    /// modulation effect and both reverbs bypassed.
    fn default() -> Self {
        Self {
            delay_time: 0.5,
            feedback: 0.45,
            dry_level: 1.0,
            wet_level: 0.5,

            flanger_delay: 0.005,
            flanger_width: 0.010,
            flanger_depth: 1.0,
            flanger_feedback: 0.25,
            flanger_lfo_freq: 0.5,

            vibrato_width: 0.02,
            vibrato_depth: 1.0,
            vibrato_lfo_freq: 2.0,

            chorus_delay: 0.03,
            chorus_width: 0.01,
            chorus_depth: 1.0,
            chorus_lfo_freq: 0.5,
            voices: VoiceCount::Three,

            dry_reverb: 0.5,
            wet_reverb: 0.5,
            room_size: 0.25,
            damping: 0.8,
            reverb_width: 0.5,

            flanger_on: true,
            vibrato_on: true,
            chorus_on: true,
            dry_reverb_on: true,
            wet_reverb_on: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_bypass_everything() {
        let settings = ChainSettings::default();
        assert_eq!(settings.selection(), EffectSelection::None);
        assert!(!settings.runs_dry_reverb());
        assert!(!settings.runs_wet_reverb());
    }

    /// The first un-bypassed effect in flanger → vibrato → chorus order
    /// wins, whatever the others say.
    #[test]
    fn test_selection_priority() {
        let mut s = ChainSettings {
            flanger_on: false,
            vibrato_on: false,
            chorus_on: false,
            ..ChainSettings::default()
        };
        assert_eq!(s.selection(), EffectSelection::Flanger);

        s.flanger_on = true;
        assert_eq!(s.selection(), EffectSelection::Vibrato);

        s.vibrato_on = true;
        assert_eq!(s.selection(), EffectSelection::Chorus);

        s.chorus_on = true;
        assert_eq!(s.selection(), EffectSelection::None);
    }

    #[test]
    fn test_with_selection_round_trips() {
        for selection in [
            EffectSelection::None,
            EffectSelection::Flanger,
            EffectSelection::Vibrato,
            EffectSelection::Chorus,
        ] {
            let s = ChainSettings::default().with_selection(selection);
            assert_eq!(s.selection(), selection);
        }
    }

    #[test]
    fn test_reverb_flags_are_inverted() {
        let s = ChainSettings {
            dry_reverb_on: false,
            ..ChainSettings::default()
        };
        assert!(s.runs_dry_reverb());
        assert!(!s.runs_wet_reverb());
    }

    #[test]
    fn test_voice_counts() {
        assert_eq!(VoiceCount::Two.chorus_voices(), 1);
        assert_eq!(VoiceCount::Five.chorus_voices(), 4);
        assert_eq!(VoiceCount::Four.total(), 4);
    }

    #[test]
    fn test_phase_offsets() {
        assert_eq!(VoiceCount::Two.phase_offset(0), 0.0);
        assert_eq!(VoiceCount::Three.phase_offset(1), 0.25);
        assert_eq!(VoiceCount::Four.phase_offset(1), 1.0 / 3.0);
        assert_eq!(VoiceCount::Five.phase_offset(3), 0.75);
    }

    #[test]
    fn test_last_phase_offset() {
        assert_eq!(VoiceCount::Two.last_phase_offset(), 0.0);
        assert_eq!(VoiceCount::Three.last_phase_offset(), 0.25);
        assert_eq!(VoiceCount::Four.last_phase_offset(), 2.0 / 3.0);
        assert_eq!(VoiceCount::Five.last_phase_offset(), 0.75);
    }

    #[test]
    fn test_lfo_rates_follow_selection() {
        let s = ChainSettings::default();
        assert_eq!(
            s.lfo_rates(),
            LfoRates {
                flanger: 0.5,
                vibrato: 2.0,
                chorus: 0.5,
            }
        );

        let rates = LfoRates {
            flanger: 1.0,
            vibrato: 4.0,
            chorus: 0.25,
        };
        let s = s.with_lfo_rates(rates);
        assert_eq!(s.lfo_rates(), rates);
        assert_eq!(rates.get(EffectSelection::Vibrato), Some(4.0));
        assert_eq!(rates.get(EffectSelection::None), None);
        assert_eq!(EffectSelection::Flanger.lfo_range(), Some(FLANGER_LFO_RANGE_HZ));
        assert_eq!(EffectSelection::None.lfo_range(), None);
    }
}
