//! # Low-Frequency Oscillator
//!
//! The modulation effects all work by sweeping a delay time up and down a
//! few times per second. The sweep comes from a slow sine wave, biased so
//! it never goes negative:
//!
//! ```text
//! lfo = 0.5 + amplitude * sin(2π * (phase + phase_offset))
//! ```
//!
//! The result multiplies a delay (or width) measured in samples, so it has
//! to stay strictly positive. The wide setting swings between 0.25 and
//! 0.75; the narrow setting (vibrato) only between 0.4 and 0.6, because a
//! vibrato sweeps the whole delay rather than adding to a fixed one.
//!
//! Phase is kept in cycles (`0.0..1.0`) rather than radians so that chorus
//! voices can be staggered by simple fractions of a cycle.

use std::f32::consts::TAU;

/// How far the LFO swings around its 0.5 centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LfoRange {
    /// ±0.25, used by the flanger and the chorus.
    Wide,
    /// ±0.10, used by the vibrato.
    Narrow,
}

impl LfoRange {
    pub fn amplitude(self) -> f32 {
        match self {
            LfoRange::Wide => 0.25,
            LfoRange::Narrow => 0.10,
        }
    }
}

/// A phase accumulator with a biased sine output.
pub struct Lfo {
    /// Current phase in cycles, always in `0.0..1.0`.
    phase: f32,
    inverse_sample_rate: f32,
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            inverse_sample_rate: 1.0 / 44100.0,
        }
    }

    /// Set the sample rate and restart the phase at zero.
    pub fn configure(&mut self, sample_rate: f32) {
        self.inverse_sample_rate = 1.0 / sample_rate;
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// The oscillator output at the current phase, shifted by
    /// `phase_offset` cycles.
    #[inline]
    pub fn value(&self, range: LfoRange, phase_offset: f32) -> f32 {
        0.5 + range.amplitude() * (TAU * (self.phase + phase_offset)).sin()
    }

    /// Move the phase forward by one sample at `frequency_hz`.
    #[inline]
    pub fn advance(&mut self, frequency_hz: f32) {
        self.phase += frequency_hz * self.inverse_sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}
