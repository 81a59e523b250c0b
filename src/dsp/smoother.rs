//! # Parameter Smoother
//!
//! When a user moves a knob, the parameter value jumps instantly. For a
//! delay-time control that means the read head teleports to a different
//! spot on the tape, which is heard as a click. The smoother turns each
//! jump into a short linear ramp, long enough to hide the step and short
//! enough that the control still feels immediate.
//!
//! The ramp itself is nih-plug's [`Smoother`] with
//! [`SmoothingStyle::Linear`]; this wrapper adds the bits the engine
//! needs on top: a ramp length given in seconds at prepare time, a first
//! target that is adopted directly (there is no earlier value to glide
//! from), and conversion of time values to samples.

use nih_plug::prelude::*;

/// Ramp length used for every delay-time and width control.
pub const DEFAULT_RAMP_SECONDS: f32 = 1e-3;

/// A linearly ramped control value.
pub struct ParamSmoother {
    smoother: Smoother<f32>,
    sample_rate: f32,
    target: f32,
    current: f32,

    /// `false` until the first target after a reset has been adopted.
    primed: bool,
}

impl ParamSmoother {
    /// Create a smoother with the default 1 ms ramp at 44.1 kHz. Call
    /// [`reset()`](Self::reset) with the real sample rate before use.
    pub fn new() -> Self {
        Self {
            smoother: Smoother::new(SmoothingStyle::Linear(DEFAULT_RAMP_SECONDS * 1000.0)),
            sample_rate: 44100.0,
            target: 0.0,
            current: 0.0,
            primed: false,
        }
    }

    /// Configure the ramp length and forget the current value. The next
    /// [`set_target()`](Self::set_target) jumps straight to its value.
    pub fn reset(&mut self, sample_rate: f32, ramp_seconds: f32) {
        self.smoother = Smoother::new(SmoothingStyle::Linear(ramp_seconds.max(0.0) * 1000.0));
        self.sample_rate = sample_rate;
        self.target = 0.0;
        self.current = 0.0;
        self.smoother.reset(0.0);
        self.primed = false;
    }

    /// Start a ramp from the current value towards `value`.
    pub fn set_target(&mut self, value: f32) {
        self.target = value;
        if self.primed {
            self.smoother.set_target(self.sample_rate, value);
        } else {
            self.smoother.reset(value);
            self.current = value;
            self.primed = true;
        }
    }

    /// Step the ramp by one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.current = self.smoother.next();
        self.current
    }

    /// Step the ramp by one sample and return the new value converted from
    /// seconds to samples.
    #[inline]
    pub fn next_samples(&mut self) -> f32 {
        self.next() * self.sample_rate
    }

    /// The most recent value returned by [`next()`](Self::next), or the
    /// adopted first target.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// The value the ramp is heading towards.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// `true` while the ramp has not yet reached its target.
    pub fn is_smoothing(&self) -> bool {
        self.smoother.is_smoothing()
    }
}

impl Default for ParamSmoother {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
