//! # One-Pole Lowpass (Damping) Filter
//!
//! The reverb's comb filters each run their feedback through a one-pole
//! lowpass. Every trip around a comb loses a little more top end, so the
//! tail gets darker as it decays, which is what real rooms do: soft
//! surfaces absorb high frequencies faster than low ones.
//!
//! ## The Filter Equation
//!
//! ```text
//! y[n] = (1 - a) * x[n] + a * y[n-1]
//! ```
//!
//! - `a = 0.0` → output = input (no damping, bright tail)
//! - `a → 1.0` → output barely follows the input (heavy damping)
//!
//! The reverb drives `a` directly from its (smoothed) damping control
//! instead of from a cutoff frequency, so the coefficient is set per
//! sample alongside the input.

/// A one-pole (6 dB/octave) lowpass filter.
pub struct OnePoleFilter {
    /// Feedback coefficient `a`, in `0.0..=1.0`.
    coefficient: f32,

    /// The previous output sample, the filter's only state.
    prev_output: f32,
}

impl OnePoleFilter {
    /// Create a passthrough filter (`a = 0`).
    pub fn new() -> Self {
        Self {
            coefficient: 0.0,
            prev_output: 0.0,
        }
    }

    /// Set the damping coefficient directly. Values are clamped to
    /// `0.0..=1.0`, outside of which the filter would amplify or ring.
    #[inline]
    pub fn set_coefficient(&mut self, coefficient: f32) {
        self.coefficient = coefficient.clamp(0.0, 1.0);
    }

    /// Process one sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = (1.0 - self.coefficient) * input + self.coefficient * self.prev_output;
        self.prev_output = output;
        output
    }

    /// Reset the filter state to zero.
    pub fn reset(&mut self) {
        self.prev_output = 0.0;
    }
}

impl Default for OnePoleFilter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
