//! # Reverb (Freeverb-Style Tank)
//!
//! A classic Schroeder/Moorer reverb in the Freeverb layout:
//!
//! ```text
//!                ┌─► comb 1 ─┐
//! in × 0.015 ────┼─► comb 2 ─┼─(+)─► allpass ─► allpass ─► allpass ─► allpass ─► wet
//!                ┆    ...    ┆
//!                └─► comb 8 ─┘
//! ```
//!
//! Eight parallel feedback comb filters, each with a damping lowpass in
//! its loop, build up a dense set of decaying echoes. Four all-pass
//! filters in series then smear those echoes in time without colouring the
//! spectrum. The right channel uses the same network with every delay
//! lengthened by a small stereo spread, which decorrelates the two sides.
//!
//! The reverb processes in place and mixes its own dry signal back in, so
//! callers hand it a copy of the audio they want reverberated.

use super::filter::OnePoleFilter;
use super::smoother::ParamSmoother;

/// Comb delays in samples at 44.1 kHz.
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
/// All-pass delays in samples at 44.1 kHz.
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
/// Extra delay for every right-channel filter.
const STEREO_SPREAD: usize = 23;
const REFERENCE_SAMPLE_RATE: f32 = 44100.0;

const INPUT_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Control changes glide over this long.
const PARAMETER_RAMP_SECONDS: f32 = 0.01;

/// User-facing reverb controls, all in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbParameters {
    /// Size of the virtual room; sets the comb feedback.
    pub room_size: f32,
    /// High-frequency absorption inside the combs.
    pub damping: f32,
    /// Level of the reverberated signal.
    pub wet_level: f32,
    /// Level of the unprocessed signal mixed back in.
    pub dry_level: f32,
    /// Stereo width of the tail: 0 folds both sides together, 1 keeps them
    /// fully separate.
    pub width: f32,
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
            width: 1.0,
        }
    }
}

struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    damping: OnePoleFilter,
}

impl CombFilter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            index: 0,
            damping: OnePoleFilter::new(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.index];
        self.damping.set_coefficient(damp);
        let damped = self.damping.process(output);
        self.buffer[self.index] = input + damped * feedback;

        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.damping.reset();
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * ALLPASS_FEEDBACK;

        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        buffered - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// Stereo/mono Freeverb-style reverberator.
pub struct Reverb {
    /// `[left, right]` comb banks.
    combs: [Vec<CombFilter>; 2],
    /// `[left, right]` all-pass chains.
    allpasses: [Vec<AllpassFilter>; 2],

    parameters: ReverbParameters,
    damping: ParamSmoother,
    feedback: ParamSmoother,
    dry_gain: ParamSmoother,
    wet_gain_1: ParamSmoother,
    wet_gain_2: ParamSmoother,

    /// Set by `configure()`; the stored parameters are applied on the next
    /// process call unless new ones arrive first.
    parameters_pending: bool,
}

impl Reverb {
    /// Create an unconfigured reverb. Until
    /// [`configure()`](Self::configure) runs it has no filters and passes
    /// only the scaled dry signal.
    pub fn new() -> Self {
        Self {
            combs: [Vec::new(), Vec::new()],
            allpasses: [Vec::new(), Vec::new()],
            parameters: ReverbParameters::default(),
            damping: ParamSmoother::new(),
            feedback: ParamSmoother::new(),
            dry_gain: ParamSmoother::new(),
            wet_gain_1: ParamSmoother::new(),
            wet_gain_2: ParamSmoother::new(),
            parameters_pending: true,
        }
    }

    /// Build the filter network for `sample_rate`. Not real-time safe.
    pub fn configure(&mut self, sample_rate: f32) {
        let scale = sample_rate / REFERENCE_SAMPLE_RATE;
        let scaled = |samples: usize| ((samples as f32) * scale).round() as usize;

        for (channel, spread) in [0, STEREO_SPREAD].into_iter().enumerate() {
            self.combs[channel] = COMB_TUNINGS
                .iter()
                .map(|&t| CombFilter::new(scaled(t + spread)))
                .collect();
            self.allpasses[channel] = ALLPASS_TUNINGS
                .iter()
                .map(|&t| AllpassFilter::new(scaled(t + spread)))
                .collect();
        }

        for smoother in self.smoothers_mut() {
            smoother.reset(sample_rate, PARAMETER_RAMP_SECONDS);
        }
        self.parameters_pending = true;
    }

    /// Silence every filter. Parameter ramps are left where they are.
    pub fn reset(&mut self) {
        for bank in &mut self.combs {
            bank.iter_mut().for_each(CombFilter::clear);
        }
        for chain in &mut self.allpasses {
            chain.iter_mut().for_each(AllpassFilter::clear);
        }
    }

    pub fn parameters(&self) -> ReverbParameters {
        self.parameters
    }

    /// Start ramping towards new control values. The first call after
    /// `configure()` takes effect immediately.
    pub fn set_parameters(&mut self, parameters: ReverbParameters) {
        self.parameters_pending = false;
        let wet = parameters.wet_level * WET_SCALE;
        self.dry_gain.set_target(parameters.dry_level * DRY_SCALE);
        self.wet_gain_1.set_target(0.5 * wet * (1.0 + parameters.width));
        self.wet_gain_2.set_target(0.5 * wet * (1.0 - parameters.width));
        self.feedback
            .set_target(parameters.room_size * ROOM_SCALE + ROOM_OFFSET);
        self.damping.set_target(parameters.damping * DAMP_SCALE);
        self.parameters = parameters;
    }

    /// Reverberate a single channel in place using the left network.
    pub fn process_mono(&mut self, samples: &mut [f32]) {
        self.apply_pending_parameters();
        for sample in samples.iter_mut() {
            let input = *sample * INPUT_GAIN;
            let damp = self.damping.next();
            let feedback = self.feedback.next();

            let mut output = 0.0;
            for comb in &mut self.combs[0] {
                output += comb.process(input, damp, feedback);
            }
            for allpass in &mut self.allpasses[0] {
                output = allpass.process(output);
            }

            let dry = self.dry_gain.next();
            let wet_1 = self.wet_gain_1.next();
            self.wet_gain_2.next();

            *sample = output * wet_1 + *sample * dry;
        }
    }

    /// Reverberate a stereo pair in place. Both sides feed a shared mono
    /// input; `width` controls how much of each side's tail crosses over.
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.apply_pending_parameters();
        let [combs_left, combs_right] = &mut self.combs;
        let [allpasses_left, allpasses_right] = &mut self.allpasses;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * INPUT_GAIN;
            let damp = self.damping.next();
            let feedback = self.feedback.next();

            let mut out_left = 0.0;
            let mut out_right = 0.0;
            for comb in combs_left.iter_mut() {
                out_left += comb.process(input, damp, feedback);
            }
            for comb in combs_right.iter_mut() {
                out_right += comb.process(input, damp, feedback);
            }
            for allpass in allpasses_left.iter_mut() {
                out_left = allpass.process(out_left);
            }
            for allpass in allpasses_right.iter_mut() {
                out_right = allpass.process(out_right);
            }

            let dry = self.dry_gain.next();
            let wet_1 = self.wet_gain_1.next();
            let wet_2 = self.wet_gain_2.next();

            *l = out_left * wet_1 + out_right * wet_2 + *l * dry;
            *r = out_right * wet_1 + out_left * wet_2 + *r * dry;
        }
    }

    fn apply_pending_parameters(&mut self) {
        if self.parameters_pending {
            self.set_parameters(self.parameters);
        }
    }

    fn smoothers_mut(&mut self) -> [&mut ParamSmoother; 5] {
        [
            &mut self.damping,
            &mut self.feedback,
            &mut self.dry_gain,
            &mut self.wet_gain_1,
            &mut self.wet_gain_2,
        ]
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
