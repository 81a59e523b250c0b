//! # Effect Chain
//!
//! The whole engine: four delay units, the router that decides what is
//! heard, and the two reverbs. The plugin shell owns one of these, calls
//! [`prepare()`](EffectChain::prepare) whenever the audio configuration
//! changes, and hands every block to [`process()`](EffectChain::process)
//! together with a [`ChainSettings`] snapshot.
//!
//! ## Signal Flow
//!
//! ```text
//!         ┌──────────────────────────────► dry scratch ──► [dry reverb]? ──┐
//!         │                                                                │
//! Input ──┼──► base ─┬─► flanger ─┐                                        ▼
//!         │          ├─► vibrato ─┼─► router ──► wet scratch ──► [wet reverb]? ─► dry × D + wet × W
//!         │          └─► chorus ──┘      │
//!         │                              ▼
//!         └──────────── × D ────────(+)◄─ × W ───────────────────────────► Output
//!                                         (when neither reverb runs)
//! ```
//!
//! ## Per-Frame Order
//!
//! 1. Step every unit's smoothers.
//! 2. For each channel: read every unit, mix the selected path, write
//!    every unit, stash the dry input and the effect output.
//! 3. Advance every unit's write cursor and LFO.
//!
//! After the frame loop the reverbs run over the stashed copies and, if
//! either one ran, a final pass overwrites the live buffer with the
//! reverberated dry/wet mix.

use nih_plug::prelude::*;

use crate::dsp::delay_unit::DelayUnit;
use crate::dsp::reverb::{Reverb, ReverbParameters};
use crate::router::{feedback_writes, EffectRouter, Taps};
use crate::settings::{ChainSettings, MAX_DELAY_TIME_SECONDS};

/// Longest base echo, matching the top of the Delay Time range.
pub const BASE_MAX_DELAY_SECONDS: f32 = MAX_DELAY_TIME_SECONDS;
/// Flanger delay plus its widest sweep.
pub const FLANGER_MAX_DELAY_SECONDS: f32 = 0.04;
/// Widest vibrato sweep.
pub const VIBRATO_MAX_DELAY_SECONDS: f32 = 0.04;
/// Chorus delay plus its widest sweep.
pub const CHORUS_MAX_DELAY_SECONDS: f32 = 0.08;

/// The reverbs are fed a fixed dry level of 0.5, which the tank scales
/// to unity.
const REVERB_DRY_LEVEL: f32 = 0.5;

/// Added to the reported tail while either reverb runs. Long enough for
/// the largest room to fall below -60 dB.
const REVERB_TAIL_SECONDS: f32 = 2.0;

pub struct EffectChain {
    base: DelayUnit,
    flanger: DelayUnit,
    vibrato: DelayUnit,
    chorus: DelayUnit,
    router: EffectRouter,

    dry_reverb: Reverb,
    wet_reverb: Reverb,

    /// Per channel, the input of each frame in the current sub-block.
    dry_scratch: Vec<Vec<f32>>,
    /// Per channel, the effect output of each frame in the current
    /// sub-block.
    wet_scratch: Vec<Vec<f32>>,

    sample_rate: f32,
    channels: usize,
    max_block_size: usize,
    prepared: bool,
}

impl EffectChain {
    /// Create an engine that owns no channels. Nothing is allocated until
    /// [`prepare()`](Self::prepare).
    pub fn new() -> Self {
        Self {
            base: DelayUnit::new(),
            flanger: DelayUnit::new(),
            vibrato: DelayUnit::new(),
            chorus: DelayUnit::new(),
            router: EffectRouter::new(),
            dry_reverb: Reverb::new(),
            wet_reverb: Reverb::new(),
            dry_scratch: Vec::new(),
            wet_scratch: Vec::new(),
            sample_rate: 44100.0,
            channels: 0,
            max_block_size: 0,
            prepared: false,
        }
    }

    /// Allocate every buffer for `channels` channels at `sample_rate`, with
    /// scratch space for blocks of up to `max_block_size` frames, and
    /// clear all state. Not real-time safe.
    pub fn prepare(&mut self, sample_rate: f32, channels: usize, max_block_size: usize) {
        let max_block_size = max_block_size.max(1);

        self.base
            .configure(sample_rate, channels, BASE_MAX_DELAY_SECONDS);
        self.flanger
            .configure(sample_rate, channels, FLANGER_MAX_DELAY_SECONDS);
        self.vibrato
            .configure(sample_rate, channels, VIBRATO_MAX_DELAY_SECONDS);
        self.chorus
            .configure(sample_rate, channels, CHORUS_MAX_DELAY_SECONDS);
        self.router.configure(sample_rate);
        self.dry_reverb.configure(sample_rate);
        self.wet_reverb.configure(sample_rate);

        self.dry_scratch = vec![vec![0.0; max_block_size]; channels];
        self.wet_scratch = vec![vec![0.0; max_block_size]; channels];

        self.sample_rate = sample_rate;
        self.channels = channels;
        self.max_block_size = max_block_size;
        self.prepared = true;

        nih_log!(
            "Prepared effect chain: {sample_rate} Hz, {channels} channel(s), blocks of up to \
             {max_block_size} samples"
        );
    }

    /// Silence every delay line and reverb, restart the LFOs and let the
    /// next block's settings take effect without ramping.
    pub fn reset(&mut self) {
        for unit in self.units_mut() {
            unit.reset();
        }
        self.router.reset();
        self.dry_reverb.reset();
        self.wet_reverb.reset();
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The smoothed base delay time in seconds, as used by the last
    /// processed frame. This is what tap tempo and the tempo up/down
    /// buttons start from.
    pub fn current_base_delay_seconds(&self) -> f32 {
        self.base.current_delay_seconds()
    }

    /// How many samples of output remain after the input goes silent:
    /// enough echoes for the feedback loop to fall to -60 dB, plus the
    /// reverb tail when a reverb is running.
    pub fn tail_samples(&self, settings: &ChainSettings) -> u32 {
        let delay_samples = settings.delay_time * self.sample_rate;

        // Solving feedback^N = 0.001 (-60 dB) for the number of repeats.
        let mut tail = if settings.feedback > 0.001 {
            let repeats = -3.0 / settings.feedback.log10();
            repeats * delay_samples
        } else {
            delay_samples
        };

        if settings.runs_dry_reverb() || settings.runs_wet_reverb() {
            tail += REVERB_TAIL_SECONDS * self.sample_rate;
        }

        tail as u32
    }

    /// Process one block in place. `buffer` holds one slice per channel,
    /// all the same length.
    ///
    /// Channels beyond the prepared channel count are silenced. Blocks
    /// longer than the prepared maximum are processed in pieces.
    pub fn process(&mut self, buffer: &mut [&mut [f32]], settings: &ChainSettings) {
        nih_debug_assert!(
            self.prepared,
            "EffectChain::process() called before prepare()"
        );

        let channels = buffer.len().min(self.channels);
        for extra in buffer.iter_mut().skip(channels) {
            extra.fill(0.0);
        }

        let num_samples = buffer.first().map_or(0, |channel| channel.len());
        if channels == 0 || num_samples == 0 {
            return;
        }

        self.begin_block(settings);

        let mut start = 0;
        while start < num_samples {
            let len = (num_samples - start).min(self.max_block_size);
            self.process_sub_block(buffer, channels, start, len, settings);
            start += len;
        }
    }

    /// Push the block's settings into every smoother, the router and the
    /// reverbs.
    fn begin_block(&mut self, settings: &ChainSettings) {
        self.base.set_target_delay(settings.delay_time);

        self.flanger.set_target_delay(settings.flanger_delay);
        self.flanger.set_target_width(settings.flanger_width);

        self.vibrato.set_target_width(settings.vibrato_width);

        self.chorus.set_target_delay(settings.chorus_delay);
        self.chorus.set_target_width(settings.chorus_width);

        self.router.begin_block(settings.selection());

        let reverb = |wet_level| ReverbParameters {
            room_size: settings.room_size,
            damping: settings.damping,
            wet_level,
            dry_level: REVERB_DRY_LEVEL,
            width: settings.reverb_width,
        };
        self.dry_reverb.set_parameters(reverb(settings.dry_reverb));
        self.wet_reverb.set_parameters(reverb(settings.wet_reverb));
    }

    fn process_sub_block(
        &mut self,
        buffer: &mut [&mut [f32]],
        channels: usize,
        start: usize,
        len: usize,
        settings: &ChainSettings,
    ) {
        let runs_dry_reverb = settings.runs_dry_reverb();
        let runs_wet_reverb = settings.runs_wet_reverb();

        for frame in 0..len {
            for unit in self.units_mut() {
                unit.tick();
            }

            for channel in 0..channels {
                let input = buffer[channel][start + frame];
                let taps = self.read_taps(channel, settings);
                let output = self.router.mix(&taps, settings, channel);

                let writes = feedback_writes(input, &taps, settings);
                self.base.write(channel, writes.base);
                self.flanger.write(channel, writes.flanger);
                self.vibrato.write(channel, writes.vibrato);
                self.chorus.write(channel, writes.chorus);

                self.dry_scratch[channel][frame] = input;
                self.wet_scratch[channel][frame] = output;

                if !runs_wet_reverb {
                    buffer[channel][start + frame] =
                        input * settings.dry_level + output * settings.wet_level;
                }
            }

            self.base.advance(0.0);
            self.flanger.advance(settings.flanger_lfo_freq);
            self.vibrato.advance(settings.vibrato_lfo_freq);
            self.chorus.advance(settings.chorus_lfo_freq);
            self.router.advance_frame();
        }

        if !(runs_dry_reverb || runs_wet_reverb) {
            return;
        }

        if runs_dry_reverb {
            reverberate(&mut self.dry_reverb, &mut self.dry_scratch[..channels], len);
        }
        if runs_wet_reverb {
            reverberate(&mut self.wet_reverb, &mut self.wet_scratch[..channels], len);
        }

        for channel in 0..channels {
            let dry = &self.dry_scratch[channel][..len];
            let wet = &self.wet_scratch[channel][..len];
            let live = &mut buffer[channel][start..start + len];
            for ((out, &d), &w) in live.iter_mut().zip(dry).zip(wet) {
                *out = d * settings.dry_level + w * settings.wet_level;
            }
        }
    }

    /// Read every unit for `channel` at the current frame.
    #[inline]
    fn read_taps(&self, channel: usize, settings: &ChainSettings) -> Taps {
        Taps {
            base: self.base.read_base(channel),
            flanger: self.flanger.read_swept(channel, 0.0),
            vibrato: self.vibrato.read_scaled(channel),
            chorus: self
                .chorus
                .read_swept(channel, settings.voices.last_phase_offset()),
        }
    }

    /// Base first: every modulation unit is fed the base output of the
    /// same frame.
    fn units_mut(&mut self) -> [&mut DelayUnit; 4] {
        [
            &mut self.base,
            &mut self.flanger,
            &mut self.vibrato,
            &mut self.chorus,
        ]
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `reverb` in place over the first `len` frames of each channel.
fn reverberate(reverb: &mut Reverb, scratch: &mut [Vec<f32>], len: usize) {
    match scratch {
        [] => {}
        [mono] => reverb.process_mono(&mut mono[..len]),
        [left, right, ..] => reverb.process_stereo(&mut left[..len], &mut right[..len]),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{EffectSelection, VoiceCount};

    /// Plain echo, no feedback, unity dry and wet, everything bypassed.
    fn plain(delay_time: f32, feedback: f32) -> ChainSettings {
        ChainSettings {
            delay_time,
            feedback,
            dry_level: 1.0,
            wet_level: 1.0,
            ..ChainSettings::default()
        }
    }

    fn prepared(sample_rate: f32, channels: usize, max_block_size: usize) -> EffectChain {
        let mut chain = EffectChain::new();
        chain.prepare(sample_rate, channels, max_block_size);
        chain
    }

    /// Run `channels` in blocks of `block_size` with fixed settings.
    fn run(
        chain: &mut EffectChain,
        channels: &mut [Vec<f32>],
        block_size: usize,
        settings: &ChainSettings,
    ) {
        let len = channels[0].len();
        let mut start = 0;
        while start < len {
            let end = (start + block_size).min(len);
            let mut slices: Vec<&mut [f32]> =
                channels.iter_mut().map(|c| &mut c[start..end]).collect();
            chain.process(&mut slices, settings);
            start = end;
        }
    }

    fn impulse(len: usize) -> Vec<f32> {
        let mut buf = vec![0.0; len];
        buf[0] = 1.0;
        buf
    }

    /// A deterministic, broadband test signal.
    fn test_signal(len: usize, seed: f32) -> Vec<f32> {
        (0..len)
            .map(|n| {
                let t = n as f32;
                0.4 * (t * 0.031 + seed).sin() + 0.2 * (t * 0.173 + seed * 2.0).sin()
            })
            .collect()
    }

    /// One echo exactly one delay period after the impulse, nothing in
    /// between.
    #[test]
    fn test_single_echo_without_feedback() {
        let mut chain = prepared(44100.0, 1, 512);
        let mut channels = vec![impulse(22100)];
        run(&mut chain, &mut channels, 512, &plain(0.5, 0.0));

        let out = &channels[0];
        assert_eq!(out[0], 1.0, "Dry impulse should pass at unity");
        for (n, &s) in out.iter().enumerate().take(22050).skip(1) {
            assert_eq!(s, 0.0, "Expected silence at sample {n}");
        }
        assert!((out[22050] - 1.0).abs() < 1e-6, "Echo was {}", out[22050]);
        assert!(out[22051..].iter().all(|&s| s == 0.0));
    }

    /// Each repeat is the previous one times the feedback.
    #[test]
    fn test_feedback_echoes_decay_geometrically() {
        let mut chain = prepared(44100.0, 1, 1024);
        let mut channels = vec![impulse(4 * 44100 + 1)];
        let settings = ChainSettings {
            dry_level: 0.0,
            ..plain(1.0, 0.5)
        };
        run(&mut chain, &mut channels, 1024, &settings);

        let out = &channels[0];
        for (k, expected) in [1.0, 0.5, 0.25, 0.125].into_iter().enumerate() {
            let tap = out[(k + 1) * 44100];
            assert!(
                (tap - expected).abs() < 1e-6,
                "Echo {k} should be {expected}, got {tap}"
            );
        }
        assert!(out[44101..88200].iter().all(|s| s.abs() < 1e-6));
    }

    /// Two voices: the left channel is exactly the plain echo, the right
    /// channel is the chorus voice scaled by depth.
    #[test]
    fn test_two_voice_chorus_hard_pans() {
        let len = 8192;
        let input = || vec![test_signal(len, 0.0), test_signal(len, 1.3)];
        let base = ChainSettings {
            dry_level: 0.0,
            voices: VoiceCount::Two,
            ..plain(0.05, 0.3)
        };
        let chorus = |depth| {
            ChainSettings {
                chorus_depth: depth,
                ..base
            }
            .with_selection(EffectSelection::Chorus)
        };

        let mut reference = input();
        run(&mut prepared(48000.0, 2, 256), &mut reference, 256, &base);

        let mut full = input();
        run(&mut prepared(48000.0, 2, 256), &mut full, 256, &chorus(1.0));

        let mut half = input();
        run(&mut prepared(48000.0, 2, 256), &mut half, 256, &chorus(0.5));

        assert_eq!(full[0], reference[0]);
        assert_eq!(half[0], reference[0]);
        for (h, f) in half[1].iter().zip(full[1].iter()) {
            assert!((h - 0.5 * f).abs() < 1e-7);
        }
        assert!(full[1].iter().any(|s| s.abs() > 1e-3));
    }

    /// The first flanger tap lands `delay + width × lfo` after the echo.
    /// A zero LFO rate holds the sweep at its 0.5 centre, so at 1024 Hz the
    /// 16-sample delay plus half the 32-sample width puts it 32 samples
    /// after the 128-sample echo. The flanger's own feedback repeats it.
    #[test]
    fn test_flanger_impulse_lands_after_echo() {
        let settings = ChainSettings {
            dry_level: 0.0,
            flanger_delay: 0.015625,
            flanger_width: 0.03125,
            flanger_depth: 0.5,
            flanger_feedback: 0.5,
            flanger_lfo_freq: 0.0,
            ..plain(0.125, 0.0)
        }
        .with_selection(EffectSelection::Flanger);
        let mut channels = vec![impulse(512)];
        run(&mut prepared(1024.0, 1, 64), &mut channels, 64, &settings);

        let out = &channels[0];
        assert_eq!(out[128], 1.0, "Echo");
        assert_eq!(out[160], 0.5, "First flanger tap");
        assert_eq!(out[192], 0.25, "Flanger feedback repeat");
        for (n, &s) in out.iter().enumerate() {
            if ![128, 160, 192, 224, 256, 288].contains(&n) {
                assert!(s.abs() < 0.02, "Unexpected output {s} at sample {n}");
            }
        }
    }

    /// The vibrato replaces the echo: nothing at the plain echo time, then
    /// the impulse `width × 0.5` later, scaled by depth.
    #[test]
    fn test_vibrato_impulse_replaces_echo() {
        let settings = ChainSettings {
            dry_level: 0.0,
            vibrato_width: 0.0625,
            vibrato_depth: 0.5,
            vibrato_lfo_freq: 0.0,
            ..plain(0.125, 0.0)
        }
        .with_selection(EffectSelection::Vibrato);
        let mut channels = vec![impulse(512)];
        run(&mut prepared(1024.0, 1, 64), &mut channels, 64, &settings);

        let out = &channels[0];
        assert_eq!(out[128], 0.0);
        assert_eq!(out[160], 0.5);
    }

    /// With three or more voices both channels hear the echo plus the
    /// last voice. Three voices put it a quarter cycle in (lfo 0.75, so
    /// 64 + 48 samples); five voices put it three quarters in (lfo 0.25,
    /// so 64 + 16 samples).
    #[test]
    fn test_multi_voice_chorus_impulse_uses_last_voice() {
        for (voices, offset) in [(VoiceCount::Three, 112), (VoiceCount::Five, 80)] {
            let settings = ChainSettings {
                dry_level: 0.0,
                chorus_delay: 0.0625,
                chorus_width: 0.0625,
                chorus_depth: 0.5,
                chorus_lfo_freq: 0.0,
                voices,
                ..plain(0.125, 0.0)
            }
            .with_selection(EffectSelection::Chorus);
            let mut channels = vec![impulse(512), impulse(512)];
            run(&mut prepared(1024.0, 2, 64), &mut channels, 64, &settings);

            for (ch, out) in channels.iter().enumerate() {
                assert!((out[128] - 1.0).abs() < 1e-4, "{voices:?} ch{ch} echo");

                let (peak, value) = out
                    .iter()
                    .enumerate()
                    .skip(129)
                    .fold((0, 0.0_f32), |best, (n, &s)| {
                        if s.abs() > best.1.abs() {
                            (n, s)
                        } else {
                            best
                        }
                    });
                assert_eq!(peak, 128 + offset, "{voices:?} ch{ch}");
                assert!((value - 0.5).abs() < 1e-3, "{voices:?} ch{ch}: {value}");
            }
        }
    }

    /// With no depth the flanger and chorus paths are the plain echo. The
    /// vibrato replaces the echo, so at zero depth only the dry signal is
    /// left.
    #[test]
    fn test_zero_depth_collapses_to_plain() {
        let len = 4096;
        let base = ChainSettings {
            flanger_depth: 0.0,
            vibrato_depth: 0.0,
            chorus_depth: 0.0,
            voices: VoiceCount::Four,
            ..plain(0.02, 0.4)
        };

        let mut reference = vec![test_signal(len, 0.0), test_signal(len, 0.7)];
        run(&mut prepared(44100.0, 2, 512), &mut reference, 512, &base);

        for selection in [EffectSelection::Flanger, EffectSelection::Chorus] {
            let mut channels = vec![test_signal(len, 0.0), test_signal(len, 0.7)];
            let settings = base.with_selection(selection);
            run(&mut prepared(44100.0, 2, 512), &mut channels, 512, &settings);

            for (ch, (a, b)) in channels.iter().zip(reference.iter()).enumerate() {
                for (n, (x, y)) in a.iter().zip(b.iter()).enumerate() {
                    assert!(
                        (x - y).abs() < 1e-6,
                        "{selection:?} ch{ch} sample {n}: {x} vs {y}"
                    );
                }
            }
        }

        let input = vec![test_signal(len, 0.0), test_signal(len, 0.7)];
        let mut channels = input.clone();
        let settings = base.with_selection(EffectSelection::Vibrato);
        run(&mut prepared(44100.0, 2, 512), &mut channels, 512, &settings);
        assert_eq!(channels, input);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let selections = [
            EffectSelection::None,
            EffectSelection::Flanger,
            EffectSelection::Vibrato,
            EffectSelection::Chorus,
        ];
        for selection in selections {
            for reverbs_run in [false, true] {
                let settings = ChainSettings {
                    dry_reverb_on: !reverbs_run,
                    wet_reverb_on: !reverbs_run,
                    ..ChainSettings::default().with_selection(selection)
                };
                let mut chain = prepared(48000.0, 2, 256);
                let mut channels = vec![vec![0.0; 2048]; 2];
                run(&mut chain, &mut channels, 256, &settings);

                assert!(
                    channels.iter().flatten().all(|&s| s == 0.0),
                    "{selection:?}, reverbs {reverbs_run}"
                );
            }
        }
    }

    /// Host block size must not change the result, including blocks longer
    /// than the prepared maximum.
    #[test]
    fn test_block_size_independence() {
        let len = 6000;
        let settings = ChainSettings {
            dry_reverb_on: false,
            wet_reverb_on: false,
            ..ChainSettings::default().with_selection(EffectSelection::Chorus)
        };

        let mut whole = vec![test_signal(len, 0.0), test_signal(len, 2.0)];
        run(&mut prepared(44100.0, 2, 1024), &mut whole, len, &settings);

        let mut small = vec![test_signal(len, 0.0), test_signal(len, 2.0)];
        run(&mut prepared(44100.0, 2, 1024), &mut small, 100, &settings);

        for (a, b) in whole.iter().flatten().zip(small.iter().flatten()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    /// Cycling through every path block by block never produces a jump
    /// much bigger than the signal's own sample-to-sample movement.
    #[test]
    fn test_selection_switch_is_continuous() {
        let sample_rate = 48000.0;
        let block = 256;
        let sine = |n: usize| {
            0.5 * (std::f32::consts::TAU * 220.0 * n as f32 / sample_rate).sin()
        };
        let base = ChainSettings {
            dry_level: 0.0,
            voices: VoiceCount::Three,
            ..plain(0.01, 0.3)
        };

        let mut chain = prepared(sample_rate, 1, block);
        let mut n = 0;
        let mut previous = 0.0_f32;
        let mut max_jump = 0.0_f32;
        let order = [
            EffectSelection::None,
            EffectSelection::Flanger,
            EffectSelection::Vibrato,
            EffectSelection::Chorus,
            EffectSelection::Vibrato,
            EffectSelection::None,
            EffectSelection::Chorus,
            EffectSelection::Flanger,
        ];

        // Warm up so every delay line is full of signal.
        let warm_up_blocks = 200;
        for i in 0..warm_up_blocks + 40 {
            let selection = if i < warm_up_blocks {
                EffectSelection::None
            } else {
                order[i % order.len()]
            };
            let settings = base.with_selection(selection);

            let mut samples: Vec<f32> = (n..n + block).map(sine).collect();
            n += block;
            chain.process(&mut [samples.as_mut_slice()], &settings);

            for &s in &samples {
                assert!(s.is_finite());
                if i >= warm_up_blocks {
                    max_jump = max_jump.max((s - previous).abs());
                }
                previous = s;
            }
        }

        assert!(max_jump < 0.12, "Largest sample-to-sample jump was {max_jump}");
    }

    #[test]
    fn test_extra_channels_are_silenced() {
        let mut chain = prepared(44100.0, 1, 64);
        let mut channels = vec![test_signal(64, 0.0), vec![1.0; 64]];
        run(&mut chain, &mut channels, 64, &plain(0.5, 0.0));

        assert!(channels[1].iter().all(|&s| s == 0.0));
        assert_eq!(channels[0], test_signal(64, 0.0));
    }

    /// Without a prepare there are no channels to own, so everything is
    /// silenced rather than touched.
    #[test]
    fn test_unprepared_chain_outputs_silence() {
        let mut chain = EffectChain::new();
        let mut channels = vec![vec![0.5; 32]; 2];
        run(&mut chain, &mut channels, 32, &ChainSettings::default());

        assert!(!chain.is_prepared());
        assert!(channels.iter().flatten().all(|&s| s == 0.0));
    }

    /// Turning the wet reverb on adds a tail after the echo.
    #[test]
    fn test_wet_reverb_adds_tail() {
        let len = 8192;
        let dry_settings = ChainSettings {
            dry_level: 0.0,
            ..plain(0.1, 0.0)
        };
        let reverb_settings = ChainSettings {
            wet_reverb_on: false,
            wet_reverb: 0.8,
            ..dry_settings
        };

        let mut dry = vec![impulse(len); 2];
        run(&mut prepared(44100.0, 2, 512), &mut dry, 512, &dry_settings);
        let mut wet = vec![impulse(len); 2];
        run(&mut prepared(44100.0, 2, 512), &mut wet, 512, &reverb_settings);

        // The plain echo is a single sample at 4410.
        assert!(dry[0][4411..].iter().all(|&s| s == 0.0));
        let tail: f32 = wet[0][4411..].iter().map(|s| s * s).sum();
        assert!(tail > 1e-6, "Expected a reverb tail, energy {tail}");
        assert!(wet.iter().flatten().all(|s| s.is_finite()));
    }

    /// The dry reverb alone still mixes the echo back in after it runs.
    #[test]
    fn test_dry_reverb_keeps_echo() {
        let len = 8192;
        let settings = ChainSettings {
            dry_reverb_on: false,
            dry_reverb: 0.0,
            ..plain(0.1, 0.0)
        };
        let mut channels = vec![impulse(len)];
        run(&mut prepared(44100.0, 1, 512), &mut channels, 512, &settings);

        // With zero reverb wet level the tank is a unity passthrough.
        assert!((channels[0][0] - 1.0).abs() < 1e-6);
        assert!((channels[0][4410] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut chain = prepared(44100.0, 1, 512);
        let settings = ChainSettings {
            dry_level: 0.0,
            ..plain(0.01, 0.5)
        };
        let mut channels = vec![test_signal(2048, 0.0)];
        run(&mut chain, &mut channels, 512, &settings);

        chain.reset();
        let mut silence = vec![vec![0.0; 2048]];
        run(&mut chain, &mut silence, 512, &settings);
        assert!(silence[0].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_current_base_delay_follows_settings() {
        let mut chain = prepared(44100.0, 1, 64);
        let mut channels = vec![vec![0.0; 64]];
        run(&mut chain, &mut channels, 64, &plain(0.75, 0.0));

        assert_eq!(chain.current_base_delay_seconds(), 0.75);
    }

    #[test]
    fn test_tail_length() {
        let chain = prepared(1000.0, 1, 64);

        // No feedback: one delay period.
        assert_eq!(chain.tail_samples(&plain(0.5, 0.0)), 500);

        // 0.1 feedback reaches -60 dB after 3 repeats.
        let tail = chain.tail_samples(&plain(0.5, 0.1));
        assert!((1499..=1500).contains(&tail), "tail {tail}");

        let with_reverb = ChainSettings {
            wet_reverb_on: false,
            ..plain(0.5, 0.0)
        };
        assert_eq!(chain.tail_samples(&with_reverb), 2500);
    }
}
