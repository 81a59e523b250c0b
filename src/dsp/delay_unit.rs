//! # Delay Unit
//!
//! One [`DelayLine`] plus everything needed to decide where to read from
//! it: a smoothed base delay, a smoothed modulation width and an LFO. The
//! plugin owns four of these (echo, flanger, vibrato, chorus); they differ
//! only in their maximum delay and in how the router combines their reads.

use super::delay_line::DelayLine;
use super::lfo::{Lfo, LfoRange};
use super::smoother::{ParamSmoother, DEFAULT_RAMP_SECONDS};

pub struct DelayUnit {
    line: DelayLine,
    lfo: Lfo,
    delay: ParamSmoother,
    width: ParamSmoother,

    /// Smoothed delay for the current frame, in samples.
    delay_samples: f32,
    /// Smoothed modulation width for the current frame, in samples.
    width_samples: f32,

    sample_rate: f32,
}

impl DelayUnit {
    pub fn new() -> Self {
        Self {
            line: DelayLine::new(),
            lfo: Lfo::new(),
            delay: ParamSmoother::new(),
            width: ParamSmoother::new(),
            delay_samples: 0.0,
            width_samples: 0.0,
            sample_rate: 44100.0,
        }
    }

    /// Allocate and clear the ring buffer, restart the LFO and forget the
    /// smoothed values. Not real-time safe.
    pub fn configure(&mut self, sample_rate: f32, channels: usize, max_delay_seconds: f32) {
        self.sample_rate = sample_rate;
        self.line.configure(sample_rate, channels, max_delay_seconds);
        self.lfo.configure(sample_rate);
        self.delay.reset(sample_rate, DEFAULT_RAMP_SECONDS);
        self.width.reset(sample_rate, DEFAULT_RAMP_SECONDS);
        self.delay_samples = 0.0;
        self.width_samples = 0.0;
    }

    /// Silence the history and restart the LFO and smoothers without
    /// reallocating.
    pub fn reset(&mut self) {
        self.line.clear();
        self.lfo.reset();
        self.delay.reset(self.sample_rate, DEFAULT_RAMP_SECONDS);
        self.width.reset(self.sample_rate, DEFAULT_RAMP_SECONDS);
        self.delay_samples = 0.0;
        self.width_samples = 0.0;
    }

    /// New base delay target in seconds. Called once per block.
    pub fn set_target_delay(&mut self, seconds: f32) {
        self.delay.set_target(seconds);
    }

    /// New modulation width target in seconds. Called once per block.
    pub fn set_target_width(&mut self, seconds: f32) {
        self.width.set_target(seconds);
    }

    /// Step both smoothers by one sample. Call once per frame, before any
    /// channel is read.
    #[inline]
    pub fn tick(&mut self) {
        self.delay_samples = self.delay.next_samples();
        self.width_samples = self.width.next_samples();
    }

    pub fn delay_samples(&self) -> f32 {
        self.delay_samples
    }

    pub fn width_samples(&self) -> f32 {
        self.width_samples
    }

    /// The smoothed base delay in seconds as of the last frame.
    pub fn current_delay_seconds(&self) -> f32 {
        self.delay.current()
    }

    #[inline]
    pub fn lfo(&self, range: LfoRange, phase_offset: f32) -> f32 {
        self.lfo.value(range, phase_offset)
    }

    /// Read at the smoothed base delay.
    #[inline]
    pub fn read_base(&self, channel: usize) -> f32 {
        self.line.read(channel, self.delay_samples)
    }

    /// Read at `base delay + width × lfo`, the sweep used by the flanger
    /// and by every chorus voice.
    #[inline]
    pub fn read_swept(&self, channel: usize, phase_offset: f32) -> f32 {
        let delay = self.delay_samples + self.width_samples * self.lfo(LfoRange::Wide, phase_offset);
        self.line.read(channel, delay)
    }

    /// Read at `width × lfo`: the whole delay is modulated, which bends
    /// pitch instead of adding a comb-filtered copy.
    #[inline]
    pub fn read_scaled(&self, channel: usize) -> f32 {
        let delay = self.width_samples * self.lfo(LfoRange::Narrow, 0.0);
        self.line.read(channel, delay)
    }

    #[inline]
    pub fn read(&self, channel: usize, delay_samples: f32) -> f32 {
        self.line.read(channel, delay_samples)
    }

    #[inline]
    pub fn write(&mut self, channel: usize, sample: f32) {
        self.line.write(channel, sample);
    }

    /// Move the write cursor and the LFO phase on by one sample. Call once
    /// per frame, after every channel has been read and written.
    #[inline]
    pub fn advance(&mut self, lfo_frequency_hz: f32) {
        self.line.advance();
        self.lfo.advance(lfo_frequency_hz);
    }

    pub fn lfo_phase(&self) -> f32 {
        self.lfo.phase()
    }

    pub fn capacity(&self) -> usize {
        self.line.capacity()
    }
}

impl Default for DelayUnit {
    fn default() -> Self {
        Self::new()
    }
}
