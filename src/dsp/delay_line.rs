//! # Delay Line (Multi-Channel Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. Every effect in this plugin (the echo itself, the
//! flanger, the vibrato and the chorus) is one of these with a different
//! read position.
//!
//! ## How a Ring Buffer Works
//!
//! Imagine a circular tape loop. A "write head" records incoming audio
//! onto the tape, and a "read head" plays it back from a position further
//! behind on the tape. The distance between the two heads determines the
//! delay time.
//!
//! Each channel gets its own stretch of tape, but all channels share one
//! write head. Within a sample frame every channel is read and written at
//! the same cursor, and only then does the cursor move on:
//!
//! 1. Read the delayed sample from `(write_pos - delay_in_samples)`,
//!    wrapping around to the end of the buffer if we go past the start.
//! 2. Write the new sample at `write_pos`.
//! 3. After every channel is done, advance `write_pos` by 1.
//!
//! ## Cubic Interpolation
//!
//! Modulated delays (flanger, vibrato, chorus) sweep the read head
//! continuously, so it almost never lands on a whole sample. Linear
//! interpolation between two neighbours is audibly dull at these sweep
//! rates; instead we fit a cubic through four neighbours:
//!
//! ```text
//!   s0        s1   x   s2        s3
//!   |---------|----^---|---------|
//!  i-1        i   i+f  i+1      i+2
//! ```
//!
//! The Catmull-Rom coefficients used here pass exactly through `s1` when
//! the fraction is zero, so an integer delay reads the stored sample back
//! with no error at all.

/// A ring buffer holding one stretch of sample history per channel.
///
/// The buffer is sized once in [`configure()`](Self::configure), which
/// runs outside the audio thread. Reading, writing and advancing never
/// allocate.
pub struct DelayLine {
    /// Sample history, channel-major: channel `c` owns
    /// `buffer[c * capacity..(c + 1) * capacity]`.
    buffer: Vec<f32>,

    /// Number of channels stored in `buffer`.
    channels: usize,

    /// Samples of history per channel. Always at least 1.
    capacity: usize,

    /// Current write position, shared by all channels. Always in
    /// `0..capacity`.
    write_pos: usize,
}

impl DelayLine {
    /// Create an empty, unconfigured delay line.
    ///
    /// Reads return silence and writes are ignored until
    /// [`configure()`](Self::configure) has been called.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            channels: 0,
            capacity: 1,
            write_pos: 0,
        }
    }

    /// Size the buffer for `max_delay_seconds` of history per channel and
    /// clear it.
    ///
    /// Capacity is `ceil(max_delay_seconds * sample_rate) + 1` samples,
    /// clamped to at least one sample. The extra sample lets a read at the
    /// full maximum delay land on the oldest sample rather than on the
    /// write cursor.
    pub fn configure(&mut self, sample_rate: f32, channels: usize, max_delay_seconds: f32) {
        let max_delay_samples = (max_delay_seconds.max(0.0) * sample_rate).ceil() as usize;
        self.capacity = (max_delay_samples + 1).max(1);
        self.channels = channels;
        self.buffer.clear();
        self.buffer.resize(self.capacity * channels, 0.0);
        self.write_pos = 0;
    }

    /// Samples of history per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of channels this delay line was configured for.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Current write position.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Write a sample at the current write position of `channel`.
    ///
    /// **Important:** This does NOT advance the write position. Call
    /// [`advance()`](Self::advance) once per frame, after every channel
    /// has been read and written.
    #[inline]
    pub fn write(&mut self, channel: usize, sample: f32) {
        if channel < self.channels {
            self.buffer[channel * self.capacity + self.write_pos] = sample;
        }
    }

    /// Read `delay_samples` behind the write head of `channel` using cubic
    /// interpolation.
    ///
    /// # How the index math works
    ///
    /// ```text
    /// read_pos = (write_pos - delay + capacity) mod capacity
    /// ```
    ///
    /// `read_pos` is generally fractional. Its integer part picks `s1`,
    /// the fraction says how far to move towards `s2`. All four neighbour
    /// indices wrap modulo the capacity, so no read can leave the buffer.
    ///
    /// The delay is deliberately clamped to `0..=capacity - 1` first. The
    /// modulo alone would keep the index in bounds, but a delay longer than
    /// the buffer would wrap around and play back audio from just behind
    /// the write head. Clamped, it reads the oldest sample instead.
    ///
    /// When the integer read position coincides with the write cursor the
    /// slot has not been written for this frame yet, so we return silence
    /// instead of a stale sample from one full buffer length ago.
    #[inline]
    pub fn read(&self, channel: usize, delay_samples: f32) -> f32 {
        if channel >= self.channels {
            return 0.0;
        }

        let capacity = self.capacity as f32;
        let delay = delay_samples.clamp(0.0, capacity - 1.0);
        let read_pos = (self.write_pos as f32 - delay + capacity).rem_euclid(capacity);

        // `rem_euclid` can round up to exactly `capacity` for a tiny
        // negative remainder, so the integer index wraps once more.
        let index = read_pos.floor() as usize % self.capacity;
        if index == self.write_pos {
            return 0.0;
        }

        let fraction = read_pos - read_pos.floor();
        let data = &self.buffer[channel * self.capacity..(channel + 1) * self.capacity];
        cubic_interpolate(
            data[(index + self.capacity - 1) % self.capacity],
            data[index],
            data[(index + 1) % self.capacity],
            data[(index + 2) % self.capacity],
            fraction,
        )
    }

    /// Advance the shared write position by one sample.
    #[inline]
    pub fn advance(&mut self) {
        self.write_pos += 1;
        if self.write_pos >= self.capacity {
            self.write_pos -= self.capacity;
        }
    }

    /// Clear the entire buffer to silence and reset the write position.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Four-point Catmull-Rom interpolation between `s1` (fraction 0) and `s2`
/// (fraction 1), using `s0` and `s3` to shape the curve.
#[inline]
pub fn cubic_interpolate(s0: f32, s1: f32, s2: f32, s3: f32, fraction: f32) -> f32 {
    let fraction_sq = fraction * fraction;
    let fraction_cube = fraction_sq * fraction;

    let a0 = -0.5 * s0 + 1.5 * s1 - 1.5 * s2 + 0.5 * s3;
    let a1 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
    let a2 = -0.5 * s0 + 0.5 * s2;
    let a3 = s1;

    a0 * fraction_cube + a1 * fraction_sq + a2 * fraction + a3
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
