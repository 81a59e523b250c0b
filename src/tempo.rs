//! # Tap Tempo and LFO Sync
//!
//! Three momentary buttons drive the delay time from the outside:
//!
//! - **Tap**: hit it in time with the music. The average gap between the
//!   last few taps becomes the new delay time.
//! - **Tempo Up / Tempo Down**: double or halve the current delay, as long
//!   as the result still fits the Delay Time range.
//!
//! The tap window rolls: once it holds [`TAP_WINDOW`] taps, each new tap
//! pushes out the oldest one rather than starting a fresh sequence, so
//! steady tapping keeps refining the same estimate. Only a pause longer
//! than the longest delay starts over.
//!
//! Three more buttons do the same for the LFO rate of whichever
//! modulation effect is selected:
//!
//! - **LFO Sync**: set the rate from the delay time, four times faster for
//!   the vibrato. A result above the rate range is halved once.
//! - **LFO Up / LFO Down**: double or halve the rate, as long as the
//!   result still fits that effect's range.
//!
//! A plugin cannot move its own parameters from the audio thread, so each
//! result is kept here as a pending override. Each block's snapshot uses
//! the override in place of its knob until the user moves that knob
//! again, at which point the knob wins.
//!
//! Delay time and tempo are two views of the same thing: one echo per
//! beat means `bpm = 60 / seconds`.

use crate::settings::{EffectSelection, LfoRates, MAX_DELAY_TIME_SECONDS, MIN_DELAY_TIME_SECONDS};

/// Taps kept for averaging.
pub const TAP_WINDOW: usize = 4;

/// Beats per minute for a delay of `seconds`.
pub fn seconds_to_bpm(seconds: f32) -> f32 {
    60.0 / seconds
}

/// Delay in seconds for a tempo of `bpm`.
pub fn bpm_to_seconds(bpm: f32) -> f32 {
    60.0 / bpm
}

/// A fixed window of recent tap times.
///
/// A tap that arrives longer than the maximum delay after the previous
/// one cannot be part of the same beat, so it starts a new sequence.
#[derive(Clone, Debug, Default)]
pub struct TapTempo {
    taps: [f64; TAP_WINDOW],
    len: usize,
}

impl TapTempo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Taps currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Register a tap at `time_seconds` on any monotonic clock. Returns the
    /// averaged interval, clamped to the Delay Time range, once at least
    /// two taps are held.
    pub fn tap(&mut self, time_seconds: f64) -> Option<f32> {
        if let Some(&last) = self.taps[..self.len].last() {
            let gap = time_seconds - last;
            if gap <= 0.0 || gap > f64::from(MAX_DELAY_TIME_SECONDS) {
                self.len = 0;
            }
        }

        if self.len == TAP_WINDOW {
            self.taps.rotate_left(1);
            self.len -= 1;
        }
        self.taps[self.len] = time_seconds;
        self.len += 1;

        if self.len < 2 {
            return None;
        }

        // The intervals telescope: their sum is just last minus first.
        let span = self.taps[self.len - 1] - self.taps[0];
        let average = span / (self.len - 1) as f64;
        Some((average as f32).clamp(MIN_DELAY_TIME_SECONDS, MAX_DELAY_TIME_SECONDS))
    }
}

/// The momentary button states for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TempoButtons {
    pub tap: bool,
    pub tempo_up: bool,
    pub tempo_down: bool,
}

/// A value from a button press standing in for a knob.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Override {
    value: f32,
    /// The knob value when the override was set. Any other value means the
    /// knob has been moved since.
    knob: f32,
}

impl Override {
    /// The value to use given the knob position. A moved knob drops the
    /// override for good.
    fn resolve(slot: &mut Option<Override>, knob: f32) -> f32 {
        match *slot {
            Some(pending) if pending.knob == knob => pending.value,
            Some(_) => {
                *slot = None;
                knob
            }
            None => knob,
        }
    }
}

fn pressed(now: bool, before: bool) -> bool {
    now && !before
}

/// Tap tempo plus the delay-time override it produces.
///
/// Keeps its own sample clock so taps can be timed from inside
/// `process()` without asking the OS for the time.
pub struct TempoState {
    tap_tempo: TapTempo,
    previous_buttons: TempoButtons,
    pending: Option<Override>,
    elapsed_samples: u64,
    sample_rate: f32,
}

impl TempoState {
    pub fn new() -> Self {
        Self {
            tap_tempo: TapTempo::new(),
            previous_buttons: TempoButtons::default(),
            pending: None,
            elapsed_samples: 0,
            sample_rate: 44100.0,
        }
    }

    pub fn configure(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.elapsed_samples = 0;
        self.tap_tempo.clear();
    }

    /// Forget any half-finished tap sequence. A pending override survives,
    /// since it stands in for a parameter value.
    pub fn reset(&mut self) {
        self.tap_tempo.clear();
        self.previous_buttons = TempoButtons::default();
    }

    /// Seconds on the internal sample clock.
    pub fn now_seconds(&self) -> f64 {
        self.elapsed_samples as f64 / f64::from(self.sample_rate)
    }

    /// Move the internal clock on by a block.
    pub fn advance(&mut self, samples: usize) {
        self.elapsed_samples += samples as u64;
    }

    /// Use `seconds` as the delay time until the knob, currently at
    /// `knob`, is moved.
    pub fn set_delay_time_from_tap_tempo(&mut self, seconds: f32, knob: f32) {
        self.pending = Some(Override {
            value: seconds.clamp(MIN_DELAY_TIME_SECONDS, MAX_DELAY_TIME_SECONDS),
            knob,
        });
    }

    /// The overriding delay time, if there is one.
    pub fn pending_delay(&self) -> Option<f32> {
        self.pending.map(|p| p.value)
    }

    /// The delay time to use this block given the knob position.
    pub fn resolve(&mut self, knob: f32) -> f32 {
        Override::resolve(&mut self.pending, knob)
    }

    /// Register a tap at the current clock time.
    pub fn register_tap(&mut self, knob: f32) {
        if let Some(seconds) = self.tap_tempo.tap(self.now_seconds()) {
            self.set_delay_time_from_tap_tempo(seconds, knob);
        }
    }

    /// Double the delay (halve the tempo) if the result is in range.
    pub fn tempo_up(&mut self, current_delay: f32, knob: f32) {
        let doubled = current_delay * 2.0;
        if (MIN_DELAY_TIME_SECONDS..=MAX_DELAY_TIME_SECONDS).contains(&doubled) {
            self.set_delay_time_from_tap_tempo(doubled, knob);
        }
    }

    /// Halve the delay (double the tempo) if the result is in range.
    pub fn tempo_down(&mut self, current_delay: f32, knob: f32) {
        let halved = current_delay * 0.5;
        if (MIN_DELAY_TIME_SECONDS..=MAX_DELAY_TIME_SECONDS).contains(&halved) {
            self.set_delay_time_from_tap_tempo(halved, knob);
        }
    }

    /// Act on buttons that went down since the last block, then return the
    /// delay time for this block.
    pub fn update(&mut self, buttons: TempoButtons, knob: f32, current_delay: f32) -> f32 {
        let previous = self.previous_buttons;
        self.previous_buttons = buttons;

        // Drop a stale override before any press records a new one.
        let resolved = self.resolve(knob);
        let current_delay = if current_delay > 0.0 {
            current_delay
        } else {
            resolved
        };

        if pressed(buttons.tap, previous.tap) {
            self.register_tap(knob);
        }
        if pressed(buttons.tempo_up, previous.tempo_up) {
            self.tempo_up(current_delay, knob);
        }
        if pressed(buttons.tempo_down, previous.tempo_down) {
            self.tempo_down(current_delay, knob);
        }

        self.resolve(knob)
    }
}

impl Default for TempoState {
    fn default() -> Self {
        Self::new()
    }
}

/// The LFO button states for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LfoButtons {
    pub sync: bool,
    pub rate_up: bool,
    pub rate_down: bool,
}

/// The LFO rate a sync press gives `selection` for a delay of
/// `delay_time` seconds. `None` when no modulation effect is selected.
pub fn synced_lfo_rate(selection: EffectSelection, delay_time: f32) -> Option<f32> {
    let range = selection.lfo_range()?;
    let multiplier = if selection == EffectSelection::Vibrato {
        4.0
    } else {
        1.0
    };

    let mut rate = delay_time * multiplier;
    if rate > *range.end() {
        rate *= 0.5;
    }
    Some(rate.clamp(*range.start(), *range.end()))
}

/// LFO rate overrides for the three modulation effects.
///
/// The buttons only ever act on the selected effect, but each effect
/// keeps its own override so switching effects does not lose one.
#[derive(Clone, Debug, Default)]
pub struct LfoRateState {
    previous_buttons: LfoButtons,
    flanger: Option<Override>,
    vibrato: Option<Override>,
    chorus: Option<Override>,
}

impl LfoRateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the button history. Pending overrides survive, since they
    /// stand in for parameter values.
    pub fn reset(&mut self) {
        self.previous_buttons = LfoButtons::default();
    }

    fn slot_mut(&mut self, selection: EffectSelection) -> Option<&mut Option<Override>> {
        match selection {
            EffectSelection::None => None,
            EffectSelection::Flanger => Some(&mut self.flanger),
            EffectSelection::Vibrato => Some(&mut self.vibrato),
            EffectSelection::Chorus => Some(&mut self.chorus),
        }
    }

    /// The overriding rate for `selection`, if there is one.
    pub fn pending_rate(&self, selection: EffectSelection) -> Option<f32> {
        let slot = match selection {
            EffectSelection::None => None,
            EffectSelection::Flanger => self.flanger,
            EffectSelection::Vibrato => self.vibrato,
            EffectSelection::Chorus => self.chorus,
        };
        slot.map(|p| p.value)
    }

    /// Use `rate` for `selection` until its knob, currently at `knob`, is
    /// moved.
    pub fn set_rate(&mut self, selection: EffectSelection, rate: f32, knob: f32) {
        if let Some(slot) = self.slot_mut(selection) {
            *slot = Some(Override { value: rate, knob });
        }
    }

    /// The rates to use this block given the knob positions.
    pub fn resolve(&mut self, knobs: LfoRates) -> LfoRates {
        LfoRates {
            flanger: Override::resolve(&mut self.flanger, knobs.flanger),
            vibrato: Override::resolve(&mut self.vibrato, knobs.vibrato),
            chorus: Override::resolve(&mut self.chorus, knobs.chorus),
        }
    }

    /// Set the selected effect's rate from the delay time.
    pub fn sync(&mut self, selection: EffectSelection, delay_time: f32, knobs: LfoRates) {
        if let (Some(rate), Some(knob)) = (
            synced_lfo_rate(selection, delay_time),
            knobs.get(selection),
        ) {
            self.set_rate(selection, rate, knob);
        }
    }

    /// Double the selected effect's rate if the result is in range.
    pub fn rate_up(&mut self, selection: EffectSelection, current: LfoRates, knobs: LfoRates) {
        self.scale_rate(selection, 2.0, current, knobs);
    }

    /// Halve the selected effect's rate if the result is in range.
    pub fn rate_down(&mut self, selection: EffectSelection, current: LfoRates, knobs: LfoRates) {
        self.scale_rate(selection, 0.5, current, knobs);
    }

    fn scale_rate(
        &mut self,
        selection: EffectSelection,
        factor: f32,
        current: LfoRates,
        knobs: LfoRates,
    ) {
        let (Some(range), Some(rate), Some(knob)) = (
            selection.lfo_range(),
            current.get(selection),
            knobs.get(selection),
        ) else {
            return;
        };

        let scaled = rate * factor;
        if range.contains(&scaled) {
            self.set_rate(selection, scaled, knob);
        }
    }

    /// Act on buttons that went down since the last block, then return the
    /// LFO rates for this block.
    pub fn update(
        &mut self,
        buttons: LfoButtons,
        selection: EffectSelection,
        knobs: LfoRates,
        delay_time: f32,
    ) -> LfoRates {
        let previous = self.previous_buttons;
        self.previous_buttons = buttons;

        let current = self.resolve(knobs);

        if pressed(buttons.sync, previous.sync) {
            self.sync(selection, delay_time, knobs);
        }
        if pressed(buttons.rate_up, previous.rate_up) {
            self.rate_up(selection, current, knobs);
        }
        if pressed(buttons.rate_down, previous.rate_down) {
            self.rate_down(selection, current, knobs);
        }

        self.resolve(knobs)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
