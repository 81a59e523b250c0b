//! # Effect Router
//!
//! Every frame, each of the four delay units is read once per channel.
//! The router turns those reads ("taps") into two things:
//!
//! 1. **Writes**: what goes back into each unit's ring buffer. These do
//!    not depend on which effect is selected, so every unit keeps
//!    running, and a path that is switched in picks up where its history
//!    left off.
//! 2. **The effect output**: the combination of taps that is actually
//!    heard, chosen by the active [`EffectSelection`].
//!
//! ```text
//!                    ┌──────────────────────────────┐
//! input ──(+)──► [ base delay ] ──┬── base ─────────┼──► plain
//!          ▲                      │                 │
//!          └─── × feedback ───────┤                 │
//!                                 ├─► [ flanger ] ──┼──► base + depth × flanger
//!                                 │     ▲    │      │
//!                                 │     └─ × fb ◄───┘
//!                                 ├─► [ vibrato ] ─────► depth × vibrato
//!                                 └─► [ chorus  ] ─────► base + depth × last voice
//! ```
//!
//! The base unit always runs first in a frame: every modulation unit is
//! written with the base output of the *same* frame.
//!
//! ## Switching paths
//!
//! Flipping from one path to another between blocks would jump straight
//! from one mix of taps to a completely different one. Instead the router
//! remembers the outgoing path and cross-fades it into the incoming one
//! over [`SELECTION_FADE_SECONDS`].

use nih_plug::prelude::*;

use crate::settings::{ChainSettings, EffectSelection, VoiceCount};

/// How long a change of the selected path takes to fade in.
pub const SELECTION_FADE_SECONDS: f32 = 0.005;

/// One channel's reads from every delay unit for the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Taps {
    /// Base echo at the smoothed delay time.
    pub base: f32,
    /// Flanger at `delay + width × lfo`.
    pub flanger: f32,
    /// Vibrato at `width × lfo`.
    pub vibrato: f32,
    /// The last chorus voice at `delay + width × lfo(offset)`. Earlier
    /// voices only differ in phase and are never heard, so they are not
    /// read.
    pub chorus: f32,
}

/// What each delay unit is fed this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Writes {
    pub base: f32,
    pub flanger: f32,
    pub vibrato: f32,
    pub chorus: f32,
}

/// Compute the ring-buffer writes for one channel.
///
/// The base line is the feedback comb every path rides on. The flanger
/// recirculates its own output on top of the base echo; vibrato and
/// chorus are fed the base echo straight.
#[inline]
pub fn feedback_writes(input: f32, taps: &Taps, settings: &ChainSettings) -> Writes {
    Writes {
        base: input + taps.base * settings.feedback,
        flanger: taps.base + taps.flanger * settings.flanger_feedback,
        vibrato: taps.base,
        chorus: taps.base,
    }
}

/// The effect output of one path for one channel, before the dry/wet mix.
#[inline]
pub fn path_output(
    selection: EffectSelection,
    taps: &Taps,
    settings: &ChainSettings,
    channel: usize,
) -> f32 {
    match selection {
        EffectSelection::None => taps.base,
        EffectSelection::Flanger => taps.base + settings.flanger_depth * taps.flanger,
        // The vibrato replaces the echo rather than adding to it.
        EffectSelection::Vibrato => settings.vibrato_depth * taps.vibrato,
        EffectSelection::Chorus => chorus_output(taps, settings, channel),
    }
}

/// Two voices hard-pan the echo left and the single chorus voice right.
/// With more voices every channel hears the echo plus the last voice.
#[inline]
fn chorus_output(taps: &Taps, settings: &ChainSettings, channel: usize) -> f32 {
    let depth = settings.chorus_depth;

    match (settings.voices, channel) {
        (VoiceCount::Two, 0) => taps.base,
        (VoiceCount::Two, _) => depth * taps.chorus,
        _ => taps.base + depth * taps.chorus,
    }
}

/// Tracks the selected path across blocks and fades between paths.
pub struct EffectRouter {
    current: EffectSelection,
    previous: EffectSelection,

    /// Frames left in the running cross-fade. Zero when settled.
    fade_remaining: usize,
    fade_length: usize,

    /// `false` until the first block after a reset has set the selection.
    primed: bool,
}

impl EffectRouter {
    pub fn new() -> Self {
        Self {
            current: EffectSelection::None,
            previous: EffectSelection::None,
            fade_remaining: 0,
            fade_length: 1,
            primed: false,
        }
    }

    /// Size the cross-fade for `sample_rate` and forget the selection.
    pub fn configure(&mut self, sample_rate: f32) {
        self.fade_length = ((SELECTION_FADE_SECONDS * sample_rate).round() as usize).max(1);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.current = EffectSelection::None;
        self.previous = EffectSelection::None;
        self.fade_remaining = 0;
        self.primed = false;
    }

    /// The path that is (or is fading) in.
    pub fn selection(&self) -> EffectSelection {
        self.current
    }

    pub fn is_fading(&self) -> bool {
        self.fade_remaining > 0
    }

    /// Take the selection for the next block. A change starts a fade,
    /// except on the first block after a reset.
    pub fn begin_block(&mut self, selection: EffectSelection) {
        if !self.primed {
            self.current = selection;
            self.previous = selection;
            self.primed = true;
            return;
        }

        if selection != self.current {
            self.previous = self.current;
            self.current = selection;
            self.fade_remaining = self.fade_length;
        }
    }

    /// The effect output for one channel of the current frame.
    #[inline]
    pub fn mix(&self, taps: &Taps, settings: &ChainSettings, channel: usize) -> f32 {
        let incoming = path_output(self.current, taps, settings, channel);
        if self.fade_remaining == 0 {
            return incoming;
        }

        nih_debug_assert!(self.fade_remaining <= self.fade_length);
        let outgoing_gain = self.fade_remaining as f32 / self.fade_length as f32;
        let outgoing = path_output(self.previous, taps, settings, channel);
        outgoing * outgoing_gain + incoming * (1.0 - outgoing_gain)
    }

    /// Step the cross-fade. Call once per frame, after every channel.
    #[inline]
    pub fn advance_frame(&mut self) {
        self.fade_remaining = self.fade_remaining.saturating_sub(1);
    }
}

impl Default for EffectRouter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
