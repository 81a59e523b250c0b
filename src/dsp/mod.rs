//! # DSP (Digital Signal Processing) Primitives
//!
//! The building blocks the effect chain is assembled from:
//!
//! - **`delay_line`**: A multi-channel ring buffer with cubic fractional
//!   reads. Every effect in the plugin is a delay line read at a
//!   different position.
//!
//! - **`lfo`**: A slow, biased sine used to sweep delay times.
//!
//! - **`smoother`**: Linear ramps that keep control changes click-free.
//!
//! - **`delay_unit`**: A delay line bundled with its smoothed delay/width
//!   and its LFO; one per effect.
//!
//! - **`filter`**: A one-pole lowpass, used as the damping stage inside
//!   the reverb's comb filters.
//!
//! - **`reverb`**: A Freeverb-style comb/all-pass reverberator.

pub mod delay_line;
pub mod delay_unit;
pub mod filter;
pub mod lfo;
pub mod reverb;
pub mod smoother;
