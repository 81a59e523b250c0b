//! # Loveless Mod Delay: An AU/VST3/CLAP Modulated Delay Plugin
//!
//! A feedback delay with three modulation effects riding on the echo
//! (flanger, vibrato and a multi-voice chorus) and two reverbs, one on
//! the untouched input and one on the effect output. Built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug); outputs Audio Unit
//! (AUv2), VST3 and CLAP from a single codebase.
//!
//! ## Signal Flow
//!
//! ```text
//!                ┌────────────────────────────────────────── dry ──► [Dry Reverb]? ──┐
//!                │                                                                   │
//! Input ──┬──►(+)──► [Base Delay] ──┬──► [Flanger] ─┐                                │
//!         │    ▲                    ├──► [Vibrato] ─┼──► router ──► [Wet Reverb]? ──(mix)──► Output
//!         │    └──── × feedback ────┤               │
//!         │                         └──► [Chorus] ──┘
//! ```
//!
//! At most one of flanger, vibrato and chorus is heard at a time. All four
//! delay units run on every sample anyway, so switching between effects
//! never starts from an empty buffer.
//!
//! ## Crate Layout
//!
//! - [`dsp`]: delay line, LFO, smoother, delay unit and reverb primitives.
//! - [`settings`]: the per-block [`ChainSettings`](settings::ChainSettings)
//!   snapshot.
//! - [`router`]: which delay-unit reads are heard, and what gets written
//!   back.
//! - [`chain`]: the [`EffectChain`](chain::EffectChain) engine tying it all
//!   together.
//! - [`tempo`]: tap tempo, tempo up/down and LFO rate sync.

pub mod chain;
pub mod dsp;
mod params;
pub mod router;
pub mod settings;
pub mod tempo;

use std::num::NonZeroU32;
use std::sync::Arc;

use chain::EffectChain;
use nih_plug::prelude::*;
use params::PluginParams;
use tempo::{LfoRateState, TempoState};

/// The main plugin struct.
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and can
/// be read from any thread. Everything else here is owned by the audio
/// thread and only touched in `initialize()`, `reset()` and `process()`.
struct LovelessModDelay {
    params: Arc<PluginParams>,

    /// The audio engine. Allocated in `initialize()`.
    chain: EffectChain,

    /// Tap tempo state and the delay-time override it produces.
    tempo: TempoState,

    /// LFO rate overrides from the LFO Sync, Up and Down buttons.
    lfo_rates: LfoRateState,
}

impl Default for LovelessModDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            chain: EffectChain::new(),
            tempo: TempoState::new(),
            lfo_rates: LfoRateState::new(),
        }
    }
}

impl Plugin for LovelessModDelay {
    const NAME: &'static str = "Loveless Mod Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, since most DAW tracks are stereo; mono as a fallback.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Automation splits the block, and every piece gets its own snapshot.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is first loaded, or when the sample rate,
    /// channel count or maximum block size changes. All allocation happens
    /// here.
    ///
    /// Returning `false` tells the host this configuration can't be used.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let Some(num_channels) = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
        else {
            nih_log!("Rejecting audio layout without main input channels");
            return false;
        };

        self.chain.prepare(
            buffer_config.sample_rate,
            num_channels,
            buffer_config.max_buffer_size as usize,
        );
        self.tempo.configure(buffer_config.sample_rate);

        true
    }

    /// Called when playback stops or the plugin is bypassed. Clears every
    /// echo and reverb tail so stale audio doesn't bleed into the next
    /// playback.
    fn reset(&mut self) {
        self.chain.reset();
        self.tempo.reset();
        self.lfo_rates.reset();
    }

    /// Process one block:
    ///
    /// 1. Act on the tempo buttons and decide the delay time.
    /// 2. Take one snapshot of every parameter.
    /// 3. Act on the LFO buttons for the selected effect and fold the
    ///    resulting rates into the snapshot.
    /// 4. Run the engine over the buffer in place.
    /// 5. Report how long the tail rings on.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let num_samples = buffer.samples();

        let delay_time = self.tempo.update(
            self.params.tempo_buttons(),
            self.params.delay_time.value(),
            self.chain.current_base_delay_seconds(),
        );
        let snapshot = self.params.snapshot(delay_time);
        let lfo_rates = self.lfo_rates.update(
            self.params.lfo_buttons(),
            snapshot.selection(),
            snapshot.lfo_rates(),
            delay_time,
        );
        let settings = snapshot.with_lfo_rates(lfo_rates);

        self.chain.process(buffer.as_slice(), &settings);
        self.tempo.advance(num_samples);

        ProcessStatus::Tail(self.chain.tail_samples(&settings))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessModDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-mod-delay-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A feedback delay with flanger, vibrato, chorus and reverb");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
        ClapFeature::Chorus,
        ClapFeature::Flanger,
        ClapFeature::Reverb,
    ];
}

impl Vst3Plugin for LovelessModDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssModDelayv01";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Modulation,
        Vst3SubCategory::Reverb,
    ];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper re-exports the CLAP entry point as AUv2 so Logic Pro
// (Audio Units only) can load it.

nih_export_clap!(LovelessModDelay);
nih_export_vst3!(LovelessModDelay);

clap_wrapper::export_auv2!();
