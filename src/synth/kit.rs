// Kit - Voice factory for the eight instruments
//
// Patches, the shared noise buffer and the FX chain are built once when the
// audio context is created. Triggering only instantiates a voice.

use super::effect::{FxChain, FxParams};
use super::instruments::{Instrument, InstrumentPatch};
use super::noise::NoiseBuffer;
use super::voice::Voice;
use std::collections::HashMap;
use std::sync::Arc;

pub struct DrumKit {
    patches: HashMap<Instrument, InstrumentPatch>,
    noise: Arc<NoiseBuffer>,
    fx: FxChain,
    sample_rate: f32,
}

impl DrumKit {
    pub fn new(sample_rate: f32, noise_seconds: f32, fx_params: FxParams) -> Self {
        Self::with_noise(
            Arc::new(NoiseBuffer::new(sample_rate, noise_seconds)),
            fx_params,
        )
    }

    /// Build the kit around an existing noise buffer
    pub fn with_noise(noise: Arc<NoiseBuffer>, fx_params: FxParams) -> Self {
        let sample_rate = noise.sample_rate();
        let patches = Instrument::ALL
            .into_iter()
            .map(|instrument| (instrument, instrument.patch()))
            .collect();

        Self {
            patches,
            noise,
            fx: FxChain::new(fx_params, sample_rate),
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn noise(&self) -> &Arc<NoiseBuffer> {
        &self.noise
    }

    pub fn fx(&self) -> &FxChain {
        &self.fx
    }

    pub fn patch(&self, instrument: Instrument) -> Option<&InstrumentPatch> {
        self.patches.get(&instrument)
    }

    /// Build a voice for `instrument` starting at `t0`
    pub fn voice(&self, instrument: Instrument, t0: f64, fx_enabled: bool) -> Option<Voice> {
        let patch = self.patches.get(&instrument)?;
        Some(Voice::from_patch(
            patch,
            t0,
            &self.noise,
            &self.fx,
            fx_enabled,
            self.sample_rate,
        ))
    }
}
