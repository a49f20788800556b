// Voice - One triggered drum hit
//
// A voice is the instantiation of an `InstrumentPatch` at a start time. Each
// branch renders `sum(sources) -> filters -> gain curve` and is wrapped by the
// FX chain on its own. The voice is finished once its last branch has ended;
// nothing is ever reused or retriggered.

use super::automation::ParamCurve;
use super::effect::{FxChain, Signal};
use super::filter::BiquadFilter;
use super::instruments::{BranchSpec, Instrument, InstrumentPatch, SourceSpec};
use super::noise::{NoiseBuffer, NoiseSource};
use super::oscillator::SweptOscillator;
use std::sync::Arc;

enum Source {
    Noise(NoiseSource),
    Oscillator(SweptOscillator),
}

impl Source {
    #[inline]
    fn next_sample(&mut self, time: f64) -> f32 {
        match self {
            // Only pulled inside the branch window, so reads start at `start`
            Source::Noise(noise) => noise.next_sample(),
            Source::Oscillator(osc) => osc.next_sample(time),
        }
    }
}

/// Sources into a filter series into a gain stage, sounding in `[start, stop)`
pub struct VoiceBranch {
    sources: Vec<Source>,
    filters: Vec<BiquadFilter>,
    gain: ParamCurve,
    start: f64,
    stop: f64,
}

impl VoiceBranch {
    pub fn new(spec: &BranchSpec, t0: f64, noise: &Arc<NoiseBuffer>, sample_rate: f32) -> Self {
        let stop = t0 + spec.stop_after;
        let sources = spec
            .sources
            .iter()
            .map(|source| match *source {
                SourceSpec::Noise => Source::Noise(NoiseSource::new(Arc::clone(noise))),
                SourceSpec::Oscillator {
                    waveform,
                    frequency,
                } => Source::Oscillator(SweptOscillator::new(
                    waveform,
                    frequency.curve(t0),
                    t0,
                    stop,
                    sample_rate,
                )),
            })
            .collect();

        let filters = spec
            .filters
            .iter()
            .map(|f| BiquadFilter::with_cutoff_curve(f.params, f.cutoff.curve(t0), sample_rate))
            .collect();

        Self {
            sources,
            filters,
            gain: spec.gain.curve(t0),
            start: t0,
            stop,
        }
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }
}

impl Signal for VoiceBranch {
    #[inline]
    fn next_sample(&mut self, time: f64) -> f32 {
        if time < self.start || time >= self.stop {
            return 0.0;
        }

        let mut sample: f32 = self.sources.iter_mut().map(|s| s.next_sample(time)).sum();
        for filter in &mut self.filters {
            sample = filter.process_at(sample, time);
        }
        sample * self.gain.value_at(time)
    }

    fn end_time(&self) -> f64 {
        self.stop
    }
}

/// A fully wired, one-shot drum hit
pub struct Voice {
    instrument: Instrument,
    start: f64,
    end: f64,
    branches: Vec<Box<dyn Signal>>,
}

impl Voice {
    /// Instantiate `patch` at `t0`, routing every branch through `fx`
    pub fn from_patch(
        patch: &InstrumentPatch,
        t0: f64,
        noise: &Arc<NoiseBuffer>,
        fx: &FxChain,
        fx_enabled: bool,
        sample_rate: f32,
    ) -> Self {
        let branches: Vec<Box<dyn Signal>> = patch
            .branches
            .iter()
            .map(|spec| {
                let branch: Box<dyn Signal> =
                    Box::new(VoiceBranch::new(spec, t0, noise, sample_rate));
                fx.apply_fx(branch, t0, fx_enabled)
            })
            .collect();

        let end = branches.iter().map(|b| b.end_time()).fold(t0, f64::max);

        Self {
            instrument: patch.instrument,
            start: t0,
            end,
            branches,
        }
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn start_time(&self) -> f64 {
        self.start
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.end
    }
}

impl Signal for Voice {
    #[inline]
    fn next_sample(&mut self, time: f64) -> f32 {
        self.branches.iter_mut().map(|b| b.next_sample(time)).sum()
    }

    fn end_time(&self) -> f64 {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::effect::FxParams;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SAMPLE_RATE: f32 = 48000.0;

    fn noise() -> Arc<NoiseBuffer> {
        let mut rng = StdRng::seed_from_u64(7);
        Arc::new(NoiseBuffer::with_rng(SAMPLE_RATE, 1.0, &mut rng))
    }

    fn render(voice: &mut Voice, from: f64, seconds: f64) -> Vec<f32> {
        let dt = 1.0 / SAMPLE_RATE as f64;
        let frames = (seconds * SAMPLE_RATE as f64) as usize;
        (0..frames)
            .map(|i| voice.next_sample(from + i as f64 * dt))
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_every_instrument_sounds() {
        let fx = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let noise = noise();
        for instrument in Instrument::ALL {
            let mut voice =
                Voice::from_patch(&instrument.patch(), 0.0, &noise, &fx, false, SAMPLE_RATE);
            let out = render(&mut voice, 0.0, 0.1);
            assert!(rms(&out) > 1e-3, "{} is silent", instrument);
            assert!(out.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn test_silent_before_start_and_after_stop() {
        let fx = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let mut voice = Voice::from_patch(
            &Instrument::Kick.patch(),
            0.5,
            &noise(),
            &fx,
            false,
            SAMPLE_RATE,
        );
        let before = render(&mut voice, 0.0, 0.4);
        assert!(before.iter().all(|&s| s == 0.0));

        assert!((voice.end_time() - 0.75).abs() < 1e-9);
        let after = render(&mut voice, 0.75, 0.1);
        assert!(after.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_fx_extends_lifetime() {
        let fx = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let noise = noise();
        let dry = Voice::from_patch(&Instrument::Tom.patch(), 2.0, &noise, &fx, false, SAMPLE_RATE);
        let wet = Voice::from_patch(&Instrument::Tom.patch(), 2.0, &noise, &fx, true, SAMPLE_RATE);

        assert!((dry.end_time() - 2.32).abs() < 1e-9);
        assert!((wet.end_time() - 3.32).abs() < 1e-9);
        assert!(!wet.is_finished(3.0));
        assert!(wet.is_finished(3.32));
    }

    #[test]
    fn test_snare_branches_get_their_own_fx() {
        let fx = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let voice = Voice::from_patch(&Instrument::Snare.patch(), 0.0, &noise(), &fx, true, SAMPLE_RATE);
        assert_eq!(voice.branch_count(), 2);
        assert_eq!(voice.instrument(), Instrument::Snare);
        // Both branches carry the 1 s delay tail
        assert!((voice.end_time() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_kick_decays() {
        let fx = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let mut voice = Voice::from_patch(&Instrument::Kick.patch(), 0.0, &noise(), &fx, false, SAMPLE_RATE);
        let out = render(&mut voice, 0.0, 0.25);
        let head = rms(&out[..2400]);
        let tail = rms(&out[9600..]);
        assert!(head > tail * 4.0, "head {} tail {}", head, tail);
    }
}
