// Effect - Signal trait and the studio FX insert
//
// Voices are pull-based: the master bus asks every live Signal for the sample
// at an absolute time, once per output frame, with time increasing.
//
// The FX insert wraps a signal as:
//
//   input -> compressor -+-> dry gain ----------------+-> output
//                        |                            |
//                        +-> delay (feedback) -> wet -+
//
// The compressor is upstream of both paths so it shapes the signal once.
// With FX disabled the input is returned as-is; no insert is built.

use super::compressor::{Compressor, CompressorParams};
use super::delay::{DelayLine, DelayParams};

/// A mono sample stream addressed by absolute time (seconds)
pub trait Signal: Send {
    /// Render the sample at `time`
    ///
    /// Callers advance `time` by one sample period per call.
    fn next_sample(&mut self, time: f64) -> f32;

    /// Time after which the signal is permanently silent
    fn end_time(&self) -> f64;
}

/// FX insert parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxParams {
    pub compressor: CompressorParams,
    pub delay: DelayParams,
    /// Size of the delay buffer
    pub max_delay_ms: f32,
    pub dry_gain: f32,
    pub wet_gain: f32,
    /// How long the insert keeps rendering after its input ends (delay tail)
    pub tail_seconds: f64,
}

impl Default for FxParams {
    fn default() -> Self {
        Self {
            compressor: CompressorParams::new(-22.0, 24.0, 3.2, 0.003, 0.18),
            delay: DelayParams::new(110.0, 0.18),
            max_delay_ms: 250.0,
            dry_gain: 0.90,
            wet_gain: 0.18,
            tail_seconds: 1.0,
        }
    }
}

/// Compressor + ambience delay around one signal
pub struct FxInsert {
    input: Box<dyn Signal>,
    compressor: Compressor,
    delay: DelayLine,
    dry_gain: f32,
    wet_gain: f32,
    start: f64,
    end: f64,
}

impl FxInsert {
    pub fn new(input: Box<dyn Signal>, start: f64, params: &FxParams, sample_rate: f32) -> Self {
        let end = input.end_time() + params.tail_seconds.max(0.0);
        Self {
            input,
            compressor: Compressor::new(params.compressor, sample_rate),
            delay: DelayLine::new(params.delay, sample_rate, params.max_delay_ms),
            dry_gain: params.dry_gain,
            wet_gain: params.wet_gain,
            start,
            end,
        }
    }
}

impl Signal for FxInsert {
    #[inline]
    fn next_sample(&mut self, time: f64) -> f32 {
        let input = self.input.next_sample(time);
        if time < self.start {
            return input;
        }

        let shaped = self.compressor.process(input);
        let wet = self.delay.process(shaped);
        shaped * self.dry_gain + wet * self.wet_gain
    }

    fn end_time(&self) -> f64 {
        self.end
    }
}

/// The studio FX stage shared by every instrument
#[derive(Debug, Clone, Copy)]
pub struct FxChain {
    params: FxParams,
    sample_rate: f32,
}

impl FxChain {
    pub fn new(params: FxParams, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate,
        }
    }

    pub fn params(&self) -> &FxParams {
        &self.params
    }

    /// Route `signal` through the FX insert starting at `t`
    ///
    /// Returns `signal` itself, unwrapped, when `enabled` is false.
    pub fn apply_fx(&self, signal: Box<dyn Signal>, t: f64, enabled: bool) -> Box<dyn Signal> {
        if !enabled {
            return signal;
        }
        Box::new(FxInsert::new(signal, t, &self.params, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Single-sample impulse at a given time
    struct Impulse {
        at: f64,
        fired: bool,
    }

    impl Signal for Impulse {
        fn next_sample(&mut self, time: f64) -> f32 {
            if !self.fired && time >= self.at {
                self.fired = true;
                1.0
            } else {
                0.0
            }
        }

        fn end_time(&self) -> f64 {
            self.at
        }
    }

    fn impulse(at: f64) -> Box<dyn Signal> {
        Box::new(Impulse { at, fired: false })
    }

    fn data_ptr(signal: &dyn Signal) -> *const () {
        (signal as *const dyn Signal).cast::<()>()
    }

    #[test]
    fn test_disabled_is_identity() {
        let chain = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let signal = impulse(0.0);
        let before = data_ptr(signal.as_ref());

        let output = chain.apply_fx(signal, 0.0, false);
        assert_eq!(data_ptr(output.as_ref()), before);
        assert_eq!(output.end_time(), 0.0);
    }

    #[test]
    fn test_enabled_wraps_signal() {
        let chain = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let signal = impulse(0.0);
        let before = data_ptr(signal.as_ref());

        let output = chain.apply_fx(signal, 0.0, true);
        assert_ne!(data_ptr(output.as_ref()), before);
        // Delay tail extends the lifetime
        assert!((output.end_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dry_and_echo_levels() {
        // Compressor neutralised so the routing gains are visible
        let params = FxParams {
            compressor: CompressorParams::new(0.0, 0.0, 1.0, 0.0, 0.0),
            ..FxParams::default()
        };
        let chain = FxChain::new(params, SAMPLE_RATE);
        let mut output = chain.apply_fx(impulse(0.0), 0.0, true);

        let dt = 1.0 / SAMPLE_RATE as f64;
        let rendered: Vec<f32> = (0..12000).map(|i| output.next_sample(i as f64 * dt)).collect();

        let delay_samples = (0.110 * SAMPLE_RATE).round() as usize;
        assert!((rendered[0] - 0.90).abs() < 1e-5);
        assert!((rendered[delay_samples] - 0.18).abs() < 1e-5);
        assert!((rendered[2 * delay_samples] - 0.18 * 0.18).abs() < 1e-5);
        assert_eq!(rendered[1], 0.0);
    }

    #[test]
    fn test_silent_before_start() {
        let chain = FxChain::new(FxParams::default(), SAMPLE_RATE);
        let mut output = chain.apply_fx(impulse(0.5), 0.5, true);
        assert_eq!(output.next_sample(0.0), 0.0);
        assert_eq!(output.next_sample(0.25), 0.0);
    }
}
