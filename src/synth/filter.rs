// Filter - Biquad (RBJ cookbook)
//
// 2-pole IIR filter with low-pass, high-pass and band-pass responses.
//
// References:
// - Robert Bristow-Johnson, "Cookbook formulae for audio EQ biquad filter
//   coefficients"
//
// Characteristics:
// - 12dB/octave slope (2-pole)
// - Stable up to Nyquist, unlike the Chamberlin state variable form
// - Cutoff can follow an automation curve (recomputed only while it moves)
// - Low-pass/high-pass Q is a resonance in dB, band-pass Q is linear

use super::automation::ParamCurve;
use std::f32::consts::PI;

/// Default Q (1 dB of resonance for low/high-pass)
pub const DEFAULT_Q: f32 = 1.0;

/// Filter type/mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Low-pass filter (12dB/octave)
    #[default]
    LowPass,
    /// High-pass filter (12dB/octave)
    HighPass,
    /// Band-pass filter (constant 0 dB peak gain)
    BandPass,
}

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Cutoff (or center) frequency in Hz
    pub cutoff: f32,
    /// Q factor
    pub q: f32,
    /// Filter type
    pub filter_type: FilterType,
}

impl FilterParams {
    pub fn new(filter_type: FilterType, cutoff: f32, q: f32) -> Self {
        Self {
            cutoff,
            q,
            filter_type,
        }
    }

    pub fn lowpass(cutoff: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff, DEFAULT_Q)
    }

    pub fn highpass(cutoff: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff, DEFAULT_Q)
    }

    pub fn bandpass(center: f32, q: f32) -> Self {
        Self::new(FilterType::BandPass, center, q)
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::lowpass(1000.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    fn compute(filter_type: FilterType, cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let nyquist = sample_rate * 0.5;
        let cutoff = cutoff.clamp(10.0, nyquist * 0.999);
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();

        let q_linear = match filter_type {
            FilterType::LowPass | FilterType::HighPass => 10.0f32.powf(q / 20.0),
            FilterType::BandPass => q.max(1e-4),
        };
        let alpha = sin_w0 / (2.0 * q_linear);

        let (b0, b1, b2) = match filter_type {
            FilterType::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 * 0.5, b1, b1 * 0.5)
            }
            FilterType::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 * 0.5, b1, -b1 * 0.5)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Biquad filter (transposed direct form II)
///
/// # Example
/// ```
/// use drumkit::synth::filter::{BiquadFilter, FilterParams};
///
/// let mut filter = BiquadFilter::new(FilterParams::highpass(900.0), 48000.0);
/// let output = filter.process(0.5);
/// assert!(output.is_finite());
/// ```
pub struct BiquadFilter {
    params: FilterParams,
    sample_rate: f32,
    coefficients: Coefficients,
    /// Cutoff automation; `None` means the cutoff in `params` is fixed
    cutoff_curve: Option<ParamCurve>,
    last_cutoff: f32,
    z1: f32,
    z2: f32,
}

impl BiquadFilter {
    pub fn new(params: FilterParams, sample_rate: f32) -> Self {
        Self {
            params,
            sample_rate,
            coefficients: Coefficients::compute(
                params.filter_type,
                params.cutoff,
                params.q,
                sample_rate,
            ),
            cutoff_curve: None,
            last_cutoff: params.cutoff,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Filter whose cutoff follows `cutoff` over time
    pub fn with_cutoff_curve(params: FilterParams, cutoff: ParamCurve, sample_rate: f32) -> Self {
        let mut filter = Self::new(params, sample_rate);
        if !cutoff.is_constant() {
            filter.cutoff_curve = Some(cutoff);
        }
        filter
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Clear delay state
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn update_coefficients(&mut self, cutoff: f32) {
        self.coefficients =
            Coefficients::compute(self.params.filter_type, cutoff, self.params.q, self.sample_rate);
        self.last_cutoff = cutoff;
    }

    /// Process a sample at absolute `time`, following the cutoff curve
    #[inline]
    pub fn process_at(&mut self, input: f32, time: f64) -> f32 {
        if let Some(curve) = &self.cutoff_curve {
            let cutoff = curve.value_at(time);
            if cutoff != self.last_cutoff {
                self.update_coefficients(cutoff);
            }
        }
        self.process(input)
    }

    /// Process a sample with the current coefficients
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coefficients;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Generate a sine wave at a given frequency
    fn generate_sine(frequency: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate;
                (2.0 * PI * frequency * t).sin()
            })
            .collect()
    }

    /// Compute RMS (root mean square) level of a signal
    fn compute_rms(signal: &[f32]) -> f32 {
        let sum_squares: f32 = signal.iter().map(|x| x * x).sum();
        (sum_squares / signal.len() as f32).sqrt()
    }

    fn gain_at(params: FilterParams, frequency: f32) -> f32 {
        let mut filter = BiquadFilter::new(params, SAMPLE_RATE);
        let input = generate_sine(frequency, SAMPLE_RATE, 9600);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
        compute_rms(&output[2400..]) / compute_rms(&input[2400..])
    }

    #[test]
    fn test_lowpass_frequency_response() {
        let params = FilterParams::lowpass(1200.0);
        assert!(gain_at(params, 200.0) > 0.9);
        assert!(gain_at(params, 8000.0) < 0.1);
    }

    #[test]
    fn test_highpass_frequency_response() {
        let params = FilterParams::highpass(3500.0);
        assert!(gain_at(params, 300.0) < 0.05);
        assert!(gain_at(params, 12000.0) > 0.9);
    }

    #[test]
    fn test_bandpass_frequency_response() {
        let params = FilterParams::bandpass(2200.0, 1.4);
        let center = gain_at(params, 2200.0);
        assert!((center - 1.0).abs() < 0.05, "center gain {}", center);
        assert!(gain_at(params, 200.0) < 0.2);
        assert!(gain_at(params, 15000.0) < 0.3);
    }

    #[test]
    fn test_high_cutoff_is_stable() {
        // 9 kHz band-pass at Q 6 (hi-hat) must not blow up
        let mut filter = BiquadFilter::new(FilterParams::bandpass(9000.0, 6.0), 44100.0);
        for i in 0..10000 {
            let output = filter.process(if i % 2 == 0 { 1.0 } else { -1.0 });
            assert!(output.is_finite());
        }
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = BiquadFilter::new(FilterParams::lowpass(120.0), SAMPLE_RATE);
        let mut last_output = 0.0;
        for _ in 0..20000 {
            last_output = filter.process(1.0);
        }
        assert!((last_output - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_cutoff_curve_updates_coefficients() {
        let mut curve = ParamCurve::new(900.0);
        curve.set_value_at(900.0, 0.0).exponential_ramp_to(120.0, 0.18);
        let mut filter =
            BiquadFilter::with_cutoff_curve(FilterParams::lowpass(900.0), curve, SAMPLE_RATE);

        filter.process_at(0.0, 0.0);
        assert!((filter.last_cutoff - 900.0).abs() < 0.01);

        filter.process_at(0.0, 0.18);
        assert!((filter.last_cutoff - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = BiquadFilter::new(FilterParams::default(), SAMPLE_RATE);
        for _ in 0..100 {
            filter.process(1.0);
        }
        assert!(filter.z1 != 0.0);

        filter.reset();
        assert_eq!(filter.z1, 0.0);
        assert_eq!(filter.z2, 0.0);
    }
}
