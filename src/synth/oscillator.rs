// Oscillators - Waveform generators with automatable frequency

use super::automation::ParamCurve;
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
}

/// Phase accumulator; every waveform starts at phase 0
pub struct SimpleOscillator {
    waveform: WaveformType,
    phase: f32,
    phase_increment: f32,
    sample_rate: f32,
}

impl SimpleOscillator {
    pub fn new(waveform: WaveformType, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate,
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let p = self.phase;
        let sample = match self.waveform {
            WaveformType::Sine => (p * 2.0 * PI).sin(),
            WaveformType::Square => {
                if p < 0.5 { 1.0 } else { -1.0 }
            }
            // Starts at 0 and rises, like the sine
            WaveformType::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
        };

        self.phase += self.phase_increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    pub fn set_frequency(&mut self, freq: f32) {
        self.phase_increment = freq / self.sample_rate;
    }
}

/// Oscillator driven by a frequency curve, sounding between `start` and `stop`
///
/// Outside that window the source outputs silence and does not advance its
/// phase, so the first sample at `start` is the waveform at phase 0.
pub struct SweptOscillator {
    oscillator: SimpleOscillator,
    frequency: ParamCurve,
    start: f64,
    stop: f64,
}

impl SweptOscillator {
    pub fn new(
        waveform: WaveformType,
        frequency: ParamCurve,
        start: f64,
        stop: f64,
        sample_rate: f32,
    ) -> Self {
        Self {
            oscillator: SimpleOscillator::new(waveform, sample_rate),
            frequency,
            start,
            stop,
        }
    }

    #[inline]
    pub fn next_sample(&mut self, time: f64) -> f32 {
        if time < self.start || time >= self.stop {
            return 0.0;
        }
        self.oscillator.set_frequency(self.frequency.value_at(time));
        self.oscillator.next_sample()
    }

    pub fn frequency(&self) -> &ParamCurve {
        &self.frequency
    }

    pub fn stop_time(&self) -> f64 {
        self.stop
    }
}
