// Noise - Shared white-noise buffer
//
// One buffer is generated when the kit is built and shared read-only by every
// noise-based voice. Playback is one-shot: a NoiseSource that runs past the
// end of the buffer is silent, it does not loop.

use rand::Rng;
use std::sync::Arc;

/// Pre-rendered white noise in [-1, 1)
#[derive(Debug)]
pub struct NoiseBuffer {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl NoiseBuffer {
    /// Generate `seconds` of noise at `sample_rate`
    pub fn new(sample_rate: f32, seconds: f32) -> Self {
        Self::with_rng(sample_rate, seconds, &mut rand::thread_rng())
    }

    /// Generate noise from a caller-provided RNG (deterministic tests)
    pub fn with_rng<R: Rng + ?Sized>(sample_rate: f32, seconds: f32, rng: &mut R) -> Self {
        let len = (sample_rate * seconds.max(0.0)).floor() as usize;
        let samples = (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Length of the buffer in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// One-shot reader over the shared noise buffer
pub struct NoiseSource {
    buffer: Arc<NoiseBuffer>,
    position: usize,
}

impl NoiseSource {
    pub fn new(buffer: Arc<NoiseBuffer>) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.buffer.samples.get(self.position) {
            Some(&sample) => {
                self.position += 1;
                sample
            }
            None => 0.0,
        }
    }

    /// True once every buffered sample has been read
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.buffer.len()
    }
}
