// Compressor - Feed-forward dynamics compressor
//
// Peak detector in the dB domain, soft-knee gain computer, and attack/release
// ballistics on the gain reduction. A fixed makeup gain brings a full-scale
// input back up: (1 / curve(0 dBFS))^0.6, as browser compressors do.
//
// References:
// - Giannoulis, Massberg, Reiss, "Digital Dynamic Range Compressor Design -
//   A Tutorial and Analysis" (JAES 2012)

use crate::audio::dsp_utils::{db_to_gain, flush_denormals_to_zero, gain_to_db};

/// Compressor parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    /// Level above which compression starts, in dB
    pub threshold_db: f32,
    /// Width of the soft knee around the threshold, in dB
    pub knee_db: f32,
    /// Input/output ratio above the knee (3.2 means 3.2 dB in -> 1 dB out)
    pub ratio: f32,
    /// Time to apply gain reduction, in seconds
    pub attack: f32,
    /// Time to recover from gain reduction, in seconds
    pub release: f32,
}

impl CompressorParams {
    pub fn new(threshold_db: f32, knee_db: f32, ratio: f32, attack: f32, release: f32) -> Self {
        Self {
            threshold_db: threshold_db.clamp(-100.0, 0.0),
            knee_db: knee_db.clamp(0.0, 40.0),
            ratio: ratio.clamp(1.0, 20.0),
            attack: attack.clamp(0.0, 1.0),
            release: release.clamp(0.0, 1.0),
        }
    }
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self::new(-24.0, 30.0, 12.0, 0.003, 0.25)
    }
}

/// Dynamics compressor
pub struct Compressor {
    params: CompressorParams,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed gain reduction in dB (always <= 0)
    reduction_db: f32,
    makeup_db: f32,
}

impl Compressor {
    pub fn new(params: CompressorParams, sample_rate: f32) -> Self {
        let mut compressor = Self {
            params,
            attack_coeff: Self::time_coefficient(params.attack, sample_rate),
            release_coeff: Self::time_coefficient(params.release, sample_rate),
            reduction_db: 0.0,
            makeup_db: 0.0,
        };
        compressor.makeup_db = -0.6 * compressor.compute_output_db(0.0);
        compressor
    }

    fn time_coefficient(seconds: f32, sample_rate: f32) -> f32 {
        if seconds <= 0.0 {
            0.0
        } else {
            (-1.0 / (seconds * sample_rate)).exp()
        }
    }

    pub fn params(&self) -> CompressorParams {
        self.params
    }

    /// Current gain reduction in dB (0 when idle, negative when compressing)
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    /// Fixed output gain in dB, derived from the static curve at 0 dBFS
    pub fn makeup_db(&self) -> f32 {
        self.makeup_db
    }

    /// Static curve: output level for an input level, both in dB
    pub fn compute_output_db(&self, input_db: f32) -> f32 {
        let CompressorParams {
            threshold_db,
            knee_db,
            ratio,
            ..
        } = self.params;
        let over = input_db - threshold_db;

        if 2.0 * over < -knee_db {
            input_db
        } else if knee_db > 0.0 && 2.0 * over.abs() <= knee_db {
            let knee_pos = over + knee_db / 2.0;
            input_db + (1.0 / ratio - 1.0) * knee_pos * knee_pos / (2.0 * knee_db)
        } else {
            threshold_db + over / ratio
        }
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input_db = gain_to_db(input.abs());
        let target = self.compute_output_db(input_db) - input_db;

        // Deeper reduction uses the attack time, recovery uses release
        let coeff = if target < self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = flush_denormals_to_zero(coeff * self.reduction_db + (1.0 - coeff) * target);

        input * db_to_gain(self.reduction_db + self.makeup_db)
    }
}
