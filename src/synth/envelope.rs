// Envelope generator - Attack/Decay/Sustain/Release gain curves
//
// Every instrument shapes its amplitude with one of these. The envelope is
// not a running state machine: it is rendered once, at trigger time, into a
// ParamCurve anchored at the voice start time. All segments are linear.

use super::automation::ParamCurve;

/// Envelope parameters (all durations in seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSpec {
    /// Time to rise from 0 to `peak`
    pub attack: f64,
    /// Time to fall from `peak` to `peak * sustain_level`
    pub decay: f64,
    /// Sustain level relative to peak (0.0 to 1.0)
    pub sustain_level: f32,
    /// Time to fall from the sustain level to 0
    pub release: f64,
    /// Peak gain
    pub peak: f32,
}

impl EnvelopeSpec {
    /// Create an envelope with validation
    pub fn new(attack: f64, decay: f64, sustain_level: f32, release: f64, peak: f32) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain_level: sustain_level.clamp(0.0, 1.0),
            release: release.max(0.0),
            peak: peak.max(0.0),
        }
    }

    /// Total length from start to silence
    pub fn duration(&self) -> f64 {
        self.attack + self.decay + self.release
    }

    /// Render the envelope as a gain curve starting at `t0`
    ///
    /// The curve holds 0 until `t0`, then ramps to `peak`, to
    /// `peak * sustain_level`, and back to 0. A zero-length segment is an
    /// instantaneous jump.
    pub fn curve(&self, t0: f64) -> ParamCurve {
        let attack_end = t0 + self.attack;
        let decay_end = attack_end + self.decay;
        let release_end = decay_end + self.release;

        let mut curve = ParamCurve::new(0.0);
        curve
            .set_value_at(0.0, t0)
            .linear_ramp_to(self.peak, attack_end)
            .linear_ramp_to(self.peak * self.sustain_level, decay_end)
            .linear_ramp_to(0.0, release_end);
        curve
    }
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        Self {
            attack: 0.001,
            decay: 0.05,
            sustain_level: 0.2,
            release: 0.2,
            peak: 1.0,
        }
    }
}
