// Delay - Feedback delay line
//
// Circular buffer delay whose output is fed back into its own input through
// a feedback gain. The line only produces the delayed (wet) signal; the dry
// and wet levels are mixed by the caller.
//
// Real-time constraints:
// - Pre-allocated circular buffer (no allocations during processing)
// - Fixed maximum delay time (set at creation)

/// Delay parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    /// Delay time in milliseconds (0.0 - max_time_ms)
    pub time_ms: f32,
    /// Gain applied to the delayed signal before it re-enters the line
    pub feedback: f32,
}

impl DelayParams {
    /// Create new delay parameters with clamping
    pub fn new(time_ms: f32, feedback: f32) -> Self {
        Self {
            time_ms: time_ms.max(0.0),
            feedback: feedback.clamp(0.0, 0.99), // Max 0.99 to avoid runaway feedback
        }
    }
}

impl Default for DelayParams {
    fn default() -> Self {
        Self::new(250.0, 0.5)
    }
}

/// Delay line implementation using a circular buffer
///
/// # Example
/// ```
/// use drumkit::synth::delay::{DelayLine, DelayParams};
///
/// let mut delay = DelayLine::new(DelayParams::new(110.0, 0.18), 48000.0, 250.0);
/// let wet = delay.process(0.5);
/// assert_eq!(wet, 0.0); // nothing has come out of the line yet
/// ```
pub struct DelayLine {
    params: DelayParams,
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    /// Create a new delay line
    ///
    /// # Arguments
    /// * `params` - Delay parameters
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `max_time_ms` - Maximum delay time in milliseconds (buffer size)
    pub fn new(params: DelayParams, sample_rate: f32, max_time_ms: f32) -> Self {
        let max_time_ms = max_time_ms.max(params.time_ms);
        let max_samples = ((max_time_ms / 1000.0) * sample_rate) as usize + 1;
        let delay_samples = ((params.time_ms / 1000.0) * sample_rate).round() as usize;

        Self {
            params,
            buffer: vec![0.0; max_samples],
            write_pos: 0,
            delay_samples: delay_samples.clamp(1, max_samples),
        }
    }

    pub fn params(&self) -> DelayParams {
        self.params
    }

    /// Reset delay buffer (clear all delayed samples)
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Process a single sample, returning the delayed signal
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        // A full-length delay reads the slot about to be overwritten
        let read_pos = (self.write_pos + len - self.delay_samples % len) % len;
        let delayed = self.buffer[read_pos];

        // Clamp to prevent runaway feedback (soft saturation)
        self.buffer[self.write_pos] = (input + self.params.feedback * delayed).clamp(-2.0, 2.0);
        self.write_pos = (self.write_pos + 1) % len;

        delayed
    }

    /// Latency in samples (equal to the delay time)
    pub fn latency_samples(&self) -> usize {
        self.delay_samples
    }
}
