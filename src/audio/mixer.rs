// Master bus - Single summing point for every live voice
//
// No polyphony limit: each trigger adds an independent voice that stays on
// the bus until its end time has passed.

use crate::audio::dsp_utils::OnePoleSmoother;
use crate::audio::parameters::AtomicF32;
use crate::synth::effect::Signal;

/// Default master gain
pub const DEFAULT_MASTER_GAIN: f32 = 0.85;

/// Voices the audio callback can hold without growing its storage
pub const VOICE_CAPACITY: usize = 1024;

pub struct MasterBus {
    voices: Vec<Box<dyn Signal>>,
    capacity: usize,
    gain: AtomicF32,
    gain_smoother: OnePoleSmoother,
}

impl MasterBus {
    /// `gain` is shared with the control side; changes are smoothed over 10 ms
    pub fn new(gain: AtomicF32, sample_rate: f32) -> Self {
        Self::with_capacity(gain, sample_rate, VOICE_CAPACITY)
    }

    pub fn with_capacity(gain: AtomicF32, sample_rate: f32, capacity: usize) -> Self {
        let initial = gain.get();
        Self {
            voices: Vec::with_capacity(capacity),
            capacity,
            gain,
            gain_smoother: OnePoleSmoother::new(initial, 10.0, sample_rate),
        }
    }

    /// Add a voice, growing storage as needed (offline rendering)
    pub fn add_voice(&mut self, voice: Box<dyn Signal>) {
        self.voices.push(voice);
    }

    /// Add a voice without growing storage; hands it back when full
    pub fn try_add_voice(&mut self, voice: Box<dyn Signal>) -> Result<(), Box<dyn Signal>> {
        if self.voices.len() >= self.capacity {
            return Err(voice);
        }
        self.voices.push(voice);
        Ok(())
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn gain(&self) -> &AtomicF32 {
        &self.gain
    }

    /// Mix every voice at `time` and apply the master gain
    #[inline]
    pub fn next_sample(&mut self, time: f64) -> f32 {
        let mix: f32 = self.voices.iter_mut().map(|v| v.next_sample(time)).sum();
        mix * self.gain_smoother.process(self.gain.get())
    }

    /// Forget voices that are silent from `time` on
    pub fn drop_finished(&mut self, time: f64) {
        self.voices.retain(|v| v.end_time() > time);
    }

    /// Move voices that are silent from `time` on out through `retire`
    ///
    /// Nothing is freed here. A voice `retire` hands back stays on the bus
    /// and is offered again on the next call.
    pub fn retire_finished<F>(&mut self, time: f64, mut retire: F)
    where
        F: FnMut(Box<dyn Signal>) -> Result<(), Box<dyn Signal>>,
    {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].end_time() > time {
                i += 1;
                continue;
            }
            let voice = self.voices.swap_remove(i);
            if let Err(voice) = retire(voice) {
                // The slot was just freed: no reallocation
                self.voices.push(voice);
                return;
            }
        }
    }

    /// Move every voice out through `retire`; refused voices are dropped
    pub fn retire_all<F>(&mut self, mut retire: F)
    where
        F: FnMut(Box<dyn Signal>) -> Result<(), Box<dyn Signal>>,
    {
        while let Some(voice) = self.voices.pop() {
            let _ = retire(voice);
        }
    }

    /// Render consecutive frames starting at `start_time`
    pub fn render(&mut self, output: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (i, sample) in output.iter_mut().enumerate() {
            *sample = self.next_sample(start_time + i as f64 * dt);
        }
        self.drop_finished(start_time + output.len() as f64 * dt);
    }
}
