// Audio output - Seam between the control side and whatever renders voices
//
// `AudioEngine` implements it on a cpal device. `OfflineOutput` renders the
// same master bus into memory, driven by the caller, for tests and tools.

use crate::audio::engine::AudioError;
use crate::audio::mixer::{DEFAULT_MASTER_GAIN, MasterBus};
use crate::audio::parameters::AtomicF32;
use crate::audio::timing::AudioTiming;
use crate::synth::effect::Signal;
use crate::synth::instruments::Instrument;
use crate::synth::voice::Voice;

pub trait AudioOutput {
    fn sample_rate(&self) -> f32;

    /// Audio time, in seconds, of the next frame the device will render
    fn current_time(&self) -> f64;

    /// Bring the device out of suspension; idempotent
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Hand a voice to the renderer; it sounds from its own start time
    fn schedule_voice(&mut self, voice: Voice);

    /// Silence every live voice
    fn stop_all(&mut self);

    /// Free the voices the renderer is done with; returns how many
    fn reclaim_voices(&mut self) -> usize;
}

/// What an `OfflineOutput` was asked to play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledVoice {
    pub instrument: Instrument,
    pub start_time: f64,
    pub end_time: f64,
}

pub struct OfflineOutput {
    bus: MasterBus,
    timing: AudioTiming,
    scheduled: Vec<ScheduledVoice>,
    retired: Vec<Box<dyn Signal>>,
    rendered: Vec<f32>,
    resumed: bool,
    available: bool,
}

impl OfflineOutput {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_gain(sample_rate, AtomicF32::new(DEFAULT_MASTER_GAIN))
    }

    pub fn with_gain(sample_rate: f32, gain: AtomicF32) -> Self {
        Self {
            bus: MasterBus::new(gain, sample_rate),
            timing: AudioTiming::new(sample_rate),
            scheduled: Vec::new(),
            retired: Vec::new(),
            rendered: Vec::new(),
            resumed: false,
            available: true,
        }
    }

    /// Simulate a platform that refuses to start audio
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// Every voice handed over so far, in scheduling order
    pub fn scheduled(&self) -> &[ScheduledVoice] {
        &self.scheduled
    }

    pub fn live_voices(&self) -> usize {
        self.bus.voice_count()
    }

    /// Render `frames` more frames, returning just those frames
    pub fn render(&mut self, frames: usize) -> &[f32] {
        let first = self.timing.current_sample();
        let offset = self.rendered.len();
        self.rendered.reserve(frames);

        for i in 0..frames {
            let time = self.timing.samples_to_seconds(first + i as u64);
            let sample = self.bus.next_sample(time);
            self.rendered.push(sample);
        }

        self.timing.advance(frames);
        let retired = &mut self.retired;
        self.bus.retire_finished(self.timing.current_time(), |voice| {
            retired.push(voice);
            Ok(())
        });
        &self.rendered[offset..]
    }

    /// Render until audio time reaches `time`
    pub fn render_until(&mut self, time: f64) -> &[f32] {
        let target = self.timing.seconds_to_samples(time);
        let frames = target.saturating_sub(self.timing.current_sample()) as usize;
        self.render(frames)
    }

    /// Everything rendered since creation
    pub fn rendered(&self) -> &[f32] {
        &self.rendered
    }
}

impl AudioOutput for OfflineOutput {
    fn sample_rate(&self) -> f32 {
        self.timing.sample_rate()
    }

    fn current_time(&self) -> f64 {
        self.timing.current_time()
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if !self.available {
            return Err(AudioError::DeviceUnavailable(
                "offline output disabled".to_string(),
            ));
        }
        self.resumed = true;
        Ok(())
    }

    fn schedule_voice(&mut self, voice: Voice) {
        self.scheduled.push(ScheduledVoice {
            instrument: voice.instrument(),
            start_time: voice.start_time(),
            end_time: voice.end_time(),
        });
        self.bus.add_voice(Box::new(voice));
    }

    fn stop_all(&mut self) {
        let retired = &mut self.retired;
        self.bus.retire_all(|voice| {
            retired.push(voice);
            Ok(())
        });
    }

    fn reclaim_voices(&mut self) -> usize {
        let reclaimed = self.retired.len();
        self.retired.clear();
        reclaimed
    }
}
