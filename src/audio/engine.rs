// Moteur audio - Callback CPAL temps-réel
//
// # Format Support
//
// Le moteur supporte automatiquement plusieurs formats de sample :
// - **F32**: Floating point 32-bit (natif, pas de conversion nécessaire)
// - **I16**: Signed 16-bit integer (commun sur Windows/WASAPI)
// - **U16**: Unsigned 16-bit integer (moins courant)
//
// Le bus master rend en mono f32; la conversion vers le format du device se
// fait au moment de l'écriture dans le buffer de sortie (sans allocation).
//
// # Suspension
//
// Le stream est construit à l'initialisation mais ne démarre qu'au premier
// `resume()`, typiquement appelé à chaque trigger (idempotent).
//
// # Voix terminées
//
// Le callback ne libère jamais une voix: les voix terminées repartent vers le
// thread de contrôle par un second ring buffer et y sont détruites
// (`reclaim_voices`, appelé par `DrumMachine::tick`).
//
// # Stream Limitations
//
// Sur macOS (CoreAudio), le Stream n'est pas Send/Sync: l'engine reste sur le
// thread de contrôle. L'error callback notifie l'UI, la reconnexion est
// manuelle.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::audio::dsp_utils::{flush_denormals_to_zero, soft_clip};
use crate::audio::format_conversion::{write_mono_to_interleaved_frame, write_silence};
use crate::audio::mixer::{MasterBus, VOICE_CAPACITY};
use crate::audio::output::AudioOutput;
use crate::audio::parameters::AtomicF32;
use crate::audio::timing::AudioTiming;
use crate::connection::status::{AtomicDeviceStatus, DeviceStatus};
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, NotificationProducer, RetiredConsumer, RetiredProducer,
    create_command_channel, create_retired_channel,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::synth::voice::Voice;

/// Failures of the audio device
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),
    #[error("failed to build audio stream: {0}")]
    StreamBuild(String),
    #[error("failed to start audio stream: {0}")]
    StreamPlay(String),
}

pub struct AudioEngine {
    _device: Device,
    stream: Stream,
    sample_rate: f32,
    command_tx: CommandProducer,
    retired_rx: RetiredConsumer,
    refused_voices: Arc<AtomicUsize>,
    reported_refusals: usize,
    timing: AudioTiming,
    pub volume: AtomicF32,
    pub status: AtomicDeviceStatus,
    notification_tx: Arc<Mutex<NotificationProducer>>,
    running: bool,
}

impl AudioEngine {
    /// Open the default output device
    ///
    /// `master_gain` seeds the shared volume, `command_capacity` sizes the
    /// control → audio ring buffer.
    pub fn new(
        master_gain: f32,
        command_capacity: usize,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no output device found".to_string()))?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        log::debug!("Audio config: {:?}", supported_config);

        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let volume = AtomicF32::new(master_gain);
        let timing = AudioTiming::new(sample_rate);
        let status = AtomicDeviceStatus::new(DeviceStatus::Suspended);
        let (command_tx, command_rx) = create_command_channel(command_capacity);
        let (retired_tx, retired_rx) = create_retired_channel(2 * VOICE_CAPACITY);
        let refused_voices = Arc::new(AtomicUsize::new(0));

        let callback = CallbackState {
            channels,
            command_rx,
            retired_tx,
            refused_voices: refused_voices.clone(),
            bus: MasterBus::new(volume.clone(), sample_rate),
            timing: timing.clone(),
        };

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                callback,
                status.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                callback,
                status.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                callback,
                status.clone(),
                notification_tx.clone(),
            ),
            other => {
                return Err(AudioError::UnsupportedSampleFormat(format!(
                    "{:?} (supported: F32, I16, U16)",
                    other
                )));
            }
        }?;

        log::info!("Audio engine ready: {} Hz, {} channels", sample_rate, channels);

        Ok(Self {
            _device: device,
            stream,
            sample_rate,
            command_tx,
            retired_rx,
            refused_voices,
            reported_refusals: 0,
            timing,
            volume,
            status,
            notification_tx,
            running: false,
        })
    }

    pub fn timing(&self) -> &AudioTiming {
        &self.timing
    }

    fn send(&mut self, command: Command) {
        if let Err(command) = self.command_tx.try_push(command) {
            log::warn!("Audio command queue full, dropping {:?}", command);
        }
    }

    /// Build an audio stream with automatic format conversion
    ///
    /// Generic over the device sample type (f32, i16, u16); the callback
    /// renders f32 internally and converts on write.
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        mut state: CallbackState,
        status: AtomicDeviceStatus,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No allocations, No I/O, No blocking locks
                    state.process(data);
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // Runs outside the audio callback, I/O is allowed here
                    log::error!("Audio stream error: {}", err);
                    status.set(DeviceStatus::Error);

                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let notif = Notification::error(
                            NotificationCategory::Audio,
                            format!("Audio stream error: {}", err),
                        );
                        let _ = tx.try_push(notif);
                    }
                },
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))
    }
}

/// Everything the audio callback owns
struct CallbackState {
    channels: usize,
    command_rx: CommandConsumer,
    retired_tx: RetiredProducer,
    refused_voices: Arc<AtomicUsize>,
    bus: MasterBus,
    timing: AudioTiming,
}

impl CallbackState {
    fn process<T>(&mut self, data: &mut [T])
    where
        T: SizedSample + FromSample<f32>,
    {
        let retired_tx = &mut self.retired_tx;

        while let Some(command) = self.command_rx.try_pop() {
            match command {
                Command::PlayVoice(voice) => {
                    if let Err(voice) = self.bus.try_add_voice(voice) {
                        self.refused_voices.fetch_add(1, Ordering::Relaxed);
                        // Freed here only if the retired queue is full too
                        let _ = retired_tx.try_push(voice);
                    }
                }
                Command::StopAll => self.bus.retire_all(|voice| retired_tx.try_push(voice)),
            }
        }

        let frames = data.len() / self.channels.max(1);
        let first = self.timing.current_sample();

        if self.bus.voice_count() == 0 {
            write_silence(data);
        } else {
            for (i, frame) in data.chunks_mut(self.channels.max(1)).enumerate() {
                let time = self.timing.samples_to_seconds(first + i as u64);
                let sample = soft_clip(flush_denormals_to_zero(self.bus.next_sample(time)));
                write_mono_to_interleaved_frame(sample, frame);
            }
        }

        self.timing.advance(frames);
        let now = self.timing.current_time();
        self.bus.retire_finished(now, |voice| retired_tx.try_push(voice));
    }
}

impl AudioOutput for AudioEngine {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.timing.current_time()
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        if self.running {
            return Ok(());
        }

        self.stream.play().map_err(|e| {
            self.status.set(DeviceStatus::Error);
            AudioError::StreamPlay(e.to_string())
        })?;

        self.running = true;
        self.status.set(DeviceStatus::Running);
        log::info!("Audio stream started");

        if let Ok(mut tx) = self.notification_tx.lock() {
            let _ = tx.try_push(Notification::info(
                NotificationCategory::Audio,
                format!("Audio connected: {} Hz", self.sample_rate),
            ));
        }
        Ok(())
    }

    fn schedule_voice(&mut self, voice: Voice) {
        self.send(Command::PlayVoice(Box::new(voice)));
    }

    fn stop_all(&mut self) {
        self.send(Command::StopAll);
    }

    fn reclaim_voices(&mut self) -> usize {
        let reclaimed = self.retired_rx.pop_iter().count();

        let refused = self.refused_voices.load(Ordering::Relaxed);
        if refused > self.reported_refusals {
            log::warn!(
                "Audio thread full ({} voices), {} voices refused",
                VOICE_CAPACITY,
                refused - self.reported_refusals
            );
            self.reported_refusals = refused;
        }
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::effect::FxParams;
    use crate::synth::instruments::Instrument;
    use crate::synth::kit::DrumKit;

    const SAMPLE_RATE: f32 = 48000.0;

    struct Harness {
        state: CallbackState,
        command_tx: CommandProducer,
        retired_rx: RetiredConsumer,
        kit: DrumKit,
    }

    fn harness(capacity: usize) -> Harness {
        let (command_tx, command_rx) = create_command_channel(16);
        let (retired_tx, retired_rx) = create_retired_channel(16);
        let state = CallbackState {
            channels: 2,
            command_rx,
            retired_tx,
            refused_voices: Arc::new(AtomicUsize::new(0)),
            bus: MasterBus::with_capacity(AtomicF32::new(1.0), SAMPLE_RATE, capacity),
            timing: AudioTiming::new(SAMPLE_RATE),
        };
        Harness {
            state,
            command_tx,
            retired_rx,
            kit: DrumKit::new(SAMPLE_RATE, 1.0, FxParams::default()),
        }
    }

    impl Harness {
        fn play(&mut self, instrument: Instrument, t0: f64) {
            if let Some(voice) = self.kit.voice(instrument, t0, false) {
                assert!(self.command_tx.try_push(Command::PlayVoice(Box::new(voice))).is_ok());
            }
        }

        /// Run `blocks` callbacks of 10 ms, stereo
        fn run(&mut self, blocks: usize) -> Vec<f32> {
            let mut out = Vec::new();
            let mut buffer = vec![0.0f32; 2 * 480];
            for _ in 0..blocks {
                self.state.process(&mut buffer);
                out.extend_from_slice(&buffer);
            }
            out
        }
    }

    #[test]
    fn test_finished_voice_sent_back() {
        let mut h = harness(8);
        h.play(Instrument::Kick, 0.0);

        let head = h.run(1);
        assert!(head.iter().any(|s| s.abs() > 0.0));
        assert_eq!(h.state.bus.voice_count(), 1);
        assert!(h.retired_rx.try_pop().is_none());

        // Dry kick ends at 0.25 s
        h.run(30);
        assert_eq!(h.state.bus.voice_count(), 0);
        assert_eq!(h.retired_rx.pop_iter().count(), 1);
    }

    #[test]
    fn test_stop_all_sends_voices_back() {
        let mut h = harness(8);
        h.play(Instrument::Crash, 0.0);
        h.play(Instrument::Tom, 0.0);
        h.run(1);
        assert_eq!(h.state.bus.voice_count(), 2);

        assert!(h.command_tx.try_push(Command::StopAll).is_ok());
        let tail = h.run(1);
        assert!(tail.iter().all(|&s| s == 0.0));
        assert_eq!(h.retired_rx.pop_iter().count(), 2);
    }

    #[test]
    fn test_full_bus_refuses_without_growing() {
        let mut h = harness(2);
        h.play(Instrument::Crash, 0.0);
        h.play(Instrument::Crash, 0.0);
        h.play(Instrument::Crash, 0.0);
        h.run(1);

        assert_eq!(h.state.bus.voice_count(), 2);
        assert_eq!(h.state.refused_voices.load(Ordering::Relaxed), 1);
        assert_eq!(h.retired_rx.pop_iter().count(), 1);
    }

    #[test]
    fn test_error_messages() {
        let err = AudioError::DeviceUnavailable("no output device found".to_string());
        assert_eq!(err.to_string(), "audio device unavailable: no output device found");

        let err = AudioError::UnsupportedSampleFormat("I8".to_string());
        assert!(err.to_string().contains("I8"));
    }
}
