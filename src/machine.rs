// Drum machine - The single owning object tying pads, sequencer and output
//
// Everything here runs on the control thread. The output only receives fully
// built voices; the sequencer only sees control-clock milliseconds.

use crate::audio::engine::AudioError;
use crate::audio::output::AudioOutput;
use crate::audio::parameters::FeatureFlags;
use crate::audio::timing::Clock;
use crate::config::EngineConfig;
use crate::messaging::channels::{NotificationConsumer, NotificationProducer};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::sequencer::metronome::{Metronome, Tempo};
use crate::sequencer::transport::{
    PlaybackPlan, Sequencer, SequencerAction, SequencerError, SequencerState,
};
use crate::sequencer::take::Take;
use crate::synth::effect::FxParams;
use crate::synth::instruments::Instrument;
use crate::synth::kit::DrumKit;
use ringbuf::traits::{Consumer, Producer};
use std::sync::{Arc, Mutex};

/// Where a trigger comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerSource {
    /// Key, pointer or API call: recorded and announced
    Live,
    /// Re-issued by the playback schedule or the metronome
    Playback,
}

pub struct DrumMachine<O: AudioOutput, C: Clock> {
    output: O,
    clock: C,
    kit: DrumKit,
    sequencer: Sequencer,
    flags: FeatureFlags,
    lookahead_s: f64,
    notification_tx: Arc<Mutex<NotificationProducer>>,
    notification_rx: NotificationConsumer,
}

impl<O: AudioOutput, C: Clock> DrumMachine<O, C> {
    /// Build the kit for the output's sample rate and wire the sequencer
    ///
    /// `notification_tx` may be shared with the output (stream errors), the
    /// matching `notification_rx` is drained through `drain_notifications`.
    pub fn new(
        output: O,
        clock: C,
        config: &EngineConfig,
        flags: FeatureFlags,
        notification_tx: Arc<Mutex<NotificationProducer>>,
        notification_rx: NotificationConsumer,
    ) -> Self {
        let fx_params = FxParams {
            tail_seconds: config.fx_tail_s,
            ..FxParams::default()
        };
        let kit = DrumKit::new(output.sample_rate(), config.noise_seconds, fx_params);
        let metronome = Metronome::new(Tempo::new(config.metronome_bpm), config.metronome_tail_ms);

        log::info!(
            "Drum machine ready at {} Hz, grid {} ms",
            output.sample_rate(),
            config.quantize_grid_ms
        );

        Self {
            output,
            clock,
            kit,
            sequencer: Sequencer::new(config.quantize_grid_ms, metronome),
            flags,
            lookahead_s: config.lookahead_s,
            notification_tx,
            notification_rx,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn kit(&self) -> &DrumKit {
        &self.kit
    }

    /// Shared handle; the UI side flips the flags on its own clone
    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    pub fn state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn take(&self) -> &Take {
        self.sequencer.take()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Live trigger entry point
    ///
    /// `scheduled_time` is audio time in seconds; `None` means now plus the
    /// configured lookahead. Records the hit when recording.
    pub fn trigger(
        &mut self,
        instrument: Instrument,
        scheduled_time: Option<f64>,
    ) -> Result<(), AudioError> {
        self.fire(instrument, scheduled_time, TriggerSource::Live)
    }

    /// Trigger by pad identifier; unknown identifiers are ignored
    pub fn trigger_id(&mut self, id: &str, scheduled_time: Option<f64>) -> Result<(), AudioError> {
        match Instrument::from_id(id) {
            Some(instrument) => self.trigger(instrument, scheduled_time),
            None => {
                log::debug!("Ignoring unknown instrument id {:?}", id);
                Ok(())
            }
        }
    }

    fn fire(
        &mut self,
        instrument: Instrument,
        scheduled_time: Option<f64>,
        source: TriggerSource,
    ) -> Result<(), AudioError> {
        let resumed = self.output.resume();
        let t = scheduled_time.unwrap_or_else(|| self.output.current_time() + self.lookahead_s);

        // A refused resume still counts as a hit for the take
        if source == TriggerSource::Live {
            self.sequencer.record(instrument, self.clock.now_ms());
            self.notify(
                NotificationCategory::Pad,
                format!("{} @ {:.3}", instrument.id().to_uppercase(), t),
            );
        }
        resumed?;

        // Read at fire time, for live and scheduled hits alike
        let fx_enabled = self.flags.fx_enabled();
        if let Some(voice) = self.kit.voice(instrument, t, fx_enabled) {
            log::debug!("{} at {:.4} s (fx {})", instrument, t, fx_enabled);
            self.output.schedule_voice(voice);
        }
        Ok(())
    }

    /// "Enable audio" button
    pub fn enable_audio(&mut self) -> Result<(), AudioError> {
        self.output.resume()?;
        self.notify(NotificationCategory::Audio, "Audio enabled.".to_string());
        Ok(())
    }

    pub fn start_recording(&mut self) {
        self.sequencer.start_recording();
        self.notify(NotificationCategory::Transport, "Recording started...".to_string());
    }

    pub fn stop_recording(&mut self) {
        if let Some(events) = self.sequencer.stop_recording() {
            self.notify(
                NotificationCategory::Transport,
                format!("Recording stopped. Events: {}", events),
            );
        }
    }

    /// Record button; returns true if now recording
    pub fn toggle_recording(&mut self) -> bool {
        let recording = self.sequencer.toggle_recording();
        let message = if recording {
            "Recording started...".to_string()
        } else {
            format!("Recording stopped. Events: {}", self.sequencer.take().len())
        };
        self.notify(NotificationCategory::Transport, message);
        recording
    }

    /// Schedule the take for playback
    ///
    /// The quantize flag is read now; fx is read as each hit fires.
    pub fn play(&mut self) -> Result<PlaybackPlan, SequencerError> {
        let was_recording = self.sequencer.state().is_recording();
        let quantize = self.flags.quantize_enabled();

        let plan = match self.sequencer.play(self.clock.now_ms(), quantize) {
            Ok(plan) => plan,
            Err(e) => {
                self.notify_warning(NotificationCategory::Transport, e.to_string());
                return Err(e);
            }
        };

        if was_recording {
            self.notify(
                NotificationCategory::Transport,
                format!("Recording stopped. Events: {}", plan.delays_ms.len()),
            );
        }
        if let Err(e) = self.output.resume() {
            log::warn!("Playback scheduled but audio is unavailable: {}", e);
        }

        let suffix = if plan.quantized { " (quantized)" } else { "" };
        self.notify(
            NotificationCategory::Transport,
            format!("Playback started{}...", suffix),
        );
        Ok(plan)
    }

    /// Cancel playback and recording, keep the take
    pub fn stop(&mut self) {
        let was_recording = self.sequencer.state().is_recording();
        self.sequencer.stop();
        if was_recording {
            self.notify(
                NotificationCategory::Transport,
                format!("Recording stopped. Events: {}", self.sequencer.take().len()),
            );
        }
    }

    pub fn clear(&mut self) {
        self.sequencer.clear();
        self.notify(NotificationCategory::Transport, "Cleared recording.".to_string());
    }

    pub fn set_metronome_enabled(&mut self, enabled: bool) {
        self.sequencer.metronome_mut().set_enabled(enabled);
    }

    pub fn metronome_enabled(&self) -> bool {
        self.sequencer.metronome().is_enabled()
    }

    /// Scheduling loop step: fire everything due on the control clock
    ///
    /// Returns the number of hits played. Every due hit is attempted; the
    /// last audio error, if any, is returned. Voices the renderer finished
    /// are freed here, off the audio thread.
    pub fn tick(&mut self) -> Result<usize, AudioError> {
        let reclaimed = self.output.reclaim_voices();
        if reclaimed > 0 {
            log::trace!("Freed {} finished voices", reclaimed);
        }

        let actions = self.sequencer.poll(self.clock.now_ms());
        let mut error = None;
        let mut played = 0;

        for action in actions {
            let instrument = match action {
                SequencerAction::Replay(instrument) => instrument,
                SequencerAction::Click => Instrument::ClosedHat,
            };
            match self.fire(instrument, None, TriggerSource::Playback) {
                Ok(()) => played += 1,
                Err(e) => error = Some(e),
            }
        }

        match error {
            Some(e) => Err(e),
            None => Ok(played),
        }
    }

    /// Back to a fresh state: no take, nothing scheduled
    pub fn reset(&mut self) {
        self.sequencer.clear();
    }

    /// Reset and silence every live voice
    pub fn teardown(&mut self) {
        self.reset();
        self.output.stop_all();
        log::info!("Drum machine torn down");
    }

    /// Pending user-visible messages, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notification_rx.pop_iter().collect()
    }

    fn notify(&self, category: NotificationCategory, message: String) {
        self.push(Notification::info(category, message));
    }

    fn notify_warning(&self, category: NotificationCategory, message: String) {
        self.push(Notification::warning(category, message));
    }

    fn push(&self, notification: Notification) {
        if let Ok(mut tx) = self.notification_tx.lock() {
            // Full channel: drop the message
            let _ = tx.try_push(notification);
        }
    }
}
