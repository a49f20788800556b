// Transport - Record / play / stop / clear state machine
//
// Owns the take, the playback schedule and the metronome. All methods take
// the current control-clock time explicitly; `poll` drains whatever is due
// and reports what should sound.

use super::metronome::Metronome;
use super::quantize::{DEFAULT_GRID_MS, quantize_ms};
use super::scheduler::{Schedule, TaskKind};
use super::take::{Event, Take};
use crate::synth::instruments::Instrument;
use thiserror::Error;

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    #[default]
    Idle,
    Recording,
    /// Transient, while `play()` builds the schedule
    Armed,
    Playing,
}

impl SequencerState {
    pub fn is_recording(&self) -> bool {
        matches!(self, SequencerState::Recording)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, SequencerState::Playing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("Nothing recorded yet.")]
    EmptyTake,
}

/// What `play()` scheduled
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPlan {
    /// Per event: instrument and delay from the `play()` call
    pub delays_ms: Vec<(Instrument, f64)>,
    /// Span of the take, unquantized
    pub duration_ms: f64,
    pub quantized: bool,
    pub metronome: bool,
}

/// Something the sequencer wants to hear now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerAction {
    /// Replay a recorded hit
    Replay(Instrument),
    /// Metronome click
    Click,
}

#[derive(Debug)]
pub struct Sequencer {
    state: SequencerState,
    take: Take,
    schedule: Schedule,
    metronome: Metronome,
    grid_ms: f64,
    /// Replays still queued in the current schedule
    pending_replays: usize,
}

impl Sequencer {
    pub fn new(grid_ms: f64, metronome: Metronome) -> Self {
        Self {
            state: SequencerState::Idle,
            take: Take::new(),
            schedule: Schedule::new(),
            metronome,
            grid_ms,
            pending_replays: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn take(&self) -> &Take {
        &self.take
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    pub fn metronome_mut(&mut self) -> &mut Metronome {
        &mut self.metronome
    }

    pub fn grid_ms(&self) -> f64 {
        self.grid_ms
    }

    /// Discard the take and start a new one
    ///
    /// The reference time stays unset until the first hit.
    pub fn start_recording(&mut self) {
        self.cancel_schedule();
        self.take.clear();
        self.state = SequencerState::Recording;
        log::info!("Recording started");
    }

    /// End the current recording; returns the number of events, if recording
    pub fn stop_recording(&mut self) -> Option<usize> {
        if !self.state.is_recording() {
            return None;
        }
        self.state = SequencerState::Idle;
        log::info!("Recording stopped with {} events", self.take.len());
        Some(self.take.len())
    }

    /// Single Record button: cancel any schedule, then flip recording
    ///
    /// Returns true if recording is now active.
    pub fn toggle_recording(&mut self) -> bool {
        self.cancel_schedule();
        if self.state.is_recording() {
            self.stop_recording();
            false
        } else {
            self.start_recording();
            true
        }
    }

    /// Record a live hit if recording; playback hits never come through here
    pub fn record(&mut self, instrument: Instrument, now_ms: f64) -> Option<Event> {
        if !self.state.is_recording() {
            return None;
        }
        let event = self.take.record(instrument, now_ms);
        log::debug!("Recorded {} at +{:.1} ms", instrument, event.offset_ms);
        Some(event)
    }

    /// Schedule the take for playback from `now_ms`
    ///
    /// An empty take is rejected without touching any state. A recording in
    /// progress is ended first.
    pub fn play(&mut self, now_ms: f64, quantize: bool) -> Result<PlaybackPlan, SequencerError> {
        if self.take.is_empty() {
            log::warn!("Playback requested with an empty take");
            return Err(SequencerError::EmptyTake);
        }

        self.stop_recording();
        self.state = SequencerState::Armed;
        self.cancel_schedule();

        let duration_ms = self.take.duration_ms();

        let metronome = self.metronome.is_enabled();
        if metronome {
            let run = self.metronome.start(now_ms, duration_ms);
            self.schedule.push(
                run.first_tick_ms,
                TaskKind::MetronomeTick(run.token.clone()),
            );
            self.schedule
                .push(run.stop_at_ms, TaskKind::MetronomeStop(run.token));
        }

        let grid_ms = self.grid_ms;
        let delays_ms: Vec<(Instrument, f64)> = self
            .take
            .normalized()
            .map(|e| {
                let delay = if quantize {
                    quantize_ms(e.offset_ms, grid_ms)
                } else {
                    e.offset_ms
                };
                (e.instrument, delay)
            })
            .collect();

        for &(instrument, delay) in &delays_ms {
            self.schedule.push(now_ms + delay, TaskKind::Trigger(instrument));
        }
        self.pending_replays = delays_ms.len();
        self.state = SequencerState::Playing;

        log::info!(
            "Playback of {} events over {:.1} ms{}",
            delays_ms.len(),
            duration_ms,
            if quantize { " (quantized)" } else { "" }
        );

        Ok(PlaybackPlan {
            delays_ms,
            duration_ms,
            quantized: quantize,
            metronome,
        })
    }

    /// Cancel playback and end any recording; the take is kept
    pub fn stop(&mut self) {
        self.cancel_schedule();
        self.state = SequencerState::Idle;
    }

    /// Cancel everything and discard the take
    pub fn clear(&mut self) {
        self.cancel_schedule();
        self.take.clear();
        self.state = SequencerState::Idle;
        log::info!("Take cleared");
    }

    /// Fire everything due at `now_ms`, in schedule order
    pub fn poll(&mut self, now_ms: f64) -> Vec<SequencerAction> {
        let mut actions = Vec::new();

        while let Some(task) = self.schedule.pop_due(now_ms) {
            match task.kind {
                TaskKind::Trigger(instrument) => {
                    self.pending_replays = self.pending_replays.saturating_sub(1);
                    actions.push(SequencerAction::Replay(instrument));
                }
                TaskKind::MetronomeTick(token) => {
                    if token.is_active() {
                        actions.push(SequencerAction::Click);
                        let next = task.fire_at_ms + self.metronome.tempo().interval_ms();
                        self.schedule.push(next, TaskKind::MetronomeTick(token));
                    }
                }
                TaskKind::MetronomeStop(token) => {
                    if token.cancel() {
                        log::debug!("Metronome auto-stopped");
                    }
                }
            }
        }

        if self.state.is_playing() && self.pending_replays == 0 && !self.metronome.is_running() {
            self.state = SequencerState::Idle;
            log::info!("Playback finished");
        }

        actions
    }

    fn cancel_schedule(&mut self) {
        self.schedule.cancel_all();
        self.metronome.stop();
        self.pending_replays = 0;
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_MS, Metronome::default())
    }
}
