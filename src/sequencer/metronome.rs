// Metronome - Click timing during playback
//
// A run of the metronome is identified by a token. Its ticks and its
// auto-stop both hold a clone; whichever of the auto-stop or a manual stop
// happens first deactivates the token, which silences the remaining ticks
// and turns the other stop path into a no-op.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default playback tempo
pub const DEFAULT_BPM: f64 = 120.0;

/// How long the metronome keeps going after the last recorded hit
pub const DEFAULT_TAIL_MS: f64 = 600.0;

/// Tempo in BPM
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Valid range: 20 - 999 BPM
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.clamp(20.0, 999.0),
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Milliseconds between two quarter-note clicks
    pub fn interval_ms(&self) -> f64 {
        60_000.0 / self.bpm
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

/// Cancellation token shared by one metronome run's ticks and stop paths
#[derive(Debug, Clone)]
pub struct MetronomeToken {
    active: Arc<AtomicBool>,
}

impl MetronomeToken {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deactivate the run; returns true only for the call that stopped it
    pub fn cancel(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

/// Timing plan of one metronome run, relative to `play()`
#[derive(Debug, Clone)]
pub struct MetronomeRun {
    pub token: MetronomeToken,
    pub first_tick_ms: f64,
    pub interval_ms: f64,
    pub stop_at_ms: f64,
}

#[derive(Debug)]
pub struct Metronome {
    tempo: Tempo,
    tail_ms: f64,
    enabled: bool,
    current: Option<MetronomeToken>,
}

impl Metronome {
    pub fn new(tempo: Tempo, tail_ms: f64) -> Self {
        Self {
            tempo,
            tail_ms: tail_ms.max(0.0),
            enabled: false,
            current: None,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|t| t.is_active())
    }

    /// Start a run at `now_ms` covering a take of `duration_ms`
    ///
    /// Any previous run is stopped first. The first tick comes one interval
    /// after `now_ms`; the run stops itself `duration_ms + tail` after it.
    pub fn start(&mut self, now_ms: f64, duration_ms: f64) -> MetronomeRun {
        self.stop();
        let token = MetronomeToken::new();
        self.current = Some(token.clone());

        let interval_ms = self.tempo.interval_ms();
        MetronomeRun {
            token,
            first_tick_ms: now_ms + interval_ms,
            interval_ms,
            stop_at_ms: now_ms + duration_ms.max(0.0) + self.tail_ms,
        }
    }

    /// Manual stop; returns true if a run was active
    pub fn stop(&mut self) -> bool {
        self.current.take().is_some_and(|t| t.cancel())
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(Tempo::default(), DEFAULT_TAIL_MS)
    }
}
