// Scheduler - Time-ordered playback schedule with generation-based cancellation
//
// Tasks live in a min-heap keyed by fire time (insertion order breaks ties).
// Cancelling clears the heap and bumps the generation, so a task that was
// already taken out of the heap can tell it is obsolete.

use crate::sequencer::metronome::MetronomeToken;
use crate::synth::instruments::Instrument;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What a task does when it fires
#[derive(Debug, Clone)]
pub enum TaskKind {
    /// Replay a recorded hit (playback mode: not recorded again)
    Trigger(Instrument),
    /// Metronome click, valid while its token is active
    MetronomeTick(MetronomeToken),
    /// Metronome auto-stop
    MetronomeStop(MetronomeToken),
}

#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub fire_at_ms: f64,
    pub kind: TaskKind,
    sequence: u64,
    generation: u64,
}

impl ScheduledTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    // Reversed: BinaryHeap pops the greatest, we want the earliest
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at_ms
            .total_cmp(&self.fire_at_ms)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Default)]
pub struct Schedule {
    heap: BinaryHeap<ScheduledTask>,
    generation: u64,
    next_sequence: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Fire time of the earliest pending task
    pub fn next_fire_ms(&self) -> Option<f64> {
        self.heap.peek().map(|t| t.fire_at_ms)
    }

    pub fn push(&mut self, fire_at_ms: f64, kind: TaskKind) {
        let task = ScheduledTask {
            fire_at_ms,
            kind,
            sequence: self.next_sequence,
            generation: self.generation,
        };
        self.next_sequence += 1;
        self.heap.push(task);
    }

    /// Forget every pending task; idempotent
    pub fn cancel_all(&mut self) {
        if !self.heap.is_empty() {
            log::debug!("Cancelling {} scheduled tasks", self.heap.len());
        }
        self.heap.clear();
        self.generation += 1;
    }

    pub fn is_current(&self, task: &ScheduledTask) -> bool {
        task.generation == self.generation
    }

    /// Take the earliest task due at `now_ms`, skipping obsolete ones
    pub fn pop_due(&mut self, now_ms: f64) -> Option<ScheduledTask> {
        while self.heap.peek().is_some_and(|t| t.fire_at_ms <= now_ms) {
            let task = self.heap.pop()?;
            if self.is_current(&task) {
                return Some(task);
            }
        }
        None
    }
}
