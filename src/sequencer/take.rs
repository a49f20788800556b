// Take - One recorded sequence of pad hits
//
// Offsets are relative to the first hit of the take: the reference time is
// fixed by the first recorded trigger, not by the moment recording started.

use crate::synth::instruments::Instrument;

/// One recorded hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub instrument: Instrument,
    /// Milliseconds since the take's reference time
    pub offset_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Take {
    events: Vec<Event>,
    /// Clock reading of the first hit; `None` until it happens
    reference_ms: Option<f64>,
}

impl Take {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn reference_ms(&self) -> Option<f64> {
        self.reference_ms
    }

    /// Discard every event and unset the reference time
    pub fn clear(&mut self) {
        self.events.clear();
        self.reference_ms = None;
    }

    /// Append a hit observed at `now_ms`
    ///
    /// Offsets never decrease, even if the clock reading does.
    pub fn record(&mut self, instrument: Instrument, now_ms: f64) -> Event {
        let reference = *self.reference_ms.get_or_insert(now_ms);
        let floor = self.events.last().map_or(0.0, |e| e.offset_ms);
        let event = Event {
            instrument,
            offset_ms: (now_ms - reference).max(floor),
        };
        self.events.push(event);
        event
    }

    /// Offset of the first event
    pub fn first_offset_ms(&self) -> Option<f64> {
        self.events.first().map(|e| e.offset_ms)
    }

    /// Span between the first and last event
    pub fn duration_ms(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.offset_ms - first.offset_ms,
            _ => 0.0,
        }
    }

    /// Events with the first offset subtracted, so the first one sits at 0
    pub fn normalized(&self) -> impl Iterator<Item = Event> + '_ {
        let first = self.first_offset_ms().unwrap_or(0.0);
        self.events.iter().map(move |e| Event {
            instrument: e.instrument,
            offset_ms: e.offset_ms - first,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hit_sets_reference() {
        let mut take = Take::new();
        assert_eq!(take.reference_ms(), None);

        take.record(Instrument::Kick, 1000.0);
        take.record(Instrument::Snare, 1130.0);
        take.record(Instrument::ClosedHat, 1260.0);

        let offsets: Vec<f64> = take.events().iter().map(|e| e.offset_ms).collect();
        assert_eq!(offsets, vec![0.0, 130.0, 260.0]);
        assert_eq!(take.reference_ms(), Some(1000.0));
        assert_eq!(take.duration_ms(), 260.0);
    }

    #[test]
    fn test_offsets_monotonic() {
        let mut take = Take::new();
        take.record(Instrument::Kick, 500.0);
        take.record(Instrument::Tom, 600.0);
        // Clock went backwards
        let event = take.record(Instrument::Ride, 550.0);
        assert_eq!(event.offset_ms, 100.0);
        assert!(take.events().windows(2).all(|w| w[0].offset_ms <= w[1].offset_ms));
    }

    #[test]
    fn test_normalized_starts_at_zero() {
        let mut take = Take::new();
        take.record(Instrument::Clap, 42.0);
        take.record(Instrument::Crash, 99.5);
        let normalized: Vec<Event> = take.normalized().collect();
        assert_eq!(normalized[0].offset_ms, 0.0);
        assert_eq!(normalized[1].offset_ms, 57.5);
        assert_eq!(normalized[1].instrument, Instrument::Crash);
    }

    #[test]
    fn test_clear_resets_reference() {
        let mut take = Take::new();
        take.record(Instrument::Kick, 10.0);
        take.clear();
        assert!(take.is_empty());
        assert_eq!(take.reference_ms(), None);
        assert_eq!(take.duration_ms(), 0.0);

        take.record(Instrument::Snare, 5000.0);
        assert_eq!(take.events()[0].offset_ms, 0.0);
    }
}
