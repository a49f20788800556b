// Automation - Scheduled parameter curves
//
// A ParamCurve is a list of timed events (set, linear ramp, exponential ramp)
// evaluated at an absolute time in seconds. Events are kept sorted by time;
// events sharing a timestamp keep their insertion order.
//
// Evaluation rules:
// - Before the first event the curve returns its default value
// - A ramp event interpolates from the previous event (time, value) to its own
// - A set event holds until the next event begins
// - An exponential ramp between values of different sign, or from zero, holds
//   the start value

/// Kind of automation event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveEventKind {
    /// Jump to the value at the event time
    Set,
    /// Linear ramp ending at the event time
    Linear,
    /// Exponential ramp ending at the event time
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveEvent {
    pub time: f64,
    pub value: f32,
    pub kind: CurveEventKind,
}

/// Piecewise automation curve over absolute time
#[derive(Debug, Clone, PartialEq)]
pub struct ParamCurve {
    default_value: f32,
    events: Vec<CurveEvent>,
}

impl ParamCurve {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::new(),
        }
    }

    /// Constant curve (no events)
    pub fn constant(value: f32) -> Self {
        Self::new(value)
    }

    pub fn set_value_at(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(CurveEvent {
            time,
            value,
            kind: CurveEventKind::Set,
        })
    }

    pub fn linear_ramp_to(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(CurveEvent {
            time: end_time,
            value,
            kind: CurveEventKind::Linear,
        })
    }

    pub fn exponential_ramp_to(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(CurveEvent {
            time: end_time,
            value,
            kind: CurveEventKind::Exponential,
        })
    }

    fn insert(&mut self, event: CurveEvent) -> &mut Self {
        let index = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(index, event);
        self
    }

    pub fn events(&self) -> &[CurveEvent] {
        &self.events
    }

    /// True if the curve never changes value
    pub fn is_constant(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last event, if any
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(|e| e.time)
    }

    /// Evaluate the curve at `time` (seconds)
    pub fn value_at(&self, time: f64) -> f32 {
        // Index of the first event strictly after `time`
        let next = self.events.partition_point(|e| e.time <= time);

        let (prev_time, prev_value) = match next.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => {
                // Ramps starting before any event start from the default value at t = 0
                match self.events.first() {
                    Some(first) if first.kind != CurveEventKind::Set => (0.0, self.default_value),
                    _ => return self.default_value,
                }
            }
        };

        let Some(upcoming) = self.events.get(next) else {
            return prev_value;
        };

        let span = upcoming.time - prev_time;
        if span <= 0.0 {
            return prev_value;
        }
        let progress = ((time - prev_time) / span).clamp(0.0, 1.0) as f32;

        match upcoming.kind {
            CurveEventKind::Set => prev_value,
            CurveEventKind::Linear => prev_value + (upcoming.value - prev_value) * progress,
            CurveEventKind::Exponential => {
                if prev_value == 0.0 || prev_value.signum() != upcoming.value.signum() {
                    prev_value
                } else {
                    prev_value * (upcoming.value / prev_value).powf(progress)
                }
            }
        }
    }
}

impl Default for ParamCurve {
    fn default() -> Self {
        Self::new(0.0)
    }
}
