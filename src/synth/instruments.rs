// Instruments - The eight drum voices and their patch descriptors
//
// A patch is a declarative description of a voice graph: sources, a filter
// series and a gain curve per branch, plus the time at which the branch's
// sources stop. Patches are built once; `synth::voice` instantiates them at a
// concrete start time.

use super::automation::ParamCurve;
use super::envelope::EnvelopeSpec;
use super::filter::FilterParams;
use super::oscillator::WaveformType;
use std::fmt;

/// The eight pads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instrument {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Clap,
    Tom,
    Crash,
    Ride,
}

impl Instrument {
    /// All instruments in pad order
    pub const ALL: [Instrument; 8] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::ClosedHat,
        Instrument::OpenHat,
        Instrument::Clap,
        Instrument::Tom,
        Instrument::Crash,
        Instrument::Ride,
    ];

    /// Stable identifier used by pointer/touch pads
    pub fn id(&self) -> &'static str {
        match self {
            Instrument::Kick => "kick",
            Instrument::Snare => "snare",
            Instrument::ClosedHat => "hihat",
            Instrument::OpenHat => "openhat",
            Instrument::Clap => "clap",
            Instrument::Tom => "tom",
            Instrument::Crash => "crash",
            Instrument::Ride => "ride",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Kick => "Kick",
            Instrument::Snare => "Snare",
            Instrument::ClosedHat => "Closed Hat",
            Instrument::OpenHat => "Open Hat",
            Instrument::Clap => "Clap",
            Instrument::Tom => "Tom",
            Instrument::Crash => "Crash",
            Instrument::Ride => "Ride",
        }
    }

    /// Keyboard binding (lowercase)
    pub fn key(&self) -> char {
        match self {
            Instrument::Kick => 'a',
            Instrument::Snare => 's',
            Instrument::ClosedHat => 'd',
            Instrument::OpenHat => 'f',
            Instrument::Clap => 'j',
            Instrument::Tom => 'k',
            Instrument::Crash => 'l',
            Instrument::Ride => ';',
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.id() == id)
    }

    /// Case-insensitive key lookup
    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|i| i.key() == key)
    }

    /// Patch descriptor for this instrument
    pub fn patch(&self) -> InstrumentPatch {
        match self {
            Instrument::Kick => kick(),
            Instrument::Snare => snare(),
            Instrument::ClosedHat => hat(false),
            Instrument::OpenHat => hat(true),
            Instrument::Clap => clap(),
            Instrument::Tom => tom(),
            Instrument::Crash => crash(),
            Instrument::Ride => ride(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Frequency over time, relative to the voice start
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sweep {
    Fixed(f32),
    /// Exponential glide from `from` to `to`, reaching `to` after `over` seconds
    Exponential { from: f32, to: f32, over: f64 },
}

impl Sweep {
    pub fn initial(&self) -> f32 {
        match *self {
            Sweep::Fixed(hz) => hz,
            Sweep::Exponential { from, .. } => from,
        }
    }

    pub fn curve(&self, t0: f64) -> ParamCurve {
        match *self {
            Sweep::Fixed(hz) => ParamCurve::constant(hz),
            Sweep::Exponential { from, to, over } => {
                let mut curve = ParamCurve::new(from);
                curve.set_value_at(from, t0).exponential_ramp_to(to, t0 + over);
                curve
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceSpec {
    /// One-shot read of the shared noise buffer
    Noise,
    Oscillator { waveform: WaveformType, frequency: Sweep },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub params: FilterParams,
    pub cutoff: Sweep,
}

impl FilterSpec {
    pub fn fixed(params: FilterParams) -> Self {
        Self {
            params,
            cutoff: Sweep::Fixed(params.cutoff),
        }
    }

    pub fn swept(params: FilterParams, cutoff: Sweep) -> Self {
        Self { params, cutoff }
    }
}

/// One short gain burst of a clap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    /// Offset from the voice start
    pub offset: f64,
    pub peak: f32,
    /// Linear rise time to `peak`
    pub rise: f64,
    /// Time (from `offset`) at which the exponential fall reaches `floor`
    pub fall_end: f64,
    pub floor: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GainSpec {
    Envelope(EnvelopeSpec),
    /// Staggered micro-envelopes, evaluated together in time order
    Bursts(Vec<Burst>),
}

impl GainSpec {
    pub fn curve(&self, t0: f64) -> ParamCurve {
        match self {
            GainSpec::Envelope(env) => env.curve(t0),
            GainSpec::Bursts(bursts) => {
                let mut curve = ParamCurve::new(0.0);
                curve.set_value_at(0.0, t0);
                for burst in bursts {
                    let start = t0 + burst.offset;
                    curve
                        .set_value_at(0.0, start)
                        .linear_ramp_to(burst.peak, start + burst.rise)
                        .exponential_ramp_to(burst.floor, start + burst.fall_end);
                }
                curve
            }
        }
    }

    /// Time from the voice start until the last gain movement
    pub fn duration(&self) -> f64 {
        match self {
            GainSpec::Envelope(env) => env.duration(),
            GainSpec::Bursts(bursts) => bursts
                .iter()
                .map(|b| b.offset + b.fall_end.max(b.rise))
                .fold(0.0, f64::max),
        }
    }
}

/// Sources summed into a filter series, shaped by a gain curve
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSpec {
    pub sources: Vec<SourceSpec>,
    pub filters: Vec<FilterSpec>,
    pub gain: GainSpec,
    /// Sources stop this long after the voice start
    pub stop_after: f64,
}

/// Full voice description: one FX insert per branch
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentPatch {
    pub instrument: Instrument,
    pub branches: Vec<BranchSpec>,
}

impl InstrumentPatch {
    /// Longest source lifetime across branches
    pub fn duration(&self) -> f64 {
        self.branches.iter().map(|b| b.stop_after).fold(0.0, f64::max)
    }

    pub fn uses_noise(&self) -> bool {
        self.branches
            .iter()
            .any(|b| b.sources.contains(&SourceSpec::Noise))
    }
}

fn kick() -> InstrumentPatch {
    InstrumentPatch {
        instrument: Instrument::Kick,
        branches: vec![BranchSpec {
            sources: vec![SourceSpec::Oscillator {
                waveform: WaveformType::Sine,
                frequency: Sweep::Exponential {
                    from: 150.0,
                    to: 55.0,
                    over: 0.14,
                },
            }],
            filters: vec![FilterSpec::swept(
                FilterParams::lowpass(900.0),
                Sweep::Exponential {
                    from: 900.0,
                    to: 120.0,
                    over: 0.18,
                },
            )],
            gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, 0.06, 0.2, 0.18, 1.0)),
            stop_after: 0.25,
        }],
    }
}

fn snare() -> InstrumentPatch {
    InstrumentPatch {
        instrument: Instrument::Snare,
        branches: vec![
            BranchSpec {
                sources: vec![SourceSpec::Noise],
                filters: vec![FilterSpec::fixed(FilterParams::highpass(900.0))],
                gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, 0.03, 0.15, 0.18, 0.9)),
                stop_after: 0.25,
            },
            BranchSpec {
                sources: vec![SourceSpec::Oscillator {
                    waveform: WaveformType::Triangle,
                    frequency: Sweep::Exponential {
                        from: 210.0,
                        to: 170.0,
                        over: 0.12,
                    },
                }],
                filters: Vec::new(),
                gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, 0.04, 0.12, 0.16, 0.5)),
                stop_after: 0.22,
            },
        ],
    }
}

fn hat(open: bool) -> InstrumentPatch {
    let (instrument, decay, release, peak) = if open {
        (Instrument::OpenHat, 0.08, 0.6, 0.55)
    } else {
        (Instrument::ClosedHat, 0.03, 0.12, 0.35)
    };

    InstrumentPatch {
        instrument,
        branches: vec![BranchSpec {
            sources: vec![SourceSpec::Noise],
            filters: vec![
                FilterSpec::fixed(FilterParams::bandpass(9000.0, 6.0)),
                FilterSpec::fixed(FilterParams::highpass(7000.0)),
            ],
            gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, decay, 0.2, release, peak)),
            stop_after: release + 0.12,
        }],
    }
}

fn clap() -> InstrumentPatch {
    let bursts = [0.0, 0.018, 0.035]
        .iter()
        .enumerate()
        .map(|(i, &offset)| Burst {
            offset,
            peak: 0.55 - i as f32 * 0.12,
            rise: 0.002,
            fall_end: 0.08,
            floor: 0.001,
        })
        .collect();

    InstrumentPatch {
        instrument: Instrument::Clap,
        branches: vec![BranchSpec {
            sources: vec![SourceSpec::Noise],
            filters: vec![FilterSpec::fixed(FilterParams::bandpass(2200.0, 1.4))],
            gain: GainSpec::Bursts(bursts),
            stop_after: 0.25,
        }],
    }
}

fn tom() -> InstrumentPatch {
    InstrumentPatch {
        instrument: Instrument::Tom,
        branches: vec![BranchSpec {
            sources: vec![SourceSpec::Oscillator {
                waveform: WaveformType::Sine,
                frequency: Sweep::Exponential {
                    from: 220.0,
                    to: 120.0,
                    over: 0.18,
                },
            }],
            filters: vec![FilterSpec::fixed(FilterParams::lowpass(1200.0))],
            gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, 0.05, 0.25, 0.25, 0.8)),
            stop_after: 0.32,
        }],
    }
}

fn crash() -> InstrumentPatch {
    InstrumentPatch {
        instrument: Instrument::Crash,
        branches: vec![BranchSpec {
            sources: vec![SourceSpec::Noise],
            filters: vec![FilterSpec::fixed(FilterParams::highpass(3500.0))],
            gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, 0.12, 0.35, 1.1, 0.7)),
            stop_after: 1.4,
        }],
    }
}

fn ride() -> InstrumentPatch {
    // Two squares 8 Hz apart beat against each other
    let square = |hz| SourceSpec::Oscillator {
        waveform: WaveformType::Square,
        frequency: Sweep::Fixed(hz),
    };

    InstrumentPatch {
        instrument: Instrument::Ride,
        branches: vec![BranchSpec {
            sources: vec![square(520.0), square(528.0)],
            filters: vec![FilterSpec::fixed(FilterParams::bandpass(5200.0, 2.5))],
            gain: GainSpec::Envelope(EnvelopeSpec::new(0.001, 0.08, 0.25, 0.7, 0.25)),
            stop_after: 0.95,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::filter::FilterType;

    #[test]
    fn test_ids_round_trip() {
        for instrument in Instrument::ALL {
            assert_eq!(Instrument::from_id(instrument.id()), Some(instrument));
        }
        assert_eq!(Instrument::from_id("cowbell"), None);
    }

    #[test]
    fn test_key_bindings() {
        let keys: String = Instrument::ALL.iter().map(|i| i.key()).collect();
        assert_eq!(keys, "asdfjkl;");
        assert_eq!(Instrument::from_key('A'), Some(Instrument::Kick));
        assert_eq!(Instrument::from_key(';'), Some(Instrument::Ride));
        assert_eq!(Instrument::from_key('z'), None);
    }

    #[test]
    fn test_sources_outlive_their_gain_curves() {
        for instrument in Instrument::ALL {
            let patch = instrument.patch();
            assert_eq!(patch.instrument, instrument);
            for branch in &patch.branches {
                assert!(
                    branch.stop_after > branch.gain.duration(),
                    "{} stops at {} before its gain ends at {}",
                    instrument,
                    branch.stop_after,
                    branch.gain.duration()
                );
            }
        }
    }

    #[test]
    fn test_hat_durations() {
        let closed = Instrument::ClosedHat.patch();
        let open = Instrument::OpenHat.patch();
        assert!((closed.duration() - 0.24).abs() < 1e-9);
        assert!((open.duration() - 0.72).abs() < 1e-9);
        assert_eq!(closed.branches[0].filters, open.branches[0].filters);
    }

    #[test]
    fn test_snare_has_two_branches() {
        let snare = Instrument::Snare.patch();
        assert_eq!(snare.branches.len(), 2);
        assert!(snare.uses_noise());
        assert!((snare.duration() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_ride_detune() {
        let ride = Instrument::Ride.patch();
        let freqs: Vec<f32> = ride.branches[0]
            .sources
            .iter()
            .filter_map(|s| match s {
                SourceSpec::Oscillator {
                    waveform: WaveformType::Square,
                    frequency,
                } => Some(frequency.initial()),
                _ => None,
            })
            .collect();
        assert_eq!(freqs, vec![520.0, 528.0]);
        assert!(!ride.uses_noise());
        assert_eq!(ride.branches[0].filters[0].params.filter_type, FilterType::BandPass);
    }

    #[test]
    fn test_clap_bursts() {
        let clap = Instrument::Clap.patch();
        let GainSpec::Bursts(bursts) = &clap.branches[0].gain else {
            panic!("clap should use bursts");
        };
        let peaks: Vec<f32> = bursts.iter().map(|b| b.peak).collect();
        assert!((peaks[0] - 0.55).abs() < 1e-6);
        assert!((peaks[1] - 0.43).abs() < 1e-6);
        assert!((peaks[2] - 0.31).abs() < 1e-6);

        let curve = clap.branches[0].gain.curve(1.0);
        // First burst peaks after 2 ms
        assert!((curve.value_at(1.002) - 0.55).abs() < 1e-5);
        // Second burst restarts from silence at 18 ms
        assert_eq!(curve.value_at(1.0 + 0.018), 0.0);
        assert!((curve.value_at(1.020) - 0.43).abs() < 1e-5);
    }

    #[test]
    fn test_kick_sweeps() {
        let kick = Instrument::Kick.patch();
        let branch = &kick.branches[0];
        let SourceSpec::Oscillator { frequency, .. } = branch.sources[0] else {
            panic!("kick should be an oscillator");
        };
        let freq = frequency.curve(0.0);
        assert!((freq.value_at(0.0) - 150.0).abs() < 1e-3);
        assert!((freq.value_at(0.14) - 55.0).abs() < 1e-3);

        let cutoff = branch.filters[0].cutoff.curve(0.0);
        assert!((cutoff.value_at(0.18) - 120.0).abs() < 1e-3);
    }
}
