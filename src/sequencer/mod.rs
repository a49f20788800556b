// Sequencer module
// Take recording, grid quantization and the playback schedule

pub mod metronome;
pub mod quantize;
pub mod scheduler;
pub mod take;
pub mod transport;

pub use metronome::{Metronome, MetronomeToken, Tempo};
pub use quantize::quantize_ms;
pub use take::{Event, Take};
pub use transport::{PlaybackPlan, Sequencer, SequencerAction, SequencerError, SequencerState};
