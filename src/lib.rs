// Drumkit - Procedural drum synthesis with a record/quantize/playback sequencer

pub mod audio;
pub mod config;
pub mod connection;
pub mod machine;
pub mod messaging;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use audio::engine::{AudioEngine, AudioError};
pub use audio::output::{AudioOutput, OfflineOutput};
pub use audio::parameters::FeatureFlags;
pub use audio::timing::{AudioTiming, Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, EngineConfig};
pub use machine::DrumMachine;
pub use messaging::channels::{create_command_channel, create_notification_channel};
pub use sequencer::{Sequencer, SequencerError, SequencerState, quantize_ms};
pub use synth::effect::{FxChain, Signal};
pub use synth::instruments::Instrument;
pub use synth::kit::DrumKit;
pub use synth::voice::Voice;
