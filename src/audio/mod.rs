// Module audio - Backend CPAL, bus master et horloges

pub mod dsp_utils;
pub mod engine;
pub mod format_conversion;
pub mod mixer;
pub mod output;
pub mod parameters;
pub mod timing;

pub use engine::{AudioEngine, AudioError};
pub use output::{AudioOutput, OfflineOutput, ScheduledVoice};
