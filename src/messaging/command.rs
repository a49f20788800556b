// Types de commandes - Communication contrôle → Audio

use crate::synth::voice::Voice;

pub enum Command {
    /// Start rendering a fully built voice; it carries its own start time
    PlayVoice(Box<Voice>),
    /// Drop every live voice immediately
    StopAll,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::PlayVoice(voice) => f
                .debug_struct("PlayVoice")
                .field("instrument", &voice.instrument())
                .field("start", &voice.start_time())
                .finish(),
            Command::StopAll => f.write_str("StopAll"),
        }
    }
}
