// Module synthèse - Instruments de batterie et chaîne d'effets

pub mod automation;
pub mod compressor;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod filter;
pub mod instruments;
pub mod kit;
pub mod noise;
pub mod oscillator;
pub mod voice;
