// Connection - État du périphérique de sortie

pub mod status;
