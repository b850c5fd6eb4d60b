pub mod controls;
pub mod measurement;
pub mod settings;
pub mod units;
pub mod waveform;
