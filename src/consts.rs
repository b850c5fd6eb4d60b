mod attenuation;
mod sample_rates;
mod time_bases;
mod voltage_ranges;
mod vscale;

pub use attenuation::PROBE_ATTENUATIONS;
pub use sample_rates::SAMPLE_RATES;
pub use time_bases::{DEFAULT_TIME_BASE, TIME_BASES};
pub use voltage_ranges::{RANGE_1V, RANGE_2V5, RANGE_500MV, RANGE_5V, VOLTAGE_RANGES};
pub use vscale::{DEFAULT_VERTICAL_SCALE, VERTICAL_SCALES};

/// Graticule size
pub const GRID_DIVS_HORIZONTAL: f64 = 10.0;
pub const GRID_DIVS_VERTICAL: f64 = 8.0;

/// Bulk transfers are issued in whole blocks of this many samples per channel.
pub const FRAME_BLOCK: usize = 512;
pub const MIN_FRAME_LENGTH: usize = 1024;
pub const MAX_FRAME_LENGTH: usize = 128 * 1024;
