use super::{
    controls::{Channel, SampleRate, TimeBase, VerticalScale, VoltageRange},
    units::{ProbeAttenuation, Voltage},
};
use crate::{
    consts::{
        DEFAULT_TIME_BASE, DEFAULT_VERTICAL_SCALE, FRAME_BLOCK, MAX_FRAME_LENGTH, MIN_FRAME_LENGTH, VERTICAL_SCALES,
    },
    AcquisitionConfig,
};
use serde::{Deserialize, Serialize};

/// Everything the control panel lets the user pick.
///
/// Missing fields load as defaults. A missing sample rate follows the timebase, and each
/// channel's scale is brought back in line with its attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredSettings")]
pub struct ScopeSettings {
    pub time_base: TimeBase,
    pub sample_rate: SampleRate,
    pub channels: [ChannelSettings; 2],
}

/// Persisted form of [`ScopeSettings`]; every field may be missing.
#[derive(Deserialize)]
#[serde(default)]
struct StoredSettings {
    time_base: TimeBase,
    sample_rate: Option<SampleRate>,
    channels: [ChannelSettings; 2],
}

impl Default for StoredSettings {
    fn default() -> Self {
        let defaults = ScopeSettings::default();
        Self {
            time_base: defaults.time_base,
            sample_rate: None,
            channels: defaults.channels,
        }
    }
}

impl From<StoredSettings> for ScopeSettings {
    fn from(stored: StoredSettings) -> Self {
        let mut settings = ScopeSettings {
            time_base: stored.time_base,
            sample_rate: stored
                .sample_rate
                .unwrap_or_else(|| stored.time_base.sample_rate()),
            channels: stored.channels,
        };
        for channel in &mut settings.channels {
            channel.select_probe(channel.probe);
        }
        settings
    }
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            time_base: DEFAULT_TIME_BASE,
            sample_rate: DEFAULT_TIME_BASE.sample_rate(),
            channels: [
                ChannelSettings::default(),
                ChannelSettings {
                    color: ChannelSettings::CH2_COLOR,
                    offset_divs: -2.0,
                    ..Default::default()
                },
            ],
        }
    }
}

impl ScopeSettings {
    pub fn channel(&self, ch: Channel) -> &ChannelSettings {
        &self.channels[ch.index()]
    }

    pub fn channel_mut(&mut self, ch: Channel) -> &mut ChannelSettings {
        &mut self.channels[ch.index()]
    }

    /// Switches the timebase along with the sample rate mapped to it.
    pub fn select_time_base(&mut self, time_base: TimeBase) -> SampleRate {
        self.time_base = time_base;
        self.sample_rate = time_base.sample_rate();
        self.sample_rate
    }

    /// Overrides the sample rate while keeping the timebase.
    pub fn select_sample_rate(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
    }

    /// Samples per channel needed to cover the screen, rounded up to whole transfer blocks.
    pub fn frame_length(&self) -> usize {
        self.time_base
            .samples_on_screen(self.sample_rate.rate)
            .div_ceil(FRAME_BLOCK)
            .saturating_mul(FRAME_BLOCK)
            .clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
    }

    pub fn acquisition_config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            sample_rate: self.sample_rate,
            time_base: self.time_base,
            ranges: self.channels.map(|c| c.voltage_range()),
            frame_length: self.frame_length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub enabled: bool,
    pub volts_per_div: VerticalScale,
    pub probe: ProbeAttenuation,
    /// Trace color as sRGB.
    pub color: [u8; 3],
    /// Vertical position of the ground level, in divisions from the center line.
    pub offset_divs: f64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volts_per_div: DEFAULT_VERTICAL_SCALE,
            probe: ProbeAttenuation::X1,
            color: Self::CH1_COLOR,
            offset_divs: 2.0,
        }
    }
}

impl ChannelSettings {
    pub const CH1_COLOR: [u8; 3] = [255, 255, 0];
    pub const CH2_COLOR: [u8; 3] = [0, 200, 255];

    pub fn voltage_range(&self) -> VoltageRange {
        self.volts_per_div.range
    }

    /// Returns the new voltage range if it changed.
    pub fn select_volts_per_div(&mut self, scale: VerticalScale) -> Option<VoltageRange> {
        let old = self.voltage_range();
        self.volts_per_div = scale;
        (old != scale.range).then_some(scale.range)
    }

    /// Switches the probe, moving the scale back to 1 V/div if the probe doesn't offer it.
    ///
    /// Returns the new voltage range if it changed.
    pub fn select_probe(&mut self, probe: ProbeAttenuation) -> Option<VoltageRange> {
        self.probe = probe;

        let out_of_range = if probe == ProbeAttenuation::X10 {
            self.volts_per_div.per_div.0 < 1.0
        } else {
            self.volts_per_div.per_div.0 > 5.0
        };

        if out_of_range {
            let one_volt = VerticalScale::from_per_div(Voltage(1.0)).unwrap_or(DEFAULT_VERTICAL_SCALE);
            self.select_volts_per_div(one_volt)
        } else {
            None
        }
    }

    pub fn available_scales(&self) -> Vec<VerticalScale> {
        VERTICAL_SCALES
            .into_iter()
            .filter(|s| s.valid_for(self.probe))
            .collect()
    }

    /// The next larger scale (zoom out) offered with the current probe.
    pub fn larger_scale(&self) -> Option<VerticalScale> {
        let scales = self.available_scales();
        let pos = scales.iter().position(|s| *s == self.volts_per_div)?;
        pos.checked_sub(1).map(|i| scales[i])
    }

    /// The next smaller scale (zoom in) offered with the current probe.
    pub fn smaller_scale(&self) -> Option<VerticalScale> {
        let scales = self.available_scales();
        let pos = scales.iter().position(|s| *s == self.volts_per_div)?;
        scales.get(pos + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{RANGE_1V, RANGE_2V5, RANGE_5V, SAMPLE_RATES, TIME_BASES};

    fn scale(v: f64) -> VerticalScale {
        VerticalScale::from_per_div(Voltage(v)).unwrap()
    }

    #[test]
    fn defaults_match_startup_panel() {
        let settings = ScopeSettings::default();
        assert_eq!(settings.time_base.to_string(), "5 µs/div");
        assert_eq!(settings.sample_rate.code, 0x10);
        for ch in settings.channels {
            assert_eq!(ch.volts_per_div.per_div, Voltage(2.0));
            assert_eq!(ch.probe, ProbeAttenuation::X1);
            assert_eq!(ch.voltage_range(), RANGE_5V);
        }
    }

    #[test]
    fn time_base_selects_mapped_sample_rate() {
        let mut settings = ScopeSettings::default();
        let rate = settings.select_time_base(TIME_BASES[3]);
        assert_eq!(rate.code, 0x14);
        assert_eq!(settings.sample_rate, rate);

        settings.select_sample_rate(SAMPLE_RATES[7]);
        assert_eq!(settings.time_base, TIME_BASES[3]);
        assert_eq!(settings.sample_rate.code, 0x30);
    }

    #[test]
    fn frame_length_covers_screen_in_blocks() {
        let mut settings = ScopeSettings::default();

        // 5 ms/div at 100 kSa/s: 5000 samples
        settings.select_time_base(TIME_BASES[0]);
        assert_eq!(settings.frame_length(), 5120);

        // 100 ns/div at 24 MSa/s: 24 samples
        settings.select_time_base(TIME_BASES[14]);
        assert_eq!(settings.frame_length(), MIN_FRAME_LENGTH);

        // 5 ms/div at 24 MSa/s would need 1.2M samples
        settings.select_time_base(TIME_BASES[0]);
        settings.select_sample_rate(SAMPLE_RATES[7]);
        assert_eq!(settings.frame_length(), MAX_FRAME_LENGTH);
    }

    #[test]
    fn volts_per_div_maps_to_range() {
        let mut ch = ChannelSettings::default();
        assert_eq!(ch.select_volts_per_div(scale(1.0)), Some(RANGE_2V5));
        assert_eq!(ch.select_volts_per_div(scale(0.5)), Some(RANGE_1V));
        assert_eq!(ch.select_volts_per_div(scale(0.5)), None);
        assert_eq!(ch.voltage_range().code, 0x05);
    }

    #[test]
    fn x10_probe_forces_at_least_one_volt() {
        let mut ch = ChannelSettings::default();
        ch.select_volts_per_div(scale(0.2));
        assert_eq!(ch.select_probe(ProbeAttenuation::X10), Some(RANGE_2V5));
        assert_eq!(ch.volts_per_div, scale(1.0));

        let mut ch = ChannelSettings::default();
        assert_eq!(ch.select_probe(ProbeAttenuation::X10), None);
        assert_eq!(ch.volts_per_div, scale(2.0));
    }

    #[test]
    fn x1_probe_resets_large_scales_to_one_volt() {
        let mut ch = ChannelSettings::default();
        ch.select_probe(ProbeAttenuation::X10);
        ch.select_volts_per_div(scale(20.0));
        assert_eq!(ch.select_probe(ProbeAttenuation::X1), Some(RANGE_2V5));
        assert_eq!(ch.volts_per_div, scale(1.0));

        ch.select_volts_per_div(scale(5.0));
        assert_eq!(ch.select_probe(ProbeAttenuation::X1), None);
        assert_eq!(ch.volts_per_div, scale(5.0));
    }

    #[test]
    fn zoom_steps_stay_within_probe_scales() {
        let mut ch = ChannelSettings::default();
        ch.select_volts_per_div(scale(5.0));
        assert_eq!(ch.larger_scale(), None);
        assert_eq!(ch.smaller_scale(), Some(scale(2.0)));

        ch.select_probe(ProbeAttenuation::X10);
        assert_eq!(ch.larger_scale(), Some(scale(10.0)));
        ch.select_volts_per_div(scale(1.0));
        assert_eq!(ch.smaller_scale(), None);
    }

    #[test]
    fn acquisition_config_follows_channels() {
        let mut settings = ScopeSettings::default();
        settings.channel_mut(Channel::Ch2).select_volts_per_div(scale(0.5));
        let config = settings.acquisition_config();
        assert_eq!(config.ranges, [RANGE_5V, RANGE_1V]);
        assert_eq!(config.sample_rate.code, 0x10);
        assert_eq!(config.frame_length, settings.frame_length());
    }

    #[test]
    fn persisted_form_is_readable() {
        let settings = ScopeSettings::default();
        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(json["time_base"], "5 µs/div");
        assert_eq!(json["sample_rate"], "16 MSa/s");
        assert_eq!(json["channels"][0]["volts_per_div"], "2 V/div");
        assert_eq!(json["channels"][1]["probe"], "x1");

        let back: ScopeSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: ScopeSettings =
            serde_json::from_str(r#"{ "time_base": "1 ms/div" }"#).unwrap();
        assert_eq!(settings.time_base, TIME_BASES[2]);
        assert_eq!(settings.channels, ScopeSettings::default().channels);
    }

    #[test]
    fn loading_moves_scale_into_x10_range() {
        let settings: ScopeSettings = serde_json::from_str(
            r#"{ "channels": [{ "probe": "x10", "volts_per_div": "100 mV/div" }, {}] }"#,
        )
        .unwrap();

        let ch = settings.channel(Channel::Ch1);
        assert_eq!(ch.probe, ProbeAttenuation::X10);
        assert_eq!(ch.volts_per_div, scale(1.0));
        assert!(ch.available_scales().contains(&ch.volts_per_div));
        assert_eq!(ch.larger_scale(), Some(scale(2.0)));
        assert_eq!(ch.smaller_scale(), None);
        assert_eq!(settings.acquisition_config().ranges[0], RANGE_2V5);
    }

    #[test]
    fn loading_without_sample_rate_uses_mapped_rate() {
        let settings: ScopeSettings =
            serde_json::from_str(r#"{ "time_base": "5 ms/div" }"#).unwrap();
        assert_eq!(settings.time_base, TIME_BASES[0]);
        assert_eq!(settings.sample_rate.code, 0x0A);

        // an explicit override survives
        let settings: ScopeSettings = serde_json::from_str(
            r#"{ "time_base": "5 ms/div", "sample_rate": "24 MSa/s" }"#,
        )
        .unwrap();
        assert_eq!(settings.sample_rate, SAMPLE_RATES[7]);
    }
}
