use super::{
    controls::{TimeBase, VoltageRange},
    settings::ChannelSettings,
    units::SamplingRate,
};
use crate::consts::GRID_DIVS_HORIZONTAL;
use std::{f64::consts::PI, time::Duration};

/// Samples as read from the device, one byte per sample and channel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub ch1: Vec<u8>,
    pub ch2: Vec<u8>,
}

impl RawFrame {
    /// Splits the device's `CH1, CH2, CH1, ...` byte stream. A trailing odd byte is dropped.
    pub fn from_interleaved(data: &[u8]) -> Self {
        let pairs = data.chunks_exact(2);
        let mut frame = RawFrame {
            ch1: Vec::with_capacity(pairs.len()),
            ch2: Vec::with_capacity(pairs.len()),
        };
        for pair in pairs {
            frame.ch1.push(pair[0]);
            frame.ch2.push(pair[1]);
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.ch1.len().min(self.ch2.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_volts(&self, ranges: [VoltageRange; 2]) -> [Vec<f64>; 2] {
        [
            raw_to_volts(&self.ch1, ranges[0]),
            raw_to_volts(&self.ch2, ranges[1]),
        ]
    }
}

/// Applies the nominal calibration of `range` to each byte.
pub fn raw_to_volts(raw: &[u8], range: VoltageRange) -> Vec<f64> {
    raw.iter().map(|&b| range.to_volts(b)).collect()
}

/// Hardcoded waveform shown when nothing could be read: `sin(2πt) / 2πt` over `t` in
/// `0.01..6.0`, one volt peak.
pub fn synthetic_volts(len: usize) -> Vec<f64> {
    const START: f64 = 0.01;
    const END: f64 = 6.0;

    let step = if len > 1 {
        (END - START) / (len - 1) as f64
    } else {
        0.0
    };

    (0..len)
        .map(|i| {
            let x = 2.0 * PI * (START + i as f64 * step);
            x.sin() / x
        })
        .collect()
}

/// Maps samples to screen coordinates in divisions.
///
/// X runs from `-5` (first sample) to `+5` (right edge), samples past the right edge are
/// dropped. Y is the probe-corrected voltage divided by the channel's volts/div, shifted by the
/// channel position.
pub fn display_points(
    volts: &[f64],
    sample_rate: SamplingRate,
    time_base: TimeBase,
    channel: &ChannelSettings,
) -> Vec<[f64; 2]> {
    let half_width = GRID_DIVS_HORIZONTAL / 2.0;
    let divs_per_sample = sample_rate.period().0 / time_base.per_div.0;
    let gain = channel.probe.factor() / channel.volts_per_div.per_div.0;

    volts
        .iter()
        .enumerate()
        .map(|(i, v)| [i as f64 * divs_per_sample - half_width, v * gain + channel.offset_divs])
        .take_while(|[x, _]| *x <= half_width)
        .collect()
}

/// Converts a screen position back to the probe-side voltage of a channel.
pub fn divs_to_volts(y_divs: f64, channel: &ChannelSettings) -> f64 {
    (y_divs - channel.offset_divs) * channel.volts_per_div.per_div.0
}

/// Converts a screen position to the time since the first sample.
pub fn divs_to_time(x_divs: f64, time_base: TimeBase) -> f64 {
    (x_divs + GRID_DIVS_HORIZONTAL / 2.0) * time_base.per_div.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameSource {
    #[default]
    Device,
    Synthetic,
}

/// One acquisition of both channels in volts at the scope input, before probe correction.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub source: FrameSource,
    pub sample_rate: SamplingRate,
    pub volts: [Vec<f64>; 2],
    pub acquisition_duration: Duration,
    /// Why the device could not deliver this frame, if it didn't.
    pub fault: Option<String>,
}

impl Frame {
    pub fn from_raw(
        raw: &RawFrame,
        ranges: [VoltageRange; 2],
        sample_rate: SamplingRate,
        acquisition_duration: Duration,
    ) -> Self {
        Self {
            source: FrameSource::Device,
            sample_rate,
            volts: raw.to_volts(ranges),
            acquisition_duration,
            fault: None,
        }
    }

    pub fn synthetic(len: usize, sample_rate: SamplingRate, fault: Option<String>) -> Self {
        let volts = synthetic_volts(len);
        Self {
            source: FrameSource::Synthetic,
            sample_rate,
            volts: [volts.clone(), volts],
            acquisition_duration: Duration::ZERO,
            fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consts::{RANGE_1V, RANGE_5V, TIME_BASES},
        data::{controls::VerticalScale, units::{ProbeAttenuation, Voltage}},
    };
    use float_cmp::assert_approx_eq;

    fn channel(volts_per_div: f64, probe: ProbeAttenuation, offset_divs: f64) -> ChannelSettings {
        ChannelSettings {
            volts_per_div: VerticalScale::from_per_div(Voltage(volts_per_div)).unwrap(),
            probe,
            offset_divs,
            ..Default::default()
        }
    }

    #[test]
    fn deinterleaves_channels() {
        let frame = RawFrame::from_interleaved(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(frame.ch1, [1, 3, 5]);
        assert_eq!(frame.ch2, [2, 4, 6]);
        assert_eq!(frame.len(), 3);
        assert!(RawFrame::from_interleaved(&[9]).is_empty());
    }

    #[test]
    fn converts_each_channel_with_its_range() {
        let frame = RawFrame {
            ch1: vec![128, 192],
            ch2: vec![0, 128],
        };
        let [ch1, ch2] = frame.to_volts([RANGE_5V, RANGE_1V]);
        assert_eq!(ch1, [0.0, 2.5]);
        assert_eq!(ch2, [-1.0, 0.0]);
    }

    #[test]
    fn synthetic_waveform_is_sinc() {
        let volts = synthetic_volts(600);
        assert_eq!(volts.len(), 600);
        let first = (2.0 * PI * 0.01).sin() / (2.0 * PI * 0.01);
        assert_approx_eq!(f64, volts[0], first, ulps = 2);
        assert!(volts[0] > 0.99);
        assert!(volts.iter().all(|v| v.abs() <= 1.0));
        assert_approx_eq!(f64, volts[599], 0.0, epsilon = 1e-12);

        assert_eq!(synthetic_volts(1).len(), 1);
        assert!(synthetic_volts(0).is_empty());
    }

    #[test]
    fn positions_samples_in_divisions() {
        // 1 µs/div at 1 MSa/s: one sample per division
        let tb = TIME_BASES[11];
        let ch = channel(2.0, ProbeAttenuation::X1, 1.0);
        let points = display_points(&[0.0, 2.0, -4.0], SamplingRate(1e6), tb, &ch);

        assert_eq!(points.len(), 3);
        assert_approx_eq!(f64, points[0][0], -5.0, ulps = 4);
        assert_approx_eq!(f64, points[1][0], -4.0, epsilon = 1e-9);
        assert_approx_eq!(f64, points[0][1], 1.0, ulps = 4);
        assert_approx_eq!(f64, points[1][1], 2.0, ulps = 4);
        assert_approx_eq!(f64, points[2][1], -1.0, ulps = 4);
    }

    #[test]
    fn probe_factor_scales_display() {
        let tb = TIME_BASES[11];
        let ch = channel(10.0, ProbeAttenuation::X10, 0.0);
        let points = display_points(&[1.0], SamplingRate(1e6), tb, &ch);
        assert_approx_eq!(f64, points[0][1], 1.0, ulps = 4);
    }

    #[test]
    fn drops_samples_past_right_edge() {
        let tb = TIME_BASES[11];
        let ch = ChannelSettings::default();
        let points = display_points(&[0.0; 100], SamplingRate(1e6), tb, &ch);
        assert_eq!(points.len(), 11);
    }

    #[test]
    fn screen_positions_map_back() {
        let tb = TIME_BASES[11];
        let ch = channel(0.5, ProbeAttenuation::X1, 2.0);
        assert_approx_eq!(f64, divs_to_volts(3.0, &ch), 0.5, ulps = 4);
        assert_approx_eq!(f64, divs_to_time(0.0, tb), 5e-6, epsilon = 1e-15);
    }

    #[test]
    fn synthetic_frame_fills_both_channels() {
        let frame = Frame::synthetic(1024, SamplingRate(1e6), Some("no device".into()));
        assert_eq!(frame.source, FrameSource::Synthetic);
        assert_eq!(frame.volts[0], frame.volts[1]);
        assert_eq!(frame.volts[0].len(), 1024);
        assert_eq!(frame.fault.as_deref(), Some("no device"));
    }
}
