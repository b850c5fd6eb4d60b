use data::{
    controls::{Channel, SampleRate, TimeBase, VoltageRange},
    waveform::Frame,
};

pub mod acquisition;
pub mod consts;
pub mod data;
pub mod device;
pub mod driver;
pub mod scaled_number;

#[derive(Debug)]
pub enum ScopeRunCommand {
    Command(ScopeCommand),
    RunSetting(ScopeRunSetting),
}

impl From<ScopeCommand> for ScopeRunCommand {
    fn from(cmd: ScopeCommand) -> Self {
        Self::Command(cmd)
    }
}
impl From<ScopeRunSetting> for ScopeRunCommand {
    fn from(cmd: ScopeRunSetting) -> Self {
        Self::RunSetting(cmd)
    }
}

/// Changes that reach the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScopeCommand {
    SetSampleRate(SampleRate),
    SetVoltageRange(Channel, VoltageRange),
    /// Only affects how much of the frame a synthetic waveform spans.
    SetTimeBase(TimeBase),
    /// Samples per channel read per frame.
    SetFrameLength(usize),
}

/// Changes to the acquisition loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRunSetting {
    SetRunning(bool),
    /// Acquire one frame, then stop.
    Single,
}

#[derive(Debug)]
pub enum ScopeMessage {
    Frame(Frame),
    Running(bool),
}

/// Device-facing state the acquisition loop keeps in sync with the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfig {
    pub sample_rate: SampleRate,
    pub time_base: TimeBase,
    pub ranges: [VoltageRange; 2],
    pub frame_length: usize,
}

impl AcquisitionConfig {
    pub fn range(&self, ch: Channel) -> VoltageRange {
        self.ranges[ch.index()]
    }

    /// Length of a synthetic frame: what is visible on screen, at most a full frame.
    pub fn synthetic_length(&self) -> usize {
        self.time_base
            .samples_on_screen(self.sample_rate.rate)
            .clamp(1, self.frame_length.max(1))
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        data::settings::ScopeSettings::default().acquisition_config()
    }
}
