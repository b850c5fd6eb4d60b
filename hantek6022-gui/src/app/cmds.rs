use crate::optional_sender::OptionalSender;
use hantek6022::{
    data::{
        controls::{Channel, SampleRate, TimeBase, VerticalScale, VoltageRange},
        settings::ScopeSettings,
        units::ProbeAttenuation,
    },
    ScopeCommand, ScopeRunCommand, ScopeRunSetting,
};

impl OptionalSender<ScopeRunCommand> {
    pub fn set_sample_rate(&self, rate: SampleRate) {
        self.send(ScopeCommand::SetSampleRate(rate));
    }

    pub fn set_voltage_range(&self, channel: Channel, range: VoltageRange) {
        self.send(ScopeCommand::SetVoltageRange(channel, range));
    }

    pub fn set_time_base(&self, time_base: TimeBase) {
        self.send(ScopeCommand::SetTimeBase(time_base));
    }

    pub fn set_frame_length(&self, samples_per_channel: usize) {
        self.send(ScopeCommand::SetFrameLength(samples_per_channel));
    }

    pub fn set_running(&self, running: bool) {
        self.send(ScopeRunSetting::SetRunning(running));
    }

    pub fn single(&self) {
        self.send(ScopeRunSetting::Single);
    }

    pub fn select_time_base(&self, settings: &mut ScopeSettings, time_base: TimeBase) {
        let (old_time_base, old_rate, old_length) =
            (settings.time_base, settings.sample_rate, settings.frame_length());
        let rate = settings.select_time_base(time_base);
        if time_base != old_time_base {
            self.set_time_base(time_base);
        }
        if rate != old_rate {
            self.set_sample_rate(rate);
        }
        self.send_frame_length_change(old_length, settings);
    }

    pub fn select_sample_rate(&self, settings: &mut ScopeSettings, rate: SampleRate) {
        let old_length = settings.frame_length();
        settings.select_sample_rate(rate);
        self.set_sample_rate(rate);
        self.send_frame_length_change(old_length, settings);
    }

    pub fn select_volts_per_div(
        &self,
        settings: &mut ScopeSettings,
        channel: Channel,
        scale: VerticalScale,
    ) {
        if let Some(range) = settings.channel_mut(channel).select_volts_per_div(scale) {
            self.set_voltage_range(channel, range);
        }
    }

    pub fn select_probe(
        &self,
        settings: &mut ScopeSettings,
        channel: Channel,
        probe: ProbeAttenuation,
    ) {
        if let Some(range) = settings.channel_mut(channel).select_probe(probe) {
            self.set_voltage_range(channel, range);
        }
    }

    fn send_frame_length_change(&self, old_length: usize, settings: &ScopeSettings) {
        let length = settings.frame_length();
        if length != old_length {
            self.set_frame_length(length);
        }
    }
}
