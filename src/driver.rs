use crate::data::{
    controls::{Channel, SampleRate, VoltageRange},
    waveform::RawFrame,
};
use snafu::{Location, Snafu};

/// What the acquisition loop needs from a scope. Opening is up to the implementation.
pub trait ScopeDriver: Send {
    fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), DriverError>;

    fn set_voltage_range(
        &mut self,
        channel: Channel,
        range: VoltageRange,
    ) -> Result<(), DriverError>;

    /// Captures `samples_per_channel` samples of both channels.
    fn read_raw(&mut self, samples_per_channel: usize) -> Result<RawFrame, DriverError>;

    /// Releases the device. Every later call fails with [`DriverError::NotOpen`].
    fn close(&mut self) -> Result<(), DriverError>;
}

impl<D: ScopeDriver + ?Sized> ScopeDriver for Box<D> {
    fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), DriverError> {
        (**self).set_sample_rate(rate)
    }

    fn set_voltage_range(
        &mut self,
        channel: Channel,
        range: VoltageRange,
    ) -> Result<(), DriverError> {
        (**self).set_voltage_range(channel, range)
    }

    fn read_raw(&mut self, samples_per_channel: usize) -> Result<RawFrame, DriverError> {
        (**self).read_raw(samples_per_channel)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        (**self).close()
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DriverError {
    #[snafu(context(false))]
    Usb { source: UsbError },
    #[snafu(display("device is closed"))]
    NotOpen,
    #[snafu(display("{samples} samples per channel is more than the {max} a frame holds"))]
    FrameTooLong { samples: usize, max: usize },
    #[snafu(display("short read: expected {expected} bytes, got {got}"))]
    ShortRead { expected: usize, got: usize },
}

impl From<rusb::Error> for DriverError {
    #[track_caller]
    fn from(source: rusb::Error) -> Self {
        DriverError::Usb {
            source: UsbError::from(source),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(context(false), display("USB error at {location}"))]
pub struct UsbError {
    #[snafu(implicit)]
    location: Location,
    source: rusb::Error,
}
