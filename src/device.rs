use crate::{
    consts::MAX_FRAME_LENGTH,
    data::{
        controls::{Channel, SampleRate, VoltageRange},
        waveform::RawFrame,
    },
    driver::{
        DriverError, FrameTooLongSnafu, NotOpenSnafu, ScopeDriver, ShortReadSnafu, UsbError,
    },
};
use log::{debug, info, warn};
use rusb::{Device, DeviceHandle, Direction, GlobalContext, Recipient, RequestType};
use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, Snafu};
use std::{fmt::Display, time::Duration};

/// Vendor IDs the 6022 enumerates with once its firmware runs.
pub const VIDS: [u16; 2] = [0x04b5, 0x04b4];
/// 6022BE and 6022BL.
pub const PIDS: [u16; 2] = [0x6022, 0x602a];

const INTERFACE: u8 = 0;
const DATA_ENDPOINT: u8 = 0x86;

const REQ_SET_CH1_RANGE: u8 = 0xe0;
const REQ_SET_CH2_RANGE: u8 = 0xe1;
const REQ_SET_SAMPLE_RATE: u8 = 0xe2;
const REQ_START_CAPTURE: u8 = 0xe3;
const REQ_SET_CHANNEL_COUNT: u8 = 0xe4;

const CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

/// Bytes in one interleaved frame, two per sample.
fn frame_bytes(samples_per_channel: usize) -> Result<usize, DriverError> {
    ensure!(
        samples_per_channel <= MAX_FRAME_LENGTH,
        FrameTooLongSnafu {
            samples: samples_per_channel,
            max: MAX_FRAME_LENGTH,
        }
    );
    Ok(samples_per_channel * 2)
}

/// Where a device sits on the USB tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DeviceId {
    pub bus: u8,
    pub address: u8,
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bus {:03} Device {:03}", self.bus, self.address)
    }
}

impl DeviceId {
    fn of(device: &Device<GlobalContext>) -> Self {
        Self {
            bus: device.bus_number(),
            address: device.address(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub vid: u16,
    pub pid: u16,
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:04x}:{:04x})", self.id, self.vid, self.pid)
    }
}

pub fn is_supported(vid: u16, pid: u16) -> bool {
    VIDS.contains(&vid) && PIDS.contains(&pid)
}

/// All connected scopes, in bus order.
pub fn list_devices() -> Result<Vec<DeviceInfo>, UsbError> {
    let mut found: Vec<DeviceInfo> = matching_devices()?
        .into_iter()
        .map(|(device, vid, pid)| DeviceInfo {
            id: DeviceId::of(&device),
            vid,
            pid,
        })
        .collect();
    found.sort_by_key(|d| d.id);
    Ok(found)
}

fn matching_devices() -> Result<Vec<(Device<GlobalContext>, u16, u16)>, UsbError> {
    let devices = rusb::devices()?;

    Ok(devices
        .iter()
        .filter_map(|device| {
            let descriptor = device.device_descriptor().ok()?;
            let (vid, pid) = (descriptor.vendor_id(), descriptor.product_id());
            is_supported(vid, pid).then_some((device, vid, pid))
        })
        .collect())
}

#[derive(Debug, Snafu)]
pub enum OpenError {
    #[snafu(display("no Hantek 6022 connected"))]
    NoDevice,
    #[snafu(display("{id} is not connected"))]
    NotFound { id: DeviceId },
    #[snafu(context(false))]
    Usb { source: UsbError },
    #[snafu(context(false))]
    Initialization { source: DriverError },
}

impl From<rusb::Error> for OpenError {
    #[track_caller]
    fn from(source: rusb::Error) -> Self {
        OpenError::Usb {
            source: UsbError::from(source),
        }
    }
}

/// A Hantek 6022 running its capture firmware, driven over libusb.
#[derive(Debug)]
pub struct Hantek6022 {
    id: DeviceId,
    handle: Option<DeviceHandle<GlobalContext>>,
    sample_rate: Option<SampleRate>,
}

impl Hantek6022 {
    pub fn open_first() -> Result<Self, OpenError> {
        let (device, _, _) = matching_devices()?
            .into_iter()
            .next()
            .context(NoDeviceSnafu)?;

        Self::from_usb_device(device)
    }

    pub fn open(id: DeviceId) -> Result<Self, OpenError> {
        let (device, _, _) = matching_devices()?
            .into_iter()
            .find(|(device, _, _)| DeviceId::of(device) == id)
            .context(NotFoundSnafu { id })?;

        Self::from_usb_device(device)
    }

    fn from_usb_device(device: Device<GlobalContext>) -> Result<Self, OpenError> {
        let id = DeviceId::of(&device);
        let mut handle = device.open()?;

        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!("{id}: kernel driver auto-detach unavailable: {e}");
        }
        handle.claim_interface(INTERFACE)?;

        let scope = Self {
            id,
            handle: Some(handle),
            sample_rate: None,
        };
        scope.vendor_write(REQ_SET_CHANNEL_COUNT, 2)?;

        info!("opened {id}");
        Ok(scope)
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    fn handle(&self) -> Result<&DeviceHandle<GlobalContext>, DriverError> {
        self.handle.as_ref().context(NotOpenSnafu)
    }

    fn vendor_write(&self, request: u8, value: u8) -> Result<(), DriverError> {
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        self.handle()?
            .write_control(request_type, request, 0, 0, &[value], CONTROL_TIMEOUT)?;
        Ok(())
    }

    fn read_timeout(&self, samples_per_channel: usize) -> Duration {
        let capture = self
            .sample_rate
            .map(|r| Duration::from_secs_f64(samples_per_channel as f64 / r.rate.0))
            .unwrap_or_default();
        CONTROL_TIMEOUT + capture
    }
}

impl ScopeDriver for Hantek6022 {
    fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), DriverError> {
        debug!("{}: sample rate {rate} (0x{:02x})", self.id, rate.code);
        self.vendor_write(REQ_SET_SAMPLE_RATE, rate.code)?;
        self.sample_rate = Some(rate);
        Ok(())
    }

    fn set_voltage_range(
        &mut self,
        channel: Channel,
        range: VoltageRange,
    ) -> Result<(), DriverError> {
        debug!("{}: {channel} range {range} (0x{:02x})", self.id, range.code);
        let request = match channel {
            Channel::Ch1 => REQ_SET_CH1_RANGE,
            Channel::Ch2 => REQ_SET_CH2_RANGE,
        };
        self.vendor_write(request, range.code)
    }

    fn read_raw(&mut self, samples_per_channel: usize) -> Result<RawFrame, DriverError> {
        let len = frame_bytes(samples_per_channel)?;
        let timeout = self.read_timeout(samples_per_channel);
        self.vendor_write(REQ_START_CAPTURE, 0x01)?;

        let handle = self.handle()?;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < buf.len() {
            let n = handle.read_bulk(DATA_ENDPOINT, &mut buf[filled..], timeout)?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        ensure!(
            filled == buf.len(),
            ShortReadSnafu {
                expected: buf.len(),
                got: filled,
            }
        );

        Ok(RawFrame::from_interleaved(&buf))
    }

    fn close(&mut self) -> Result<(), DriverError> {
        let mut handle = self.handle.take().context(NotOpenSnafu)?;
        handle.release_interface(INTERFACE)?;
        info!("closed {}", self.id);
        Ok(())
    }
}

impl Drop for Hantek6022 {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.close() {
                warn!("closing {}: {e}", self.id);
            }
        }
    }
}
