//! The acquire/redraw cycle that runs on the device thread.

use crate::{
    data::{controls::Channel, waveform::Frame},
    driver::{DriverError, ScopeDriver},
    AcquisitionConfig, ScopeCommand, ScopeMessage, ScopeRunCommand, ScopeRunSetting,
};
use log::{debug, info, warn};
use snafu::{Report, ResultExt, Snafu};
use std::time::Duration;
use tokio::{
    sync::mpsc::{self, error::TryRecvError},
    time::Instant,
};

/// Frames are not produced faster than this, which also paces the synthetic fallback.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(40);

#[derive(Debug, Snafu)]
pub enum RunError {
    #[snafu(display("could not set {what}"))]
    Configure { what: String, source: DriverError },
}

/// Acquires frames until either side of the channels goes away.
///
/// Without a driver, or when a read fails, frames carry the synthetic waveform instead.
pub async fn run_acquisition_loop<D: ScopeDriver>(
    mut driver: Option<D>,
    message_tx: mpsc::Sender<ScopeMessage>,
    mut commands_rx: mpsc::Receiver<ScopeRunCommand>,
    mut config: AcquisitionConfig,
    mut notify_updated: impl FnMut(),
) -> Result<(), RunError> {
    if let Some(driver) = driver.as_mut() {
        apply_config(driver, &config)?;
    } else {
        info!("no device, acquiring synthetic frames");
    }

    let mut running = true;
    let mut single = false;

    'main: loop {
        if !running {
            // nothing to acquire, wait for the next command or for the receiver to go away
            let cmd = tokio::select! {
                cmd = commands_rx.recv() => cmd,
                _ = message_tx.closed() => None,
            };
            let Some(cmd) = cmd else {
                break 'main;
            };
            let was_running = running;
            handle_command(cmd, driver.as_mut(), &mut config, &mut running, &mut single)?;
            if running != was_running
                && message_tx.send(ScopeMessage::Running(running)).await.is_err()
            {
                break 'main;
            }
        }

        'commands: loop {
            let cmd = match commands_rx.try_recv() {
                Err(TryRecvError::Disconnected) => break 'main,
                Err(TryRecvError::Empty) => break 'commands,
                Ok(cmd) => cmd,
            };

            let was_running = running;
            handle_command(cmd, driver.as_mut(), &mut config, &mut running, &mut single)?;
            if running != was_running
                && message_tx.send(ScopeMessage::Running(running)).await.is_err()
            {
                break 'main;
            }
        }

        if !running {
            continue 'main;
        }

        let started = Instant::now();
        let frame = acquire(driver.as_mut(), &config, started);

        if message_tx.send(ScopeMessage::Frame(frame)).await.is_err() {
            break 'main;
        }

        if single {
            single = false;
            running = false;
            if message_tx.send(ScopeMessage::Running(false)).await.is_err() {
                break 'main;
            }
        }

        notify_updated();

        tokio::time::sleep_until(started + MIN_FRAME_INTERVAL).await;
    }

    if let Some(driver) = driver.as_mut() {
        if let Err(e) = driver.close() {
            warn!("{}", Report::from_error(e));
        }
    }

    Ok(())
}

fn apply_config<D: ScopeDriver>(driver: &mut D, config: &AcquisitionConfig) -> Result<(), RunError> {
    set_sample_rate(driver, config)?;
    for ch in Channel::ALL {
        set_voltage_range(driver, ch, config)?;
    }
    Ok(())
}

fn set_sample_rate<D: ScopeDriver>(driver: &mut D, config: &AcquisitionConfig) -> Result<(), RunError> {
    let rate = config.sample_rate;
    driver.set_sample_rate(rate).context(ConfigureSnafu {
        what: format!("sample rate {rate}"),
    })
}

fn set_voltage_range<D: ScopeDriver>(
    driver: &mut D,
    ch: Channel,
    config: &AcquisitionConfig,
) -> Result<(), RunError> {
    let range = config.range(ch);
    driver
        .set_voltage_range(ch, range)
        .context(ConfigureSnafu {
            what: format!("{ch} range {range}"),
        })
}

fn handle_command<D: ScopeDriver>(
    cmd: ScopeRunCommand,
    driver: Option<&mut D>,
    config: &mut AcquisitionConfig,
    running: &mut bool,
    single: &mut bool,
) -> Result<(), RunError> {
    debug!("{cmd:?}");

    match cmd {
        ScopeRunCommand::Command(cmd) => {
            match cmd {
                ScopeCommand::SetSampleRate(rate) => {
                    config.sample_rate = rate;
                    if let Some(driver) = driver {
                        set_sample_rate(driver, config)?;
                    }
                }
                ScopeCommand::SetVoltageRange(ch, range) => {
                    config.ranges[ch.index()] = range;
                    if let Some(driver) = driver {
                        set_voltage_range(driver, ch, config)?;
                    }
                }
                ScopeCommand::SetTimeBase(time_base) => config.time_base = time_base,
                ScopeCommand::SetFrameLength(len) => config.frame_length = len,
            }
        }
        ScopeRunCommand::RunSetting(setting) => match setting {
            ScopeRunSetting::SetRunning(run) => {
                *running = run;
                *single = false;
            }
            ScopeRunSetting::Single => {
                *running = true;
                *single = true;
            }
        },
    }

    Ok(())
}

fn acquire<D: ScopeDriver>(driver: Option<&mut D>, config: &AcquisitionConfig, started: Instant) -> Frame {
    let Some(driver) = driver else {
        return Frame::synthetic(config.synthetic_length(), config.sample_rate.rate, None);
    };

    match driver.read_raw(config.frame_length) {
        Ok(raw) => Frame::from_raw(
            &raw,
            config.ranges,
            config.sample_rate.rate,
            started.elapsed(),
        ),
        Err(e) => {
            let report = Report::from_error(e).to_string();
            warn!("acquisition failed, showing synthetic waveform: {report}");
            Frame::synthetic(config.synthetic_length(), config.sample_rate.rate, Some(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        consts::{RANGE_1V, RANGE_500MV, RANGE_5V, SAMPLE_RATES, TIME_BASES},
        data::{
            controls::{SampleRate, VoltageRange},
            settings::ChannelSettings,
            waveform::{display_points, FrameSource, RawFrame},
        },
    };
    use float_cmp::assert_approx_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SampleRate(u8),
        Range(Channel, u8),
        Read(usize),
        Close,
    }

    #[derive(Clone, Default)]
    struct MockDriver {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_reads: bool,
        fail_config: bool,
    }

    impl MockDriver {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<(), DriverError> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl ScopeDriver for MockDriver {
        fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), DriverError> {
            if self.fail_config {
                return Err(DriverError::NotOpen);
            }
            self.record(Call::SampleRate(rate.code))
        }

        fn set_voltage_range(
            &mut self,
            channel: Channel,
            range: VoltageRange,
        ) -> Result<(), DriverError> {
            self.record(Call::Range(channel, range.code))
        }

        fn read_raw(&mut self, samples_per_channel: usize) -> Result<RawFrame, DriverError> {
            self.record(Call::Read(samples_per_channel))?;
            if self.fail_reads {
                return Err(DriverError::ShortRead {
                    expected: samples_per_channel * 2,
                    got: 0,
                });
            }
            Ok(RawFrame {
                ch1: vec![192; samples_per_channel],
                ch2: vec![64; samples_per_channel],
            })
        }

        fn close(&mut self) -> Result<(), DriverError> {
            self.record(Call::Close)
        }
    }

    fn config() -> AcquisitionConfig {
        AcquisitionConfig {
            sample_rate: SAMPLE_RATES[3],
            time_base: TIME_BASES[5],
            ranges: [RANGE_5V, RANGE_1V],
            frame_length: 1024,
        }
    }

    async fn next_frame(rx: &mut mpsc::Receiver<ScopeMessage>) -> Frame {
        loop {
            match rx.recv().await {
                Some(ScopeMessage::Frame(frame)) => return frame,
                Some(ScopeMessage::Running(_)) => continue,
                None => panic!("loop ended"),
            }
        }
    }

    #[tokio::test]
    async fn configures_device_and_converts_frames() {
        let driver = MockDriver::default();
        let (message_tx, mut message_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);

        let run = tokio::spawn(run_acquisition_loop(
            Some(driver.clone()),
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        let frame = next_frame(&mut message_rx).await;
        assert_eq!(frame.source, FrameSource::Device);
        assert_eq!(frame.fault, None);
        assert_eq!(frame.volts[0].len(), 1024);
        assert!(frame.volts[0].iter().all(|&v| v == 2.5));
        assert!(frame.volts[1].iter().all(|&v| v == -0.5));

        drop(command_tx);
        drop(message_rx);
        run.await.unwrap().unwrap();

        let calls = driver.calls();
        assert_eq!(
            calls[..4],
            [
                Call::SampleRate(0x01),
                Call::Range(Channel::Ch1, 0x01),
                Call::Range(Channel::Ch2, 0x05),
                Call::Read(1024),
            ]
        );
        assert_eq!(calls.last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn commands_reach_driver_before_next_read() {
        let driver = MockDriver::default();
        let (message_tx, mut message_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);

        command_tx
            .send(ScopeCommand::SetSampleRate(SAMPLE_RATES[7]).into())
            .await
            .unwrap();
        command_tx
            .send(ScopeCommand::SetVoltageRange(Channel::Ch2, RANGE_500MV).into())
            .await
            .unwrap();
        command_tx
            .send(ScopeCommand::SetFrameLength(2048).into())
            .await
            .unwrap();

        let run = tokio::spawn(run_acquisition_loop(
            Some(driver.clone()),
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        let frame = next_frame(&mut message_rx).await;
        assert_eq!(frame.sample_rate, SAMPLE_RATES[7].rate);
        assert!(frame.volts[1].iter().all(|&v| v == -0.25));

        drop(command_tx);
        drop(message_rx);
        run.await.unwrap().unwrap();

        let calls = driver.calls();
        assert_eq!(
            calls[3..6],
            [
                Call::SampleRate(0x30),
                Call::Range(Channel::Ch2, 0x0A),
                Call::Read(2048),
            ]
        );
    }

    #[tokio::test]
    async fn failed_reads_fall_back_to_synthetic() {
        let driver = MockDriver {
            fail_reads: true,
            ..Default::default()
        };
        let (message_tx, mut message_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);

        let run = tokio::spawn(run_acquisition_loop(
            Some(driver),
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        // 100 µs/div at 1 MSa/s shows 1000 of the 1024 samples
        let frame = next_frame(&mut message_rx).await;
        assert_eq!(frame.source, FrameSource::Synthetic);
        assert_eq!(frame.volts[0].len(), 1000);
        assert!(frame.fault.unwrap().contains("short read"));

        drop(command_tx);
        drop(message_rx);
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn demo_mode_without_driver() {
        let (message_tx, mut message_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);

        let run = tokio::spawn(run_acquisition_loop(
            None::<MockDriver>,
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        let frame = next_frame(&mut message_rx).await;
        assert_eq!(frame.source, FrameSource::Synthetic);
        assert_eq!(frame.fault, None);

        drop(command_tx);
        drop(message_rx);
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn configuration_failure_ends_loop() {
        let driver = MockDriver {
            fail_config: true,
            ..Default::default()
        };
        let (message_tx, _message_rx) = mpsc::channel(4);
        let (_command_tx, command_rx) = mpsc::channel(4);

        let result = run_acquisition_loop(Some(driver), message_tx, command_rx, config(), || {}).await;
        assert!(matches!(result, Err(RunError::Configure { .. })));
    }

    #[tokio::test]
    async fn single_acquires_one_frame_then_stops() {
        let driver = MockDriver::default();
        let (message_tx, mut message_rx) = mpsc::channel(8);
        let (command_tx, command_rx) = mpsc::channel(8);

        command_tx
            .send(ScopeRunSetting::SetRunning(false).into())
            .await
            .unwrap();

        let run = tokio::spawn(run_acquisition_loop(
            Some(driver.clone()),
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        assert!(matches!(message_rx.recv().await, Some(ScopeMessage::Running(false))));

        command_tx.send(ScopeRunSetting::Single.into()).await.unwrap();
        assert!(matches!(message_rx.recv().await, Some(ScopeMessage::Running(true))));
        assert!(matches!(message_rx.recv().await, Some(ScopeMessage::Frame(_))));
        assert!(matches!(message_rx.recv().await, Some(ScopeMessage::Running(false))));

        drop(command_tx);
        run.await.unwrap().unwrap();

        let reads = driver
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Read(_)))
            .count();
        assert_eq!(reads, 1);
    }

    #[tokio::test]
    async fn stopped_loop_ends_when_receiver_is_dropped() {
        let driver = MockDriver::default();
        let (message_tx, mut message_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);
        // the GUI keeps its own sender clone alive while the run is torn down
        let _gui_sender = command_tx.clone();

        command_tx
            .send(ScopeRunSetting::SetRunning(false).into())
            .await
            .unwrap();

        let run = tokio::spawn(run_acquisition_loop(
            Some(driver.clone()),
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        assert!(matches!(message_rx.recv().await, Some(ScopeMessage::Running(false))));

        drop(message_rx);
        drop(command_tx);

        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .expect("stopped loop kept waiting for commands")
            .unwrap()
            .unwrap();
        assert_eq!(driver.calls().last(), Some(&Call::Close));
    }

    #[tokio::test]
    async fn synthetic_waveform_spans_visible_screen() {
        let (message_tx, mut message_rx) = mpsc::channel(4);
        let (command_tx, command_rx) = mpsc::channel(4);

        let run = tokio::spawn(run_acquisition_loop(
            None::<MockDriver>,
            message_tx,
            command_rx,
            config(),
            || {},
        ));

        let frame = next_frame(&mut message_rx).await;
        let ch = ChannelSettings::default();
        let points = display_points(&frame.volts[0], frame.sample_rate, TIME_BASES[5], &ch);
        assert_eq!(points.len(), frame.volts[0].len());
        assert_approx_eq!(f64, frame.volts[0][999], 0.0, epsilon = 1e-12);

        // 1 µs/div at 1 MSa/s shows 10 samples
        command_tx
            .send(ScopeCommand::SetTimeBase(TIME_BASES[11]).into())
            .await
            .unwrap();
        let frame = loop {
            let frame = next_frame(&mut message_rx).await;
            if frame.volts[0].len() != 1000 {
                break frame;
            }
        };
        assert_eq!(frame.volts[0].len(), 10);
        assert_approx_eq!(f64, frame.volts[0][9], 0.0, epsilon = 1e-12);

        drop(command_tx);
        drop(message_rx);
        run.await.unwrap().unwrap();
    }
}
