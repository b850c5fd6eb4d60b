use egui::Context;
use hantek6022::{
    acquisition::{run_acquisition_loop, RunError},
    driver::ScopeDriver,
    AcquisitionConfig, ScopeMessage, ScopeRunCommand,
};
use log::error;
use std::thread;
use tokio::{sync::mpsc, task::LocalSet};

#[derive(Debug, Default)]
pub enum DeviceRunState {
    #[default]
    Stopped,
    Running(DeviceRun),
    Error(RunError),
}

impl DeviceRunState {
    pub fn is_running(&self) -> bool {
        matches!(self, DeviceRunState::Running(_))
    }

    pub fn update(&mut self) {
        if let DeviceRunState::Running(run) = self {
            if !run.is_active() {
                match run.join() {
                    None | Some(Ok(_)) => *self = DeviceRunState::Stopped,
                    Some(Err(e)) => *self = DeviceRunState::Error(e),
                }
            }
        }
    }

    pub fn stop(&mut self) {
        if let DeviceRunState::Running(run) = self {
            let thread = run.data_thread.take();
            // dropping the run, including the channels, makes the loop exit after its current frame
            *self = DeviceRunState::Stopped;
            if let Some(Err(e)) = thread.and_then(join_logged) {
                *self = DeviceRunState::Error(e);
            }
        }
    }
}

#[derive(Debug)]
pub struct DeviceRun {
    data_thread: Option<thread::JoinHandle<Result<(), RunError>>>,
    message_rx: mpsc::Receiver<ScopeMessage>,
    command_tx: mpsc::Sender<ScopeRunCommand>,
}

impl DeviceRun {
    /// Starts acquiring on a dedicated thread. Without a driver the thread produces the synthetic
    /// waveform.
    pub fn new(
        driver: Option<Box<dyn ScopeDriver>>,
        egui_ctx: &Context,
        config: AcquisitionConfig,
    ) -> std::io::Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let (message_tx, message_rx) = mpsc::channel(32);
        let (command_tx, command_rx) = mpsc::channel(32);

        let egui_ctx = egui_ctx.clone();
        let data_thread = thread::Builder::new()
            .name("device-io".into())
            .spawn(move || {
                let local = LocalSet::new();

                let run = local.run_until(async move {
                    run_acquisition_loop(driver, message_tx, command_rx, config, move || {
                        egui_ctx.request_repaint()
                    })
                    .await
                });

                rt.block_on(run)
            })?;

        Ok(Self {
            data_thread: Some(data_thread),
            message_rx,
            command_tx,
        })
    }

    pub fn is_active(&self) -> bool {
        !self
            .data_thread
            .as_ref()
            .map(|t| t.is_finished())
            .unwrap_or(true)
    }

    pub fn join(&mut self) -> Option<Result<(), RunError>> {
        self.data_thread.take().and_then(join_logged)
    }

    pub fn command_channel(&self) -> &mpsc::Sender<ScopeRunCommand> {
        &self.command_tx
    }

    pub fn message_channel(&mut self) -> &mut mpsc::Receiver<ScopeMessage> {
        &mut self.message_rx
    }
}

fn join_logged(
    thread: thread::JoinHandle<Result<(), RunError>>,
) -> Option<Result<(), RunError>> {
    match thread.join() {
        Ok(result) => Some(result),
        Err(_) => {
            error!("device thread panicked");
            None
        }
    }
}
