use self::{shortcuts::*, utils::focused_channel};
use crate::{
    device_run::{DeviceRun, DeviceRunState},
    device_select::{DeviceList, DeviceSelector},
    optional_sender::OptionalSender,
};
use egui::{
    vec2, Align, Color32, Context, Direction, FontFamily, FontId, Label, Layout, RichText,
    ScrollArea, TextStyle, Ui,
};
use hantek6022::{
    data::{
        controls::Channel,
        measurement::Measurements,
        settings::ScopeSettings,
        waveform::{Frame, FrameSource},
    },
    device::{DeviceId, Hantek6022},
    driver::ScopeDriver,
    ScopeMessage, ScopeRunCommand,
};
use log::info;
use serde::{Deserialize, Serialize};
use snafu::Report;

mod cmds;
mod plot;
mod shortcuts;
mod side_panel;
mod utils;

#[derive(Default)]
pub struct ScopeUiState {
    frame: Frame,
    running: bool,
    measurements: Option<[Measurements; 2]>,
}

/// What to connect to on start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Device(DeviceId),
    /// No device, synthetic frames only.
    Demo,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentState {
    selection: Option<Selection>,
    settings: ScopeSettings,
    show_measurements: bool,
}

#[derive(Default)]
pub struct HantekApp {
    persistent_state: PersistentState,

    ui_state: ScopeUiState,

    last_device_error: Option<String>,
    device_selector: Option<DeviceSelector>,
    device_run: DeviceRunState,
}

impl HantekApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let mut style: egui::Style = (*cc.egui_ctx.style()).clone();
        style.text_styles = [
            (
                TextStyle::Small,
                FontId::new(12.0, FontFamily::Proportional),
            ),
            (TextStyle::Body, FontId::new(16.0, FontFamily::Proportional)),
            (
                TextStyle::Heading,
                FontId::new(22.0, FontFamily::Proportional),
            ),
            (
                TextStyle::Button,
                FontId::new(18.0, FontFamily::Proportional),
            ),
            (
                TextStyle::Monospace,
                FontId::new(16.0, FontFamily::Monospace),
            ),
        ]
        .into();

        style.spacing.item_spacing = vec2(8.0, 6.0);
        cc.egui_ctx.set_style(style);

        let persistent_state: PersistentState = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let egui_ctx = cc.egui_ctx.clone();
        let device_selector = match DeviceSelector::new(move || egui_ctx.request_repaint()) {
            Ok(selector) => Some(selector),
            Err(e) => {
                log::error!("starting device scan: {e}");
                None
            }
        };

        let mut app = HantekApp {
            persistent_state,
            device_selector,
            ..Default::default()
        };

        if let Some(selection) = app.persistent_state.selection {
            app.try_connect(selection, &cc.egui_ctx);
        }

        app
    }
}

impl eframe::App for HantekApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let device_list = match self.device_list_or_fail_ui(ctx) {
            Some(value) => value,
            None => return,
        };

        self.update_device_run();
        let command_tx = match &self.device_run {
            DeviceRunState::Running(run) => Some(run.command_channel().clone()),
            _ => None,
        };

        let command_tx = OptionalSender(command_tx);

        egui::SidePanel::right("side_panel")
            .resizable(true)
            .min_width(280.0)
            .show(ctx, |ui| {
                ui.set_enabled(self.device_run.is_running());
                ScrollArea::vertical().show(ui, |ui| side_panel::ui(self, ui, &command_tx));
            });

        let disconnect = egui::TopBottomPanel::top("top_bar")
            .show(ctx, |ui| self.top_panel_ui(ui))
            .inner;

        if let Some(measurements) = &self.ui_state.measurements {
            egui::TopBottomPanel::bottom("bottom_bar").show(ctx, |ui| {
                ui.set_enabled(self.device_run.is_running());
                bottom_panel_ui(ui, &self.persistent_state.settings, measurements);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.device_run.is_running() {
                self.device_selection_ui(ui, ctx, &device_list);
                return;
            }

            plot::ui(self, ui)
        });

        if self.device_run.is_running() && !ctx.wants_keyboard_input() {
            self.handle_shortcuts(ctx, &command_tx);
        }

        // the device thread only ends once every command sender is gone
        drop(command_tx);
        if disconnect {
            self.disconnect();
        }
    }

    fn persist_egui_memory(&self) -> bool {
        false
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.persistent_state);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.device_run.stop();
    }
}

impl HantekApp {
    fn handle_shortcuts(&mut self, ctx: &egui::Context, cmd: &OptionalSender<ScopeRunCommand>) {
        let settings = &mut self.persistent_state.settings;
        let mut toggle_measurements = false;

        ctx.input_mut(|input| {
            if input.consume_shortcut(&TOGGLE_MEASUREMENT) {
                toggle_measurements = true;
            }
            if input.consume_shortcut(&TOGGLE_RUN) {
                cmd.set_running(!self.ui_state.running);
            }
            if input.consume_shortcut(&SINGLE) {
                cmd.single();
            }

            let ch = focused_channel(settings, input.modifiers);

            if input.key_pressed(ZOOM_IN) || input.raw_scroll_delta.y > 0.0 {
                if input.modifiers.command {
                    if let Some(smaller) = settings.channel(ch).smaller_scale() {
                        cmd.select_volts_per_div(settings, ch, smaller);
                    }
                } else if let Some(faster) = settings.time_base.faster() {
                    cmd.select_time_base(settings, faster);
                }
            }

            if input.key_pressed(ZOOM_OUT) || input.raw_scroll_delta.y < 0.0 {
                if input.modifiers.command {
                    if let Some(larger) = settings.channel(ch).larger_scale() {
                        cmd.select_volts_per_div(settings, ch, larger);
                    }
                } else if let Some(slower) = settings.time_base.slower() {
                    cmd.select_time_base(settings, slower);
                }
            }

            if input.key_pressed(POSITION_UP) {
                utils::move_position(settings.channel_mut(ch), input.modifiers, true);
            }
            if input.key_pressed(POSITION_DOWN) {
                utils::move_position(settings.channel_mut(ch), input.modifiers, false);
            }
        });

        if toggle_measurements {
            self.set_measurements_enabled(!self.persistent_state.show_measurements);
        }
    }

    fn set_measurements_enabled(&mut self, enabled: bool) {
        self.persistent_state.show_measurements = enabled;
        self.ui_state.measurements =
            enabled.then(|| measure(&self.ui_state.frame, &self.persistent_state.settings));
    }

    fn device_list_or_fail_ui(&mut self, ctx: &egui::Context) -> Option<DeviceList> {
        let device_list = if let Some(s) = self.device_selector.as_ref() {
            s.list().clone()
        } else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("Error");
                ui.label("Could not start scanning for devices");

                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            return None;
        };
        Some(device_list)
    }

    fn device_selection_ui(&mut self, ui: &mut Ui, ctx: &Context, device_list: &DeviceList) {
        if let Some(error) = &self.last_device_error {
            ui.heading("Last error");
            ui.label(RichText::new(error).color(Color32::LIGHT_RED));
        }

        ui.heading("Select device");
        let mut selected = None;
        ui.group(|ui| {
            ui.with_layout(Layout::top_down_justified(Align::LEFT), |ui| {
                let devices = device_list.blocking_read();
                if devices.is_empty() {
                    ui.label("No devices found");
                }

                for device in devices.iter() {
                    if ui.selectable_label(false, device.to_string()).clicked() {
                        selected = Some(Selection::Device(device.id));
                    }
                }

                ui.separator();
                if ui.selectable_label(false, "Demo (synthetic)").clicked() {
                    selected = Some(Selection::Demo);
                }
            });
        });

        if let Some(selection) = selected {
            self.persistent_state.selection = Some(selection);
            self.try_connect(selection, ctx);
        }

        if ui.button("Quit").clicked() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn try_connect(&mut self, selection: Selection, ctx: &Context) {
        let driver: Option<Box<dyn ScopeDriver>> = match selection {
            Selection::Device(id) => match Hantek6022::open(id) {
                Ok(scope) => Some(Box::new(scope)),
                Err(e) => {
                    self.last_device_error = Some(Report::from_error(e).to_string());
                    self.device_run = DeviceRunState::Stopped;
                    return;
                }
            },
            Selection::Demo => None,
        };

        let config = self.persistent_state.settings.acquisition_config();
        match DeviceRun::new(driver, ctx, config) {
            Ok(run) => {
                info!("connected to {selection:?}");
                self.last_device_error = None;
                self.ui_state = ScopeUiState {
                    running: true,
                    ..Default::default()
                };
                self.device_run = DeviceRunState::Running(run)
            }
            Err(e) => {
                self.last_device_error = Some(Report::from_error(e).to_string());
                self.device_run = DeviceRunState::Stopped;
            }
        }
    }

    fn disconnect(&mut self) {
        self.device_run.stop();
        // don't reconnect on the next start
        self.persistent_state.selection = None;
    }

    fn update_device_run(&mut self) {
        self.device_run.update();

        match &mut self.device_run {
            DeviceRunState::Stopped => {}
            DeviceRunState::Error(e) => {
                self.last_device_error = Some(Report::from_error(&*e).to_string());
                self.device_run = DeviceRunState::Stopped;
            }
            DeviceRunState::Running(run) => {
                let channel = run.message_channel();

                while let Ok(message) = channel.try_recv() {
                    match message {
                        ScopeMessage::Frame(frame) => {
                            let settings = &self.persistent_state.settings;
                            let state = &mut self.ui_state;
                            if self.persistent_state.show_measurements {
                                state.measurements = Some(measure(&frame, settings));
                            }
                            state.frame = frame;
                        }
                        ScopeMessage::Running(running) => self.ui_state.running = running,
                    }
                }
            }
        }
    }

    /// Returns whether disconnecting was requested.
    fn top_panel_ui(&self, ui: &mut Ui) -> bool {
        if !self.device_run.is_running() {
            return false;
        }

        let frame = &self.ui_state.frame;
        let mut disconnect = false;

        ui.columns(3, |columns| {
            columns[0].with_layout(Layout::left_to_right(Align::Center), |ui| {
                if ui.button("disconnect").clicked() {
                    disconnect = true;
                }
                ui.label(if self.ui_state.running {
                    RichText::new("RUN").color(Color32::GREEN)
                } else {
                    RichText::new("STOP").color(Color32::RED)
                });
            });

            columns[1].with_layout(Layout::centered_and_justified(Direction::TopDown), |ui| {
                match (frame.source, &frame.fault) {
                    (FrameSource::Device, _) => ui.label("Device"),
                    (FrameSource::Synthetic, None) => ui.label("Demo"),
                    (FrameSource::Synthetic, Some(fault)) => ui.label(
                        RichText::new(format!("Synthetic: {fault}")).color(Color32::LIGHT_RED),
                    ),
                }
            });

            columns[2].columns(2, |columns| {
                columns[0].with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.label(frame.sample_rate.to_string());
                });
                columns[1].with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.label(format!("Acq: {}ms", frame.acquisition_duration.as_millis()));
                });
            });
        });

        disconnect
    }
}

fn measure(frame: &Frame, settings: &ScopeSettings) -> [Measurements; 2] {
    Channel::ALL.map(|ch| {
        Measurements::compute(
            &frame.volts[ch.index()],
            frame.sample_rate,
            settings.channel(ch).probe,
        )
    })
}

fn bottom_panel_ui(ui: &mut Ui, settings: &ScopeSettings, measurements: &[Measurements; 2]) {
    for ch in Channel::ALL {
        let channel = settings.channel(ch);
        if !channel.enabled {
            continue;
        }

        let [r, g, b] = channel.color;
        ui.columns(Measurements::MEASUREMENT_COUNT + 1, |cols| {
            cols[0].label(RichText::new(ch.to_string()).color(Color32::from_rgb(r, g, b)));
            for (index, measurement) in measurements[ch.index()]
                .for_display()
                .into_iter()
                .enumerate()
            {
                cols[index + 1].add(Label::new(measurement).wrap(false));
            }
        });
    }
}
