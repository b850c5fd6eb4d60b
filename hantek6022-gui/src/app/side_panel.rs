use super::{utils::clamp_position, HantekApp};
use crate::optional_sender::OptionalSender;
use egui::{Button, ComboBox, DragValue, Ui};
use hantek6022::{
    consts::{GRID_DIVS_VERTICAL, PROBE_ATTENUATIONS, SAMPLE_RATES, TIME_BASES},
    data::{controls::Channel, settings::ScopeSettings},
    ScopeRunCommand,
};

pub(crate) fn ui(app: &mut HantekApp, ui: &mut Ui, command_tx: &OptionalSender<ScopeRunCommand>) {
    ui.add_space(ui.style().spacing.item_spacing.y);

    ui.group(|ui| {
        ui.heading("Horizontal");
        time_base_ui(ui, &mut app.persistent_state.settings, command_tx);
        sample_rate_ui(ui, &mut app.persistent_state.settings, command_tx);

        ui.columns(2, |cols| {
            let running = app.ui_state.running;
            if cols[0]
                .add(Button::new(if running { "Stop" } else { "Run" }))
                .clicked()
            {
                command_tx.set_running(!running);
            }
            if cols[1].button("Single").clicked() {
                command_tx.single();
            }
        });
    });

    for ch in Channel::ALL {
        ui.group(|ui| channel_ui(ui, ch, &mut app.persistent_state.settings, command_tx));
    }

    ui.group(|ui| {
        ui.with_layout(egui::Layout::top_down_justified(egui::Align::LEFT), |ui| {
            let mut show_measurements = app.persistent_state.show_measurements;
            if ui
                .checkbox(&mut show_measurements, "Show measurements")
                .changed()
            {
                app.set_measurements_enabled(show_measurements);
            }
        });
    });
}

fn time_base_ui(
    ui: &mut Ui,
    settings: &mut ScopeSettings,
    command_tx: &OptionalSender<ScopeRunCommand>,
) {
    ui.label("Time base");
    let slower = settings.time_base.slower();
    let faster = settings.time_base.faster();
    let mut selected = settings.time_base.position();

    ui.horizontal_top(|ui| {
        if let Some(slower) = slower {
            if ui.button("out").clicked() {
                command_tx.select_time_base(settings, slower);
            }
        } else {
            ui.add_enabled(false, Button::new("out"));
        }
        if let Some(faster) = faster {
            if ui.button("in").clicked() {
                command_tx.select_time_base(settings, faster);
            }
        } else {
            ui.add_enabled(false, Button::new("in"));
        }

        if ComboBox::from_id_source("time_base")
            .width(150.0)
            .show_index(ui, &mut selected, TIME_BASES.len(), |i| {
                TIME_BASES[i].to_string()
            })
            .changed()
        {
            command_tx.select_time_base(settings, TIME_BASES[selected]);
        }
    });
}

fn sample_rate_ui(
    ui: &mut Ui,
    settings: &mut ScopeSettings,
    command_tx: &OptionalSender<ScopeRunCommand>,
) {
    ui.label("Sample rate");
    let mut selected = SAMPLE_RATES
        .iter()
        .position(|&r| r == settings.sample_rate)
        .unwrap_or(0);

    if ComboBox::from_id_source("sample_rate")
        .width(150.0)
        .show_index(ui, &mut selected, SAMPLE_RATES.len(), |i| {
            SAMPLE_RATES[i].to_string()
        })
        .changed()
    {
        command_tx.select_sample_rate(settings, SAMPLE_RATES[selected]);
    }
}

fn channel_ui(
    ui: &mut Ui,
    ch: Channel,
    settings: &mut ScopeSettings,
    command_tx: &OptionalSender<ScopeRunCommand>,
) {
    ui.horizontal(|ui| {
        ui.heading(ch.to_string());
        ui.checkbox(&mut settings.channel_mut(ch).enabled, "Show");
        ui.color_edit_button_srgb(&mut settings.channel_mut(ch).color);
    });

    vertical_scale_ui(ui, ch, settings, command_tx);

    ui.label("Probe");
    ui.columns(PROBE_ATTENUATIONS.len(), |cols| {
        for (col, probe) in cols.iter_mut().zip(PROBE_ATTENUATIONS) {
            if col
                .selectable_label(settings.channel(ch).probe == probe, probe.to_string())
                .clicked()
            {
                command_tx.select_probe(settings, ch, probe);
            }
        }
    });

    ui.label("Position");
    let half_height = GRID_DIVS_VERTICAL / 2.0;
    let channel = settings.channel_mut(ch);
    if ui
        .add(
            DragValue::new(&mut channel.offset_divs)
                .speed(0.05)
                .clamp_range(-half_height..=half_height)
                .fixed_decimals(2)
                .suffix(" div"),
        )
        .changed()
    {
        channel.offset_divs = clamp_position(channel.offset_divs);
    }
}

fn vertical_scale_ui(
    ui: &mut Ui,
    ch: Channel,
    settings: &mut ScopeSettings,
    command_tx: &OptionalSender<ScopeRunCommand>,
) {
    ui.label("Scale");

    let channel = settings.channel(ch);
    let scales = channel.available_scales();
    let larger = channel.larger_scale();
    let smaller = channel.smaller_scale();
    let mut selected = scales
        .iter()
        .position(|&s| s == channel.volts_per_div)
        .unwrap_or(0);

    ui.horizontal_top(|ui| {
        if let Some(larger) = larger {
            if ui.button("out").clicked() {
                command_tx.select_volts_per_div(settings, ch, larger);
            }
        } else {
            ui.add_enabled(false, Button::new("out"));
        }
        if let Some(smaller) = smaller {
            if ui.button("in").clicked() {
                command_tx.select_volts_per_div(settings, ch, smaller);
            }
        } else {
            ui.add_enabled(false, Button::new("in"));
        }

        if ComboBox::from_id_source(format!("combobox_{ch}_vscale"))
            .width(150.0)
            .show_index(ui, &mut selected, scales.len(), |i| scales[i].to_string())
            .changed()
        {
            if let Some(&scale) = scales.get(selected) {
                command_tx.select_volts_per_div(settings, ch, scale);
            }
        }
    });
}
