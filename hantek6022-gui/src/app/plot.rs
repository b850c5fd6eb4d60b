use super::HantekApp;
use egui::{Color32, Ui, Vec2};
use egui_plot::{GridInput, GridMark, HLine, Line, LineStyle, Plot, PlotPoints};
use hantek6022::{
    consts::{GRID_DIVS_HORIZONTAL, GRID_DIVS_VERTICAL},
    data::{
        controls::Channel,
        units::{Time, Voltage},
        waveform::{display_points, divs_to_time, divs_to_volts},
    },
};

pub(crate) fn ui(app: &HantekApp, ui: &mut Ui) {
    let settings = app.persistent_state.settings;
    let frame = &app.ui_state.frame;

    let lines: Vec<(Channel, Color32, PlotPoints)> = Channel::ALL
        .into_iter()
        .filter(|&ch| settings.channel(ch).enabled)
        .map(|ch| {
            let channel = settings.channel(ch);
            let points = display_points(
                &frame.volts[ch.index()],
                frame.sample_rate,
                settings.time_base,
                channel,
            );
            (ch, channel_color(channel.color), PlotPoints::new(points))
        })
        .collect();

    let half_width = GRID_DIVS_HORIZONTAL / 2.0;
    let half_height = GRID_DIVS_VERTICAL / 2.0;

    Plot::new("scope")
        .include_x(-half_width)
        .include_x(half_width)
        .include_y(-half_height)
        .include_y(half_height)
        .set_margin_fraction(Vec2::ZERO)
        .x_grid_spacer(division_grid_lines)
        .y_grid_spacer(division_grid_lines)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_double_click_reset(false)
        .show_axes(false)
        .show_x(true)
        .show_y(true)
        .label_formatter(move |name, point| {
            let Some(ch) = Channel::ALL.into_iter().find(|ch| ch.to_string() == name) else {
                return String::new();
            };

            format!(
                "{ch}: {}\n{}",
                Voltage(divs_to_volts(point.y, settings.channel(ch))),
                Time(divs_to_time(point.x, settings.time_base))
            )
        })
        .show(ui, |plot_ui| {
            for (ch, color, points) in lines {
                plot_ui.line(Line::new(points).name(ch.to_string()).color(color));

                plot_ui.hline(
                    HLine::new(settings.channel(ch).offset_divs)
                        .width(1.5)
                        .color(color.gamma_multiply(0.6))
                        .style(LineStyle::Dotted { spacing: 20.0 }),
                );
            }
        });
}

fn channel_color([r, g, b]: [u8; 3]) -> Color32 {
    Color32::from_rgb(r, g, b)
}

/// One grid line per division, regardless of zoom.
fn division_grid_lines(grid_input: GridInput) -> Vec<GridMark> {
    let (lo, hi) = grid_input.bounds;
    let first = lo.ceil() as i64;
    let last = hi.floor() as i64;

    (first..=last)
        .map(|p| GridMark {
            value: p as f64,
            step_size: 1.0,
        })
        .collect()
}
