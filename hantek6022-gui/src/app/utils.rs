use egui::Modifiers;
use hantek6022::{
    consts::GRID_DIVS_VERTICAL,
    data::{
        controls::Channel,
        settings::{ChannelSettings, ScopeSettings},
    },
};

/// The channel keyboard shortcuts act on. Alt picks CH2 when both are shown.
pub fn focused_channel(settings: &ScopeSettings, mods: Modifiers) -> Channel {
    if !settings.channel(Channel::Ch2).enabled {
        Channel::Ch1
    } else if !settings.channel(Channel::Ch1).enabled || mods.alt {
        Channel::Ch2
    } else {
        Channel::Ch1
    }
}

pub fn move_position(channel: &mut ChannelSettings, mods: Modifiers, up: bool) {
    let step = position_step(mods);
    let step = if up { step } else { -step };
    channel.offset_divs = clamp_position(channel.offset_divs + step);
}

/// Keeps the ground marker on screen.
pub fn clamp_position(offset_divs: f64) -> f64 {
    let half_height = GRID_DIVS_VERTICAL / 2.0;
    offset_divs.clamp(-half_height, half_height)
}

fn position_step(mods: Modifiers) -> f64 {
    if mods.command {
        0.04
    } else if mods.shift {
        1.0
    } else {
        0.2
    }
}
