use egui::{Key, KeyboardShortcut, Modifiers};

pub const TOGGLE_MEASUREMENT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::NONE, Key::M);
pub const TOGGLE_RUN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::NONE, Key::Space);
pub const SINGLE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::NONE, Key::S);

pub const ZOOM_IN: Key = Key::PageUp;
pub const ZOOM_OUT: Key = Key::PageDown;

pub const POSITION_UP: Key = Key::ArrowUp;
pub const POSITION_DOWN: Key = Key::ArrowDown;
