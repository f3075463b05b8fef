//! Core types and configuration for micmute.
//!
//! This crate provides platform-agnostic types that are shared between the
//! audio backend and the tray application.

mod config;
mod event;
mod state;

pub use config::{Config, ConfigManager};
pub use event::MicEvent;
pub use state::MicState;

/// Application name
pub const APP_NAME: &str = "micmute";

/// Pretty application name for display
pub const APP_NAME_PRETTY: &str = "Mic Mute";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Name of the configuration key holding the toggle keybinding.
pub const KEYBINDING_KEY_NAME: &str = "keybinding-toggle-mute";

/// Application ids of recording clients that belong to volume control UIs.
/// Their level meters record from the source all the time, so they never
/// count as the microphone being in use.
pub const SELF_MONITORING_APP_IDS: [&str; 2] =
    ["org.gnome.VolumeControl", "org.PulseAudio.pavucontrol"];
