// Re-export from sub-crates
pub use micmute_audio::{MixerControl, MixerEvent, MixerObserver, PactlMixer};
pub use micmute_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, DEFAULT_LOG_LEVEL, KEYBINDING_KEY_NAME,
    MicEvent, MicState,
};

// App-specific modules
pub mod activation;
pub mod config_ext;
pub mod event;
pub mod extension;
pub mod icon;
pub mod indicator;
pub mod keybinding;
pub mod notify;
pub mod osd;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
