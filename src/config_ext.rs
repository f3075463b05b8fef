//! App-specific configuration extensions.
//!
//! This module provides hotkey parsing on top of the core Config.

use std::sync::Arc;

use anyhow::{Context, Result};
use global_hotkey::hotkey::HotKey;
use parking_lot::RwLock;

use crate::{Config, KEYBINDING_KEY_NAME};

/// Extension trait for Config to handle hotkeys.
pub trait ConfigExt {
    /// Parse the configured toggle keybinding.
    fn hotkey(&self) -> Result<HotKey>;
}

impl ConfigExt for Config {
    fn hotkey(&self) -> Result<HotKey> {
        self.keybinding().parse::<HotKey>().with_context(|| {
            format!(
                "Invalid {} \"{}\" in configuration",
                KEYBINDING_KEY_NAME,
                self.keybinding()
            )
        })
    }
}

impl ConfigExt for Arc<RwLock<Config>> {
    fn hotkey(&self) -> Result<HotKey> {
        self.read().hotkey()
    }
}
