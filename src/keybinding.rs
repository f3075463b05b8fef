//! The global keybinding that toggles the microphone.

use anyhow::{Context, Result};
use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::{info, warn};

use crate::KEYBINDING_KEY_NAME;

pub struct Keybinding {
    manager: GlobalHotKeyManager,
    hotkey: Option<HotKey>,
}

impl Keybinding {
    /// Register the hotkey with the desktop.
    pub fn add(hotkey: HotKey) -> Result<Self> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
        manager
            .register(hotkey)
            .with_context(|| format!("Failed to register {}", KEYBINDING_KEY_NAME))?;
        info!(hotkey = ?hotkey, "Registered keybinding");
        Ok(Self {
            manager,
            hotkey: Some(hotkey),
        })
    }

    /// Whether the event is a press of our hotkey. Auto-repeat shows up as
    /// repeated presses.
    pub fn matches(&self, event: &GlobalHotKeyEvent) -> bool {
        self.hotkey.is_some_and(|hotkey| event.id() == hotkey.id())
            && event.state() == HotKeyState::Pressed
    }

    /// Unregister the hotkey. Further events no longer match.
    pub fn remove(&mut self) {
        if let Some(hotkey) = self.hotkey.take() {
            if let Err(e) = self.manager.unregister(hotkey) {
                warn!("Failed to unregister {}: {}", KEYBINDING_KEY_NAME, e);
            }
        }
    }
}

impl Drop for Keybinding {
    fn drop(&mut self) {
        self.remove();
    }
}
