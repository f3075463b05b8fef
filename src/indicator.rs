//! The tray icon and its menu.

use anyhow::{Context, Result};
use micmute_core::{MicEvent, MicState};
use tracing::warn;
use tray_icon::menu::{AboutMetadataBuilder, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

use crate::icon::icon;
use crate::{APP_NAME_PRETTY, VERSION};

/// What a menu entry asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Toggle,
    Quit,
}

pub struct Indicator {
    tray: TrayIcon,
    status: MenuItem,
    toggle: MenuItem,
    quit: MenuItem,
    state: MicState,
    active: bool,
}

impl Indicator {
    /// Build the tray icon. Must be called once the event loop is running.
    pub fn new(state: MicState, active: bool) -> Result<Self> {
        let menu = Menu::new();
        let status = MenuItem::new(status_text(state, active), false, None);
        let toggle = MenuItem::new("Toggle mute", true, None);
        let quit = MenuItem::new("Quit", true, None);
        menu.append_items(&[
            // the name of the app
            &MenuItem::new(APP_NAME_PRETTY, false, None),
            &status,
            &PredefinedMenuItem::separator(),
            &toggle,
            &PredefinedMenuItem::about(
                None,
                Some(
                    AboutMetadataBuilder::new()
                        .version(Some(VERSION.to_owned()))
                        .build(),
                ),
            ),
            &PredefinedMenuItem::separator(),
            &quit,
        ])
        .context("Failed to build tray menu")?;

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(tooltip(state, active))
            .with_icon(icon(state))
            .build()
            .context("Failed to create tray icon")?;

        Ok(Self {
            tray,
            status,
            toggle,
            quit,
            state,
            active,
        })
    }

    /// Follow the microphone state.
    pub fn on_mic_event(&mut self, event: &MicEvent) {
        match *event {
            MicEvent::MutedChanged(state) => {
                // refresh republishes the same state, only swap on changes
                if state != self.state {
                    self.state = state;
                    if let Err(e) = self.tray.set_icon(Some(icon(state))) {
                        warn!("Failed to update tray icon: {}", e);
                    }
                }
            }
            MicEvent::ActiveChanged(active) => self.active = active,
        }
        self.status.set_text(status_text(self.state, self.active));
        if let Err(e) = self.tray.set_tooltip(Some(tooltip(self.state, self.active))) {
            warn!("Failed to update tray tooltip: {}", e);
        }
    }

    pub fn menu_action(&self, event: &MenuEvent) -> Option<MenuAction> {
        if event.id == *self.toggle.id() {
            Some(MenuAction::Toggle)
        } else if event.id == *self.quit.id() {
            Some(MenuAction::Quit)
        } else {
            None
        }
    }

    /// Remove the icon from the tray.
    pub fn destroy(self) {
        if let Err(e) = self.tray.set_visible(false) {
            warn!("Failed to hide tray icon: {}", e);
        }
    }
}

/// Whether a tray event is a primary button press on the icon.
pub fn is_press(event: &TrayIconEvent) -> bool {
    matches!(
        event,
        TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Down,
            ..
        }
    )
}

fn status_text(state: MicState, active: bool) -> String {
    let mute = match state {
        MicState::Muted => "Muted",
        MicState::Live => "Live",
    };
    let activity = if active { "recording" } else { "idle" };
    format!("{} · {}", mute, activity)
}

fn tooltip(state: MicState, active: bool) -> String {
    format!("{} - {}", APP_NAME_PRETTY, status_text(state, active))
}
