//! Enable/disable lifecycle: owns the microphone state tracker, the
//! activation controller and the desktop integrations, and routes events
//! between them.

use std::time::Instant;

use anyhow::Result;
use global_hotkey::GlobalHotKeyEvent;
use global_hotkey::hotkey::HotKey;
use micmute_audio::{MixerControl, MixerEvent, MixerObserver};
use micmute_core::MicEvent;
use tracing::info;
use tray_icon::TrayIconEvent;
use tray_icon::menu::MenuEvent;

use crate::activation::ActivationController;
use crate::indicator::{Indicator, MenuAction, is_press};
use crate::keybinding::Keybinding;
use crate::osd::Osd;

/// Whether the application should keep running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Extension<M: MixerControl, O: Osd> {
    observer: MixerObserver<M>,
    controller: ActivationController,
    osd: O,
    indicator: Option<Indicator>,
    keybinding: Option<Keybinding>,
}

impl<M: MixerControl, O: Osd> Extension<M, O> {
    /// Start tracking the microphone, show the tray icon and register the
    /// keybinding. Must be called once the event loop is running.
    pub fn enable(mixer: M, osd: O, hotkey: HotKey) -> Result<Self> {
        let mut observer = MixerObserver::new(mixer);
        let events = observer.initialize();
        let indicator = Indicator::new(observer.state(), observer.is_active())?;
        let keybinding = Keybinding::add(hotkey)?;

        let mut extension = Self::with_parts(observer, osd, Some(indicator), Some(keybinding));
        extension.dispatch(events);
        info!("Enabled");
        Ok(extension)
    }

    fn with_parts(
        observer: MixerObserver<M>,
        osd: O,
        indicator: Option<Indicator>,
        keybinding: Option<Keybinding>,
    ) -> Self {
        Self {
            observer,
            controller: ActivationController::new(),
            osd,
            indicator,
            keybinding,
        }
    }

    /// Hand state tracker notifications to the listeners.
    fn dispatch(&mut self, events: Vec<MicEvent>) {
        for event in events {
            if let Some(indicator) = &mut self.indicator {
                indicator.on_mic_event(&event);
            }
            if let MicEvent::ActiveChanged(active) = event {
                self.controller
                    .on_active_changed(active, self.observer.muted(), &mut self.osd);
            }
        }
    }

    pub fn handle_mixer_event(&mut self, event: MixerEvent) {
        let events = self.observer.handle_event(event);
        self.dispatch(events);
    }

    /// Toggle the microphone, from any trigger.
    pub fn activate(&mut self, now: Instant) {
        self.controller
            .activate(now, &mut self.observer, &mut self.osd);
    }

    pub fn handle_hotkey(&mut self, event: &GlobalHotKeyEvent, now: Instant) {
        if self.keybinding.as_ref().is_some_and(|k| k.matches(event)) {
            self.activate(now);
        }
    }

    pub fn handle_tray(&mut self, event: &TrayIconEvent, now: Instant) {
        if is_press(event) {
            self.activate(now);
        }
    }

    pub fn handle_menu(&mut self, event: &MenuEvent, now: Instant) -> Flow {
        let action = self
            .indicator
            .as_ref()
            .and_then(|indicator| indicator.menu_action(event));
        match action {
            Some(MenuAction::Toggle) => {
                self.activate(now);
                Flow::Continue
            }
            Some(MenuAction::Quit) => Flow::Quit,
            None => Flow::Continue,
        }
    }

    /// Run a pending mute whose delay has elapsed.
    pub fn fire_due(&mut self, now: Instant) {
        self.controller
            .fire_due(now, &mut self.observer, &mut self.osd);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_deadline()
    }

    /// Tear everything down. The keybinding goes first so no trigger can
    /// reach a closed mixer.
    pub fn disable(mut self) {
        if let Some(mut keybinding) = self.keybinding.take() {
            keybinding.remove();
        }
        if let Some(indicator) = self.indicator.take() {
            indicator.destroy();
        }
        self.controller.cancel();
        self.observer.teardown();
        info!("Disabled");
    }
}
