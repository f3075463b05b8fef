use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use global_hotkey::GlobalHotKeyEvent;
use micmute::config_ext::ConfigExt;
use micmute::event::AppEvent;
use micmute::extension::{Extension, Flow};
use micmute::notify::NotificationLayer;
use micmute::osd::NotifyOsd;
use micmute::{ConfigManager, DEFAULT_LOG_LEVEL, PactlMixer, VERSION};
use parking_lot::{Mutex, RwLock};
use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tray_icon::TrayIconEvent;
use tray_icon::menu::MenuEvent;

fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MICMUTE_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .finish()
        .with(NotificationLayer::new())
        .init();

    info!(version = VERSION, "Starting");

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = Arc::new(RwLock::new(config_manager.load()?));
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config.read())?;
    info!(path = ?config_manager.config_path(), "Loaded config");

    // A bad keybinding is fatal
    let hotkey = config.hotkey()?;

    let event_loop: EventLoop<AppEvent> = EventLoopBuilder::with_user_event().build();
    let event_sender = event_loop.create_proxy();
    forward_desktop_events(&event_sender);

    let mut extension: Option<Extension<PactlMixer, NotifyOsd>> = None;

    event_loop.run(move |event, _, control_flow| {
        if let ControlFlow::ExitWithCode(_) = *control_flow {
            if let Event::LoopDestroyed = event {
                if let Some(extension) = extension.take() {
                    extension.disable();
                }
            }
            return;
        }

        let now = Instant::now();
        match event {
            Event::NewEvents(StartCause::Init) => {
                // The tray icon has to be created once the event loop is
                // actually running, see https://github.com/tauri-apps/tray-icon/issues/90
                let sender = event_sender.clone();
                let enabled = PactlMixer::open(move |event| {
                    sender.send_event(AppEvent::Mixer(event)).ok();
                })
                .context("Failed to connect to the audio server")
                .and_then(|mixer| Extension::enable(mixer, NotifyOsd::new(), hotkey));

                match enabled {
                    Ok(enabled) => {
                        extension = Some(enabled);
                        info!("Mic Mute ready");
                    }
                    Err(e) => {
                        error!("Failed to start: {:#}", e);
                        *control_flow = ControlFlow::ExitWithCode(1);
                        return;
                    }
                }
            }
            Event::UserEvent(event) => {
                let Some(extension) = extension.as_mut() else {
                    return;
                };
                match event {
                    AppEvent::Mixer(event) => extension.handle_mixer_event(event),
                    AppEvent::HotKey(event) => extension.handle_hotkey(&event, now),
                    AppEvent::Tray(event) => extension.handle_tray(&event, now),
                    AppEvent::Menu(event) => {
                        if extension.handle_menu(&event, now) == Flow::Quit {
                            info!("Quit requested");
                            *control_flow = ControlFlow::Exit;
                            return;
                        }
                    }
                }
            }
            Event::LoopDestroyed => {
                if let Some(extension) = extension.take() {
                    extension.disable();
                }
                return;
            }
            _ => {}
        }

        // Fire a due mute, then sleep until the next one
        *control_flow = match extension.as_mut() {
            Some(extension) => {
                extension.fire_due(Instant::now());
                match extension.next_deadline() {
                    Some(deadline) => ControlFlow::WaitUntil(deadline),
                    None => ControlFlow::Wait,
                }
            }
            None => ControlFlow::Wait,
        };
    });
}

/// Route hotkey, tray and menu events into the event loop so they wake it.
fn forward_desktop_events(event_sender: &EventLoopProxy<AppEvent>) {
    let sender = Mutex::new(event_sender.clone());
    GlobalHotKeyEvent::set_event_handler(Some(move |event| {
        sender.lock().send_event(AppEvent::HotKey(event)).ok();
    }));

    let sender = Mutex::new(event_sender.clone());
    TrayIconEvent::set_event_handler(Some(move |event| {
        sender.lock().send_event(AppEvent::Tray(event)).ok();
    }));

    let sender = Mutex::new(event_sender.clone());
    MenuEvent::set_event_handler(Some(move |event| {
        sender.lock().send_event(AppEvent::Menu(event)).ok();
    }));
}
