//! Application events for the tao event loop.

use global_hotkey::GlobalHotKeyEvent;
use micmute_audio::MixerEvent;
use tray_icon::TrayIconEvent;
use tray_icon::menu::MenuEvent;

/// Everything that wakes the event loop. Other threads only ever forward
/// into it; all handling happens on the loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The audio server reported a change
    Mixer(MixerEvent),
    /// A global hotkey was pressed or released
    HotKey(GlobalHotKeyEvent),
    /// The tray icon was clicked
    Tray(TrayIconEvent),
    /// A tray menu entry was chosen
    Menu(MenuEvent),
}
