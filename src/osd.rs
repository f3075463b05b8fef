//! On-screen feedback for mute toggles and activity changes.

use micmute_core::{APP_NAME, APP_NAME_PRETTY, MicState};
use notify_rust::{Notification, Timeout};
use tracing::debug;

/// Monitor index meaning "wherever the user currently is".
pub const CURRENT_MONITOR: i32 = -1;

/// How long an osd popup stays up.
const OSD_TIMEOUT_MS: u32 = 1500;

/// Something that can flash a short status popup.
pub trait Osd {
    fn show(&mut self, monitor: i32, icon: &str, label: Option<&str>, level: Option<f64>);
}

/// Show the osd for a mute state on the current monitor.
pub fn show_osd(osd: &mut impl Osd, label: Option<&str>, state: MicState, level: Option<f64>) {
    osd.show(CURRENT_MONITOR, state.icon_name(), label, level);
}

/// Osd backed by desktop notifications. Each popup replaces the previous
/// one so repeated toggles do not stack up.
#[derive(Debug, Default)]
pub struct NotifyOsd {
    last_id: Option<u32>,
}

impl NotifyOsd {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Osd for NotifyOsd {
    fn show(&mut self, monitor: i32, icon: &str, label: Option<&str>, level: Option<f64>) {
        debug!(monitor, icon, ?label, ?level, "Showing osd");

        let mut notification = Notification::new();
        notification
            .appname(APP_NAME)
            .icon(icon)
            .summary(label.unwrap_or(APP_NAME_PRETTY))
            .timeout(Timeout::Milliseconds(OSD_TIMEOUT_MS));
        if let Some(level) = level {
            notification.body(&format!("Input level {:.0}%", level));
        }

        #[cfg(all(unix, not(target_os = "macos")))]
        {
            use notify_rust::Hint;

            notification
                .hint(Hint::Transient(true))
                .hint(Hint::Custom(
                    "x-canonical-private-synchronous".to_owned(),
                    APP_NAME.to_owned(),
                ));
            if let Some(level) = level {
                notification.hint(Hint::CustomInt(
                    "value".to_owned(),
                    level.round().clamp(0.0, 100.0) as i32,
                ));
            }
            if let Some(id) = self.last_id {
                notification.id(id);
            }
        }

        match notification.show() {
            #[cfg(all(unix, not(target_os = "macos")))]
            Ok(handle) => self.last_id = Some(handle.id()),
            #[cfg(not(all(unix, not(target_os = "macos"))))]
            Ok(_) => {}
            Err(e) => debug!("Failed to show osd: {}", e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub struct OsdCall {
        pub icon: String,
        pub label: Option<String>,
        pub level: Option<f64>,
    }

    /// Osd that records what it was asked to show.
    #[derive(Debug, Default)]
    pub struct RecordingOsd {
        pub calls: Vec<OsdCall>,
    }

    impl Osd for RecordingOsd {
        fn show(&mut self, monitor: i32, icon: &str, label: Option<&str>, level: Option<f64>) {
            assert_eq!(monitor, CURRENT_MONITOR);
            self.calls.push(OsdCall {
                icon: icon.to_owned(),
                label: label.map(str::to_owned),
                level,
            });
        }
    }

    #[test]
    fn test_show_osd_uses_state_icon() {
        let mut osd = RecordingOsd::default();
        show_osd(&mut osd, Some("hello"), MicState::Muted, None);
        assert_eq!(
            osd.calls,
            vec![OsdCall {
                icon: "microphone-sensitivity-muted-symbolic".to_owned(),
                label: Some("hello".to_owned()),
                level: None,
            }]
        );
    }
}
