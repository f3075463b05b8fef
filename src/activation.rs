//! Turns clicks and keybinding presses into mute changes.
//!
//! Unmuting is immediate. Muting waits [`MUTE_DELAY`] and every trigger seen
//! before the delay runs out restarts it, so holding a push-to-talk key (which
//! auto-repeats) keeps the microphone open until shortly after release.

use std::time::{Duration, Instant};

use micmute_audio::{MixerControl, MixerObserver};
use micmute_core::MicState;
use tracing::{debug, info};

use crate::osd::{Osd, show_osd};

/// Delay between a mute trigger and the actual mute.
pub const MUTE_DELAY: Duration = Duration::from_millis(100);

/// What the controller needs from the microphone state tracker.
pub trait MuteTarget {
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn level(&self) -> f64;
}

impl<M: MixerControl> MuteTarget for MixerObserver<M> {
    fn muted(&self) -> bool {
        MixerObserver::muted(self)
    }

    fn set_muted(&mut self, muted: bool) {
        MixerObserver::set_muted(self, muted)
    }

    fn level(&self) -> f64 {
        MixerObserver::level(self)
    }
}

/// A scheduled mute. Dropping it without firing cancels it.
#[derive(Debug)]
struct PendingMute {
    deadline: Instant,
}

pub struct ActivationController {
    pending_mute: Option<PendingMute>,
    /// Set once the first activity notification has been seen.
    initialised: bool,
    delay: Duration,
}

impl Default for ActivationController {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationController {
    pub fn new() -> Self {
        Self::with_delay(MUTE_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            pending_mute: None,
            initialised: false,
            delay,
        }
    }

    /// Handle a click or keybinding press.
    pub fn activate(&mut self, now: Instant, target: &mut impl MuteTarget, osd: &mut impl Osd) {
        if target.muted() {
            info!("Unmuting microphone");
            target.set_muted(false);
            show_osd(osd, None, MicState::Live, Some(target.level()));
            return;
        }

        if let Some(pending) = self.pending_mute.take() {
            debug!(deadline = ?pending.deadline, "Extending pending mute");
            // keep the osd visible while the key is held
            show_osd(osd, None, MicState::Live, Some(target.level()));
        }
        self.pending_mute = Some(PendingMute {
            deadline: now + self.delay,
        });
    }

    /// Run the pending mute if its deadline has passed. Returns true if the
    /// microphone was muted.
    pub fn fire_due(
        &mut self,
        now: Instant,
        target: &mut impl MuteTarget,
        osd: &mut impl Osd,
    ) -> bool {
        if self
            .pending_mute
            .as_ref()
            .is_none_or(|pending| pending.deadline > now)
        {
            return false;
        }
        self.pending_mute = None;

        info!("Muting microphone");
        target.set_muted(true);
        show_osd(osd, None, MicState::Muted, Some(0.0));
        true
    }

    /// When the event loop should wake up next to fire a pending mute.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_mute.as_ref().map(|pending| pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending_mute.is_some()
    }

    /// Drop any pending mute without running it.
    pub fn cancel(&mut self) {
        if self.pending_mute.take().is_some() {
            debug!("Cancelled pending mute");
        }
    }

    /// Announce recording activity changes. The first notification only
    /// reports the initial state and is not announced.
    pub fn on_active_changed(&mut self, active: bool, muted: bool, osd: &mut impl Osd) {
        if self.initialised {
            let label = if active {
                "Microphone activated"
            } else {
                "Microphone deactivated"
            };
            show_osd(osd, Some(label), MicState::from_muted(muted), None);
        }
        self.initialised = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osd::tests::{OsdCall, RecordingOsd};

    #[derive(Debug)]
    struct FakeMic {
        muted: bool,
        writes: Vec<bool>,
    }

    impl FakeMic {
        fn new(muted: bool) -> Self {
            Self {
                muted,
                writes: Vec::new(),
            }
        }
    }

    impl MuteTarget for FakeMic {
        fn muted(&self) -> bool {
            self.muted
        }

        fn set_muted(&mut self, muted: bool) {
            self.writes.push(muted);
            self.muted = muted;
        }

        fn level(&self) -> f64 {
            42.0
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_activate_while_muted_unmutes_immediately() {
        let mut controller = ActivationController::new();
        let mut mic = FakeMic::new(true);
        let mut osd = RecordingOsd::default();
        let t0 = Instant::now();

        controller.activate(t0, &mut mic, &mut osd);

        assert!(!mic.muted);
        assert!(!controller.is_pending());
        assert_eq!(
            osd.calls,
            vec![OsdCall {
                icon: MicState::Live.icon_name().to_owned(),
                label: None,
                level: Some(42.0),
            }]
        );
    }

    #[test]
    fn test_activate_while_live_mutes_after_delay() {
        let mut controller = ActivationController::new();
        let mut mic = FakeMic::new(false);
        let mut osd = RecordingOsd::default();
        let t0 = Instant::now();

        controller.activate(t0, &mut mic, &mut osd);
        assert!(!mic.muted);
        assert!(osd.calls.is_empty());
        assert_eq!(controller.next_deadline(), Some(t0 + MUTE_DELAY));

        assert!(!controller.fire_due(t0 + ms(99), &mut mic, &mut osd));
        assert!(!mic.muted);

        assert!(controller.fire_due(t0 + ms(100), &mut mic, &mut osd));
        assert!(mic.muted);
        assert!(!controller.is_pending());
        assert_eq!(
            osd.calls,
            vec![OsdCall {
                icon: MicState::Muted.icon_name().to_owned(),
                label: None,
                level: Some(0.0),
            }]
        );

        // Nothing left to fire
        assert!(!controller.fire_due(t0 + ms(500), &mut mic, &mut osd));
        assert_eq!(mic.writes, vec![true]);
    }

    #[test]
    fn test_retrigger_extends_pending_mute() {
        let mut controller = ActivationController::new();
        let mut mic = FakeMic::new(false);
        let mut osd = RecordingOsd::default();
        let t0 = Instant::now();

        controller.activate(t0, &mut mic, &mut osd);
        controller.activate(t0 + ms(50), &mut mic, &mut osd);

        // The first deadline has been cancelled
        assert!(!controller.fire_due(t0 + ms(100), &mut mic, &mut osd));
        assert!(!controller.fire_due(t0 + ms(149), &mut mic, &mut osd));
        assert!(!mic.muted);

        assert!(controller.fire_due(t0 + ms(150), &mut mic, &mut osd));
        assert_eq!(mic.writes, vec![true]);

        // One osd refresh for the retrigger, one for the mute
        assert_eq!(osd.calls.len(), 2);
        assert_eq!(osd.calls[0].icon, MicState::Live.icon_name());
        assert_eq!(osd.calls[0].level, Some(42.0));
        assert_eq!(osd.calls[1].icon, MicState::Muted.icon_name());
    }

    #[test]
    fn test_trigger_after_expiry_before_fire_rearms() {
        let mut controller = ActivationController::new();
        let mut mic = FakeMic::new(false);
        let mut osd = RecordingOsd::default();
        let t0 = Instant::now();

        controller.activate(t0, &mut mic, &mut osd);
        // Deadline passed but the timer has not been processed yet
        controller.activate(t0 + ms(120), &mut mic, &mut osd);

        assert!(!controller.fire_due(t0 + ms(120), &mut mic, &mut osd));
        assert_eq!(controller.next_deadline(), Some(t0 + ms(220)));
        assert!(controller.fire_due(t0 + ms(220), &mut mic, &mut osd));
        assert_eq!(mic.writes, vec![true]);
    }

    #[test]
    fn test_held_key_keeps_microphone_open() {
        let mut controller = ActivationController::new();
        let mut mic = FakeMic::new(true);
        let mut osd = RecordingOsd::default();
        let t0 = Instant::now();

        // Press unmutes, auto-repeat every 30ms keeps extending
        controller.activate(t0, &mut mic, &mut osd);
        let mut t = t0;
        for _ in 0..20 {
            t += ms(30);
            assert!(!controller.fire_due(t, &mut mic, &mut osd));
            controller.activate(t, &mut mic, &mut osd);
        }
        assert!(!mic.muted);

        // Released
        assert!(!controller.fire_due(t + ms(99), &mut mic, &mut osd));
        assert!(controller.fire_due(t + ms(100), &mut mic, &mut osd));
        assert_eq!(mic.writes, vec![false, true]);
    }

    #[test]
    fn test_cancel_drops_pending_mute() {
        let mut controller = ActivationController::new();
        let mut mic = FakeMic::new(false);
        let mut osd = RecordingOsd::default();
        let t0 = Instant::now();

        controller.activate(t0, &mut mic, &mut osd);
        controller.cancel();
        assert_eq!(controller.next_deadline(), None);
        assert!(!controller.fire_due(t0 + ms(1000), &mut mic, &mut osd));
        assert!(mic.writes.is_empty());
    }

    #[test]
    fn test_first_activity_notification_is_silent() {
        for initial in [true, false] {
            let mut controller = ActivationController::new();
            let mut osd = RecordingOsd::default();

            controller.on_active_changed(initial, true, &mut osd);
            assert!(osd.calls.is_empty());

            controller.on_active_changed(!initial, true, &mut osd);
            assert_eq!(osd.calls.len(), 1);
        }
    }

    #[test]
    fn test_activity_labels() {
        let mut controller = ActivationController::new();
        let mut osd = RecordingOsd::default();

        controller.on_active_changed(false, false, &mut osd);
        controller.on_active_changed(true, false, &mut osd);
        controller.on_active_changed(false, true, &mut osd);

        assert_eq!(
            osd.calls,
            vec![
                OsdCall {
                    icon: MicState::Live.icon_name().to_owned(),
                    label: Some("Microphone activated".to_owned()),
                    level: None,
                },
                OsdCall {
                    icon: MicState::Muted.icon_name().to_owned(),
                    label: Some("Microphone deactivated".to_owned()),
                    level: None,
                },
            ]
        );
    }
}
