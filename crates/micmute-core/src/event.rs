//! Change notifications raised by the microphone state tracker.
//!
//! These events carry no dependency on any specific UI framework; the tray
//! application decides how to present them.

use crate::MicState;

/// Notifications emitted when the derived microphone state is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicEvent {
    /// The mute state was (re)published. Raised on every refresh and on every
    /// mute property change of the default source, so listeners can resync
    /// after the source was replaced even if the value is unchanged.
    MutedChanged(MicState),
    /// Whether any application is recording from the microphone changed
    ActiveChanged(bool),
}
