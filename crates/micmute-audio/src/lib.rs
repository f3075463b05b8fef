//! Audio server access for micmute.
//!
//! [`MixerControl`] is the seam to the audio server, [`PactlMixer`] the
//! PulseAudio implementation, and [`MixerObserver`] derives the microphone
//! state the rest of the application reacts to.

mod mixer;
mod observer;
mod pactl;

pub use mixer::{
    MixerControl, MixerError, MixerEvent, Result, SourceOutput, SourceStream, SubscriptionId,
    VOLUME_NORM,
};
pub use observer::MixerObserver;
pub use pactl::PactlMixer;
