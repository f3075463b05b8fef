//! Tracks whether the default microphone is muted and whether anything is
//! recording from it.
//!
//! The observer owns the mixer connection. Every handler returns the
//! [`MicEvent`]s it raised; the caller dispatches them to listeners.

use micmute_core::{MicEvent, MicState, SELF_MONITORING_APP_IDS};
use tracing::{debug, info, warn};

use crate::mixer::{MixerControl, MixerEvent, SourceOutput, SourceStream, SubscriptionId};

struct MuteSubscription {
    id: SubscriptionId,
    stream: u32,
}

pub struct MixerObserver<M: MixerControl> {
    mixer: M,
    stream: Option<SourceStream>,
    mute_subscription: Option<MuteSubscription>,
    /// `None` until the first refresh so that refresh always announces once.
    active: Option<bool>,
    closed: bool,
}

impl<M: MixerControl> MixerObserver<M> {
    /// Wrap an open mixer connection. Call [`MixerObserver::initialize`]
    /// before use.
    pub fn new(mixer: M) -> Self {
        Self {
            mixer,
            stream: None,
            mute_subscription: None,
            active: None,
            closed: false,
        }
    }

    /// Compute the initial state.
    pub fn initialize(&mut self) -> Vec<MicEvent> {
        self.refresh()
    }

    pub fn handle_event(&mut self, event: MixerEvent) -> Vec<MicEvent> {
        if self.closed {
            return Vec::new();
        }
        match event {
            MixerEvent::DefaultSourceChanged
            | MixerEvent::StreamAdded(_)
            | MixerEvent::StreamRemoved(_) => self.refresh(),
            MixerEvent::StreamChanged(index) => {
                let subscribed = self
                    .mute_subscription
                    .as_ref()
                    .is_some_and(|sub| sub.stream == index);
                if subscribed {
                    self.on_stream_mute_changed()
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Re-derive the default stream, activity and mute state from the server.
    pub fn refresh(&mut self) -> Vec<MicEvent> {
        if self.closed {
            return Vec::new();
        }
        if let Some(sub) = self.mute_subscription.take() {
            self.mixer.disconnect(sub.id);
        }

        let was_active = self.active;
        self.stream = match self.mixer.default_source() {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Failed to query default source");
                None
            }
        };

        let mut active = false;
        if let Some(stream) = &self.stream {
            let id = self.mixer.connect_mute_changed(stream.index);
            self.mute_subscription = Some(MuteSubscription {
                id,
                stream: stream.index,
            });
            active = match self.mixer.source_outputs() {
                Ok(outputs) => outputs.iter().any(counts_as_recording),
                Err(e) => {
                    warn!(error = %e, "Failed to list recording clients");
                    false
                }
            };
        }
        self.active = Some(active);

        debug!(
            source = self.stream.as_ref().map(|s| s.name.as_str()),
            active,
            muted = self.muted(),
            "Refreshed microphone state"
        );

        let mut events = vec![MicEvent::MutedChanged(self.state())];
        if was_active != Some(active) {
            info!(active, "Microphone activity changed");
            events.push(MicEvent::ActiveChanged(active));
        }
        events
    }

    /// The subscribed stream reported a property change.
    fn on_stream_mute_changed(&mut self) -> Vec<MicEvent> {
        let Some(current) = &self.stream else {
            return Vec::new();
        };
        match self.mixer.source(current.index) {
            Ok(Some(updated)) => {
                let changed = updated.muted != current.muted;
                self.stream = Some(updated);
                if changed {
                    info!(muted = self.muted(), "Microphone mute changed");
                    vec![MicEvent::MutedChanged(self.state())]
                } else {
                    Vec::new()
                }
            }
            // Gone between the event and the lookup; the server will also
            // report the removal, but resync now.
            Ok(None) => self.refresh(),
            Err(e) => {
                warn!(error = %e, "Failed to read default source");
                Vec::new()
            }
        }
    }

    /// True when there is no microphone or it is muted.
    pub fn muted(&self) -> bool {
        self.stream.as_ref().is_none_or(|s| s.muted)
    }

    pub fn state(&self) -> MicState {
        MicState::from_muted(self.muted())
    }

    /// Ask the server to change the mute flag. Does nothing without a
    /// microphone. The new value arrives as a change event.
    pub fn set_muted(&mut self, muted: bool) {
        let Some(stream) = &self.stream else {
            return;
        };
        if let Err(e) = self.mixer.change_is_muted(stream.index, muted) {
            warn!(error = %e, muted, "Failed to change microphone mute");
        }
    }

    /// Input volume as a percentage of the normal maximum.
    pub fn level(&self) -> f64 {
        match &self.stream {
            Some(stream) => 100.0 * stream.volume as f64 / self.mixer.vol_max_norm() as f64,
            None => 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Release the subscription and close the mixer connection.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        if let Some(sub) = self.mute_subscription.take() {
            self.mixer.disconnect(sub.id);
        }
        self.mixer.close();
        self.closed = true;
    }
}

/// Whether a recording client means the microphone is in use.
fn counts_as_recording(output: &SourceOutput) -> bool {
    match output.application_id.as_deref() {
        None | Some("") => false,
        Some(id) => !SELF_MONITORING_APP_IDS.contains(&id),
    }
}
