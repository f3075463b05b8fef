//! The audio server mixer seam. Everything the state tracker needs from the
//! audio server goes through [`MixerControl`] so backends can be swapped and
//! the tracker tested without a running server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MixerError {
    /// generic anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    /// The mixer tool could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// The mixer tool ran but reported a failure
    #[error("{command} failed: {stderr}")]
    Command { command: String, stderr: String },
    /// Output of the mixer tool could not be understood
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MixerError>;

/// Maximum normalized volume of a PulseAudio stream (`PA_VOLUME_NORM`).
pub const VOLUME_NORM: u32 = 0x10000;

/// Snapshot of an input stream (a PulseAudio "source").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStream {
    pub index: u32,
    pub name: String,
    pub muted: bool,
    /// Volume of the loudest channel, in raw server units
    pub volume: u32,
}

/// A client currently recording from some source (a "source output").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutput {
    pub index: u32,
    pub source: Option<u32>,
    pub application_id: Option<String>,
}

/// Topology and property events reported by the audio server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerEvent {
    /// The server changed; the default source may have been switched
    DefaultSourceChanged,
    /// A source or source output appeared
    StreamAdded(u32),
    /// A source or source output went away
    StreamRemoved(u32),
    /// A property of a source with a mute subscription changed
    StreamChanged(u32),
}

/// Handle to a mute-changed subscription on a single stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Access to the audio server's mixer.
///
/// Implementations deliver [`MixerEvent`]s out of band (see
/// [`crate::PactlMixer::open`]); the methods here only query and write state.
pub trait MixerControl {
    /// The currently selected input stream, if any.
    fn default_source(&self) -> Result<Option<SourceStream>>;

    /// Look up a source by index.
    fn source(&self, index: u32) -> Result<Option<SourceStream>>;

    /// All clients currently recording, from any source.
    fn source_outputs(&self) -> Result<Vec<SourceOutput>>;

    /// Request a change of a source's mute flag. Completion is reported
    /// through a [`MixerEvent::StreamChanged`] for subscribed streams.
    fn change_is_muted(&self, index: u32, muted: bool) -> Result<()>;

    /// Volume value that corresponds to 100%.
    fn vol_max_norm(&self) -> u32 {
        VOLUME_NORM
    }

    /// Start forwarding property changes of the given source.
    fn connect_mute_changed(&mut self, index: u32) -> SubscriptionId;

    /// Stop forwarding changes for a previous subscription.
    fn disconnect(&mut self, id: SubscriptionId);

    /// Close the connection. No events are delivered afterwards.
    fn close(&mut self);
}
