//! PulseAudio (and PipeWire's pulse server) backend built on the `pactl`
//! command line tool.
//!
//! Events come from a long running `pactl subscribe` child whose output is
//! parsed on a reader thread. Queries use `pactl --format=json`, which needs
//! pactl 16 or newer.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::Context;
use parking_lot::Mutex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::mixer::{
    MixerControl, MixerError, MixerEvent, Result, SourceOutput, SourceStream, SubscriptionId,
};

const PACTL: &str = "pactl";

type Watched = Arc<Mutex<HashMap<SubscriptionId, u32>>>;

/// Mixer connection backed by `pactl`.
pub struct PactlMixer {
    watched: Watched,
    next_subscription: u64,
    closed: Arc<AtomicBool>,
    subscriber: Option<Child>,
    reader: Option<JoinHandle<()>>,
}

impl PactlMixer {
    /// Connect to the audio server. `sink` receives every relevant server
    /// event on the reader thread until [`MixerControl::close`] is called.
    pub fn open<F>(sink: F) -> Result<Self>
    where
        F: Fn(MixerEvent) + Send + 'static,
    {
        let mut subscriber = Command::new(PACTL)
            .arg("subscribe")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MixerError::Spawn {
                program: PACTL,
                source,
            })?;
        let stdout = subscriber
            .stdout
            .take()
            .context("pactl subscribe has no stdout")?;

        let watched: Watched = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let reader = {
            let watched = watched.clone();
            let closed = closed.clone();
            thread::Builder::new()
                .name("pactl-subscribe".to_owned())
                .spawn(move || {
                    for line in BufReader::new(stdout).lines() {
                        let Ok(line) = line else { break };
                        if closed.load(Ordering::Acquire) {
                            break;
                        }
                        let Some(event) = parse_event_line(&line) else {
                            continue;
                        };
                        let routed = route(event, &watched.lock());
                        if let Some(event) = routed {
                            debug!(?event, "mixer event");
                            sink(event);
                        }
                    }
                    if !closed.load(Ordering::Acquire) {
                        warn!("Lost connection to the audio server event stream");
                    }
                })
                .map_err(|source| MixerError::Spawn {
                    program: "pactl-subscribe reader",
                    source,
                })?
        };

        info!(pid = subscriber.id(), "Subscribed to audio server events");

        Ok(Self {
            watched,
            next_subscription: 1,
            closed,
            subscriber: Some(subscriber),
            reader: Some(reader),
        })
    }

    fn sources(&self) -> Result<Vec<SourceStream>> {
        let sources: Vec<SourceInfo> = pactl_json(&["list", "sources"])?;
        Ok(sources.into_iter().map(SourceStream::from).collect())
    }
}

impl MixerControl for PactlMixer {
    fn default_source(&self) -> Result<Option<SourceStream>> {
        let info: ServerInfo = pactl_json(&["info"])?;
        let Some(name) = info.default_source_name.filter(|name| !name.is_empty()) else {
            return Ok(None);
        };
        Ok(self.sources()?.into_iter().find(|s| s.name == name))
    }

    fn source(&self, index: u32) -> Result<Option<SourceStream>> {
        Ok(self.sources()?.into_iter().find(|s| s.index == index))
    }

    fn source_outputs(&self) -> Result<Vec<SourceOutput>> {
        let outputs: Vec<SourceOutputInfo> = pactl_json(&["list", "source-outputs"])?;
        Ok(outputs.into_iter().map(SourceOutput::from).collect())
    }

    fn change_is_muted(&self, index: u32, muted: bool) -> Result<()> {
        let index = index.to_string();
        let flag = if muted { "1" } else { "0" };
        pactl(&["set-source-mute", &index, flag])?;
        Ok(())
    }

    fn connect_mute_changed(&mut self, index: u32) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.watched.lock().insert(id, index);
        id
    }

    fn disconnect(&mut self, id: SubscriptionId) {
        self.watched.lock().remove(&id);
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.watched.lock().clear();
        if let Some(mut subscriber) = self.subscriber.take() {
            // The child may already be gone if the server went away.
            subscriber.kill().ok();
            subscriber.wait().ok();
        }
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("pactl reader thread panicked");
            }
        }
        info!("Closed audio server connection");
    }
}

impl Drop for PactlMixer {
    fn drop(&mut self) {
        if self.subscriber.is_some() {
            self.close();
        }
    }
}

/// Run pactl and return stdout.
fn pactl(args: &[&str]) -> Result<String> {
    let output = Command::new(PACTL)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| MixerError::Spawn {
            program: PACTL,
            source,
        })?;
    if !output.status.success() {
        return Err(MixerError::Command {
            command: format!("{} {}", PACTL, args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn pactl_json<T: DeserializeOwned>(args: &[&str]) -> Result<T> {
    let mut full = vec!["--format=json"];
    full.extend_from_slice(args);
    let stdout = pactl(&full)?;
    Ok(serde_json::from_str(&stdout)?)
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    #[serde(default)]
    default_source_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelVolume {
    value: u32,
}

#[derive(Debug, Deserialize)]
struct SourceInfo {
    index: u32,
    name: String,
    mute: bool,
    #[serde(default)]
    volume: HashMap<String, ChannelVolume>,
}

impl From<SourceInfo> for SourceStream {
    fn from(info: SourceInfo) -> Self {
        SourceStream {
            index: info.index,
            name: info.name,
            muted: info.mute,
            volume: info.volume.values().map(|c| c.value).max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceOutputInfo {
    index: u32,
    #[serde(default)]
    source: Option<u32>,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
}

impl From<SourceOutputInfo> for SourceOutput {
    fn from(info: SourceOutputInfo) -> Self {
        let application_id = info
            .properties
            .get("application.id")
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        SourceOutput {
            index: info.index,
            source: info.source,
            application_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    New,
    Change,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facility {
    Source,
    SourceOutput,
    Server,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubscribeEvent {
    kind: EventKind,
    facility: Facility,
    index: u32,
}

/// Parse a line like `Event 'new' on source-output #42`.
fn parse_event_line(line: &str) -> Option<SubscribeEvent> {
    let rest = line.trim().strip_prefix("Event '")?;
    let (kind, rest) = rest.split_once('\'')?;
    let rest = rest.trim_start().strip_prefix("on ")?;
    let (facility, index) = rest.rsplit_once(" #")?;

    let kind = match kind {
        "new" => EventKind::New,
        "change" => EventKind::Change,
        "remove" => EventKind::Remove,
        _ => return None,
    };
    let facility = match facility.trim() {
        "source" => Facility::Source,
        "source-output" => Facility::SourceOutput,
        "server" => Facility::Server,
        _ => Facility::Other,
    };
    let index = index.trim().parse().ok()?;
    Some(SubscribeEvent {
        kind,
        facility,
        index,
    })
}

/// Translate a raw subscription event into a mixer event. Source property
/// changes are only forwarded for sources with a live subscription.
fn route(event: SubscribeEvent, watched: &HashMap<SubscriptionId, u32>) -> Option<MixerEvent> {
    use EventKind::*;
    use Facility::*;

    match (event.kind, event.facility) {
        (New, Source | SourceOutput) => Some(MixerEvent::StreamAdded(event.index)),
        (Remove, Source | SourceOutput) => Some(MixerEvent::StreamRemoved(event.index)),
        (Change, Server) => Some(MixerEvent::DefaultSourceChanged),
        (Change, Source) if watched.values().any(|&i| i == event.index) => {
            Some(MixerEvent::StreamChanged(event.index))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_lines() {
        assert_eq!(
            parse_event_line("Event 'new' on source-output #42"),
            Some(SubscribeEvent {
                kind: EventKind::New,
                facility: Facility::SourceOutput,
                index: 42
            })
        );
        assert_eq!(
            parse_event_line("Event 'change' on server #4294967295"),
            Some(SubscribeEvent {
                kind: EventKind::Change,
                facility: Facility::Server,
                index: u32::MAX
            })
        );
        assert_eq!(
            parse_event_line("Event 'remove' on sink-input #7").map(|e| e.facility),
            Some(Facility::Other)
        );
        assert_eq!(parse_event_line("Connection failure: Connection refused"), None);
        assert_eq!(parse_event_line("Event 'bogus' on source #1"), None);
        assert_eq!(parse_event_line("Event 'new' on source #abc"), None);
    }

    #[test]
    fn test_route_topology_events() {
        let watched = HashMap::new();
        let line = |l| route(parse_event_line(l).unwrap(), &watched);

        assert_eq!(
            line("Event 'new' on source-output #3"),
            Some(MixerEvent::StreamAdded(3))
        );
        assert_eq!(
            line("Event 'new' on source #1"),
            Some(MixerEvent::StreamAdded(1))
        );
        assert_eq!(
            line("Event 'remove' on source-output #3"),
            Some(MixerEvent::StreamRemoved(3))
        );
        assert_eq!(
            line("Event 'change' on server #4294967295"),
            Some(MixerEvent::DefaultSourceChanged)
        );
        assert_eq!(line("Event 'change' on source-output #3"), None);
        assert_eq!(line("Event 'new' on sink-input #9"), None);
    }

    #[test]
    fn test_route_source_change_requires_subscription() {
        let event = parse_event_line("Event 'change' on source #5").unwrap();
        assert_eq!(route(event, &HashMap::new()), None);

        let watched = HashMap::from([(SubscriptionId(1), 5)]);
        assert_eq!(route(event, &watched), Some(MixerEvent::StreamChanged(5)));

        let other = HashMap::from([(SubscriptionId(1), 6)]);
        assert_eq!(route(event, &other), None);
    }

    #[test]
    fn test_parse_sources() {
        let json = r#"[
            {
                "index": 1,
                "state": "SUSPENDED",
                "name": "alsa_input.usb-mic",
                "mute": true,
                "volume": {
                    "front-left": {"value": 32768, "value_percent": "50%", "db": "-18.06 dB"},
                    "front-right": {"value": 49152, "value_percent": "75%", "db": "-7.50 dB"}
                },
                "properties": {"device.class": "sound"}
            },
            {"index": 2, "name": "monitor", "mute": false}
        ]"#;
        let sources: Vec<SourceInfo> = serde_json::from_str(json).unwrap();
        let sources: Vec<SourceStream> = sources.into_iter().map(SourceStream::from).collect();
        assert_eq!(
            sources,
            vec![
                SourceStream {
                    index: 1,
                    name: "alsa_input.usb-mic".to_owned(),
                    muted: true,
                    volume: 49152,
                },
                SourceStream {
                    index: 2,
                    name: "monitor".to_owned(),
                    muted: false,
                    volume: 0,
                },
            ]
        );
    }

    #[test]
    fn test_parse_source_outputs() {
        let json = r#"[
            {"index": 10, "source": 1, "corked": false,
             "properties": {"application.id": "org.PulseAudio.pavucontrol", "application.name": "pavucontrol"}},
            {"index": 11, "source": 1, "properties": {"application.name": "arecord"}},
            {"index": 12, "properties": {"application.id": 5}}
        ]"#;
        let outputs: Vec<SourceOutputInfo> = serde_json::from_str(json).unwrap();
        let outputs: Vec<SourceOutput> = outputs.into_iter().map(SourceOutput::from).collect();
        assert_eq!(
            outputs[0].application_id.as_deref(),
            Some("org.PulseAudio.pavucontrol")
        );
        assert_eq!(outputs[1].application_id, None);
        assert_eq!(outputs[1].source, Some(1));
        assert_eq!(outputs[2].application_id, None);
        assert_eq!(outputs[2].source, None);
    }

    #[test]
    fn test_parse_server_info() {
        let info: ServerInfo =
            serde_json::from_str(r#"{"server_name": "pulseaudio", "default_source_name": "mic"}"#)
                .unwrap();
        assert_eq!(info.default_source_name.as_deref(), Some("mic"));

        let info: ServerInfo = serde_json::from_str(r#"{"server_name": "pulseaudio"}"#).unwrap();
        assert_eq!(info.default_source_name, None);
    }
}
