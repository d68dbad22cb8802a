//! MPRIS (D-Bus) media controls.
//!
//! The service runs on its own thread; calls from the desktop become
//! `ControlCmd`s for the event loop, and properties are read from a shared
//! snapshot the event loop refreshes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{info, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::store::RepeatMode;

pub const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    SetPosition(Duration),
    SetVolume(f32),
    SetShuffle(bool),
    SetRepeat(RepeatMode),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMeta {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub art_url: String,
    pub url: String,
    pub length: Option<Duration>,
}

/// Everything the player interface reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: PlaybackStatus,
    pub track: Option<TrackMeta>,
    pub position: Duration,
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            track: None,
            position: Duration::ZERO,
            volume: 1.0,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

pub fn loop_status(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::None => "None",
        RepeatMode::All => "Playlist",
        RepeatMode::One => "Track",
    }
}

pub fn parse_loop_status(s: &str) -> Option<RepeatMode> {
    match s {
        "None" => Some(RepeatMode::None),
        "Playlist" => Some(RepeatMode::All),
        "Track" => Some(RepeatMode::One),
        _ => None,
    }
}

/// D-Bus object path for a track id. Ids may contain anything, paths may not.
pub fn track_object_path(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if safe.is_empty() {
        "/org/mpris/MediaPlayer2/TrackList/NoTrack".to_string()
    } else {
        format!("/org/encore/track/t{safe}")
    }
}

fn owned(v: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(v).ok()
}

pub fn metadata_map(track: Option<&TrackMeta>) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    let Some(t) = track else {
        return map;
    };

    let mut put = |key: &str, value: Option<OwnedValue>| {
        if let Some(v) = value {
            map.insert(key.to_string(), v);
        }
    };

    let path = ObjectPath::try_from(track_object_path(&t.id)).ok();
    put("mpris:trackid", path.and_then(|p| owned(Value::from(p))));
    put("xesam:title", owned(Value::from(t.title.clone())));
    put("xesam:artist", owned(Value::from(t.artists.clone())));
    if let Some(album) = &t.album {
        put("xesam:album", owned(Value::from(album.clone())));
    }
    if !t.art_url.is_empty() {
        put("mpris:artUrl", owned(Value::from(t.art_url.clone())));
    }
    put("xesam:url", owned(Value::from(t.url.clone())));
    if let Some(len) = t.length {
        put("mpris:length", owned(Value::from(micros(len))));
    }
    map
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

pub struct MprisHandle {
    state: Arc<Mutex<Snapshot>>,
}

impl MprisHandle {
    pub fn update(&self, snapshot: Snapshot) {
        if let Ok(mut s) = self.state.lock() {
            *s = snapshot;
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["http".to_string(), "https".to_string(), "file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<Snapshot>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        let _ = self.tx.send(cmd);
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        match self.state.lock() {
            Ok(s) => f(&s),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        self.send(ControlCmd::Seek(offset));
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.read(|s| s.track.as_ref().map(|t| track_object_path(&t.id)));
        // Stale requests for another track are ignored.
        if current.as_deref() == Some(track_id.as_str()) && position >= 0 {
            self.send(ControlCmd::SetPosition(Duration::from_micros(position as u64)));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.read(|s| s.status.as_str())
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        self.read(|s| loop_status(s.repeat))
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        match parse_loop_status(&value) {
            Some(mode) => self.send(ControlCmd::SetRepeat(mode)),
            None => warn!(%value, "unknown LoopStatus"),
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read(|s| s.shuffle)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.read(|s| f64::from(s.volume))
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        if value.is_finite() {
            self.send(ControlCmd::SetVolume(value.clamp(0.0, 1.0) as f32));
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(|s| micros(s.position))
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.read(|s| s.track.as_ref().is_some_and(|t| t.length.is_some()))
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        self.read(|s| metadata_map(s.track.as_ref()))
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(Snapshot::default()));

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("mpris".to_string())
        .spawn(move || {
            block_on(async move {
                let connection = match Connection::session().await {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(error = %e, "MPRIS: failed to connect to session bus");
                        return;
                    }
                };

                if let Err(e) = connection.request_name(BUS_NAME).await {
                    warn!(error = %e, "MPRIS: failed to acquire name");
                    return;
                }

                let object_server = connection.object_server();

                if let Err(e) = object_server
                    .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                    .await
                {
                    warn!(error = %e, "MPRIS: failed to register root iface");
                    return;
                }

                if let Err(e) = object_server
                    .at(
                        OBJECT_PATH,
                        PlayerIface {
                            tx,
                            state: state_for_thread,
                        },
                    )
                    .await
                {
                    warn!(error = %e, "MPRIS: failed to register player iface");
                    return;
                }
                info!(name = BUS_NAME, "MPRIS service up");

                // Keep the service alive.
                loop {
                    Timer::after(Duration::from_secs(3600)).await;
                }
            });
        });
    if let Err(e) = spawned {
        warn!(error = %e, "MPRIS: failed to spawn thread");
    }

    MprisHandle { state }
}

#[cfg(test)]
mod tests;
