use super::*;
use std::sync::mpsc;
use std::time::Duration;

fn meta() -> TrackMeta {
    TrackMeta {
        id: "64f1c0ffee".to_string(),
        title: "Test Title".to_string(),
        artists: vec!["Test Artist".to_string(), "Guest".to_string()],
        album: Some("Test Album".to_string()),
        art_url: "https://cdn.example/art.jpg".to_string(),
        url: "https://cdn.example/song.mp3".to_string(),
        length: Some(Duration::from_micros(1_234_567)),
    }
}

fn iface(snapshot: Snapshot) -> (PlayerIface, mpsc::Receiver<ControlCmd>) {
    let (tx, rx) = mpsc::channel();
    let iface = PlayerIface {
        tx,
        state: Arc::new(Mutex::new(snapshot)),
    };
    (iface, rx)
}

#[test]
fn loop_status_round_trips_every_mode() {
    for mode in [RepeatMode::None, RepeatMode::All, RepeatMode::One] {
        assert_eq!(parse_loop_status(loop_status(mode)), Some(mode));
    }
    assert_eq!(loop_status(RepeatMode::All), "Playlist");
    assert_eq!(parse_loop_status("Forever"), None);
}

#[test]
fn track_paths_are_valid_object_paths() {
    let path = track_object_path("a-b/c d");
    assert_eq!(path, "/org/encore/track/ta_b_c_d");
    assert!(ObjectPath::try_from(path.as_str()).is_ok());
    assert!(ObjectPath::try_from(track_object_path("").as_str()).is_ok());
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let mut map = metadata_map(Some(&meta()));
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "mpris:artUrl",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
    let length = i64::try_from(map.remove("mpris:length").unwrap()).unwrap();
    assert_eq!(length, 1_234_567);
}

#[test]
fn metadata_omits_unknown_fields() {
    let mut t = meta();
    t.album = None;
    t.art_url.clear();
    t.length = None;
    let map = metadata_map(Some(&t));
    assert!(!map.contains_key("xesam:album"));
    assert!(!map.contains_key("mpris:artUrl"));
    assert!(!map.contains_key("mpris:length"));
    assert!(metadata_map(None).is_empty());
}

#[test]
fn handle_update_replaces_snapshot() {
    let state = Arc::new(Mutex::new(Snapshot::default()));
    let handle = MprisHandle {
        state: state.clone(),
    };
    handle.update(Snapshot {
        status: PlaybackStatus::Playing,
        track: Some(meta()),
        position: Duration::from_secs(3),
        volume: 0.4,
        shuffle: true,
        repeat: RepeatMode::One,
    });

    let s = state.lock().unwrap();
    assert_eq!(s.status, PlaybackStatus::Playing);
    assert_eq!(s.track.as_ref().map(|t| t.title.as_str()), Some("Test Title"));
    assert!(s.shuffle);
}

#[test]
fn player_properties_read_the_snapshot() {
    let (iface, _rx) = iface(Snapshot {
        status: PlaybackStatus::Paused,
        track: Some(meta()),
        position: Duration::from_millis(1500),
        volume: 0.5,
        shuffle: true,
        repeat: RepeatMode::All,
    });
    assert_eq!(iface.playback_status(), "Paused");
    assert_eq!(iface.loop_status(), "Playlist");
    assert_eq!(iface.position(), 1_500_000);
    assert!((iface.volume() - 0.5).abs() < f64::EPSILON);
    assert!(iface.shuffle());
    assert!(iface.can_seek());
}

#[test]
fn property_writes_become_commands() {
    let (mut iface, rx) = iface(Snapshot::default());
    iface.set_volume(1.7);
    iface.set_shuffle(true);
    iface.set_loop_status("Track".to_string());
    iface.set_loop_status("bogus".to_string());

    let cmds: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        cmds,
        vec![
            ControlCmd::SetVolume(1.0),
            ControlCmd::SetShuffle(true),
            ControlCmd::SetRepeat(RepeatMode::One),
        ]
    );
}

#[test]
fn set_position_ignores_other_tracks() {
    let (iface, rx) = iface(Snapshot {
        track: Some(meta()),
        ..Snapshot::default()
    });
    let current = track_object_path("64f1c0ffee");
    let other = track_object_path("other");

    iface.set_position(ObjectPath::try_from(other.as_str()).unwrap(), 5_000_000);
    iface.set_position(ObjectPath::try_from(current.as_str()).unwrap(), 5_000_000);

    let cmds: Vec<_> = rx.try_iter().collect();
    assert_eq!(cmds, vec![ControlCmd::SetPosition(Duration::from_secs(5))]);
}
