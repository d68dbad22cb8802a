use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use super::*;
use crate::api::{ApiError, TrackSource};
use crate::library::Track;

#[derive(Default)]
struct Quiet {
    loads: Vec<String>,
    seeks: Vec<Duration>,
}

impl MediaOutput for Quiet {
    fn load(&mut self, locator: &str) {
        self.loads.push(locator.to_string());
    }
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek(&mut self, position: Duration) {
        self.seeks.push(position);
    }
    fn set_volume(&mut self, _volume: f32) {}
    fn stop(&mut self) {}
}

struct Nothing;

impl TrackSource for Nothing {
    fn label(&self) -> String {
        "nowhere".into()
    }

    fn songs(&self) -> Result<Vec<Track>, ApiError> {
        Ok(Vec::new())
    }
}

fn t(title: &str) -> Track {
    Track {
        id: title.to_lowercase(),
        name: title.into(),
        artists: vec![],
        album: None,
        media_url: format!("https://cdn.example/{title}.mp3"),
        artwork_url: String::new(),
        duration: None,
        display: title.into(),
    }
}

fn session_with(titles: &[&str], state_path: Option<PathBuf>) -> (Session<Quiet>, Receiver<NetEvent>) {
    let (tx, rx) = mpsc::channel();
    let requests = Requests::new(Arc::new(Nothing), tx);
    let ui = UiSettings::default();
    let controls = ControlsSettings::default();

    let mut app = App::new(&ui, requests.source_label());
    let ticket = app.request_songs();
    app.accept_songs(ticket, Ok(titles.iter().map(|s| t(s)).collect()));

    let surface = PlaybackSurface::new(Quiet::default(), &controls);
    let session = Session::new(
        app,
        QueueStore::with_seed(7),
        surface,
        requests,
        None,
        ui,
        controls,
        state_path,
    );
    (session, rx)
}

fn session(titles: &[&str]) -> Session<Quiet> {
    session_with(titles, None).0
}

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn keys(s: &mut Session<Quiet>, codes: &[KeyCode]) {
    for &code in codes {
        s.handle_key(press(code));
    }
}

fn mouse(kind: MouseEventKind, column: u16) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row: 11,
        modifiers: KeyModifiers::NONE,
    }
}

#[test]
fn enter_plays_selected_track_with_view_as_queue() {
    let mut s = session(&["Alpha", "Beta", "Gamma"]);
    keys(&mut s, &[KeyCode::Char('j'), KeyCode::Enter]);
    s.settle(Instant::now());

    assert_eq!(s.store.current().unwrap().id, "beta");
    assert_eq!(s.store.queue().len(), 3);
    assert_eq!(s.surface.output().loads, vec!["https://cdn.example/Beta.mp3"]);
    assert!(s.app.follow_playback);
}

#[test]
fn enter_on_the_playing_track_does_not_restart_it() {
    let mut s = session(&["Alpha", "Beta"]);
    keys(&mut s, &[KeyCode::Enter]);
    let seq = s.store.restart_seq();
    keys(&mut s, &[KeyCode::Enter]);
    assert_eq!(s.store.restart_seq(), seq);
}

#[test]
fn two_key_prefixes_jump_around_the_list() {
    let mut s = session(&["Alpha", "Beta", "Gamma"]);
    keys(&mut s, &[KeyCode::Char('G')]);
    assert_eq!(s.app.selected, 2);

    // An unrelated key in between cancels the prefix.
    keys(&mut s, &[KeyCode::Char('g'), KeyCode::Char('k')]);
    assert_eq!(s.app.selected, 1);
    keys(&mut s, &[KeyCode::Char('g'), KeyCode::Char('g')]);
    assert_eq!(s.app.selected, 0);

    keys(&mut s, &[KeyCode::Char('G'), KeyCode::Enter]);
    keys(&mut s, &[KeyCode::Char('g'), KeyCode::Char('g')]);
    assert_eq!(s.app.selected, 0);
    keys(&mut s, &[KeyCode::Char('z'), KeyCode::Char('z')]);
    assert_eq!(s.app.selected, 2);
}

#[test]
fn filter_enter_queues_only_matches() {
    let mut s = session(&["Alpha", "Beta", "Gamma"]);
    keys(
        &mut s,
        &[
            KeyCode::Char('/'),
            KeyCode::Char('q'),
            KeyCode::Backspace,
            KeyCode::Char('g'),
            KeyCode::Char('a'),
            KeyCode::Enter,
        ],
    );

    assert!(!s.app.filter_mode);
    assert_eq!(s.store.current().unwrap().id, "gamma");
    assert_eq!(s.store.queue().len(), 1);
}

#[test]
fn filter_enter_without_matches_does_nothing() {
    let mut s = session(&["Alpha"]);
    keys(&mut s, &[KeyCode::Char('/'), KeyCode::Char('x'), KeyCode::Enter]);
    assert!(s.app.filter_mode);
    assert!(s.store.current().is_none());
}

#[test]
fn quit_keys() {
    let mut s = session(&["Alpha"]);
    assert!(!s.handle_key(press(KeyCode::Char('x'))));
    assert!(s.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    assert!(s.handle_key(press(KeyCode::Char('q'))));
}

#[test]
fn play_pause_with_nothing_loaded_plays_selection() {
    let mut s = session(&["Alpha", "Beta"]);
    assert!(!s.handle_control(ControlCmd::PlayPause));
    assert!(s.store.is_playing());
    assert_eq!(s.store.current().unwrap().id, "alpha");

    s.handle_control(ControlCmd::PlayPause);
    assert!(!s.store.is_playing());
    assert!(s.handle_control(ControlCmd::Quit));
}

#[test]
fn mpris_seek_is_relative_and_clamped() {
    let mut s = session(&["Alpha"]);
    keys(&mut s, &[KeyCode::Enter]);
    s.store.set_duration(Duration::from_secs(60));

    s.handle_control(ControlCmd::Seek(3_000_000));
    assert_eq!(s.store.progress(), Duration::from_secs(3));
    s.handle_control(ControlCmd::Seek(-5_000_000));
    assert_eq!(s.store.progress(), Duration::ZERO);
    s.handle_control(ControlCmd::SetPosition(Duration::from_secs(90)));
    assert_eq!(s.store.progress(), Duration::from_secs(60));
}

#[test]
fn deleted_song_leaves_the_queue() {
    let mut s = session(&["Alpha", "Beta", "Gamma"]);
    keys(&mut s, &[KeyCode::Char('j'), KeyCode::Enter]);

    s.handle_net(NetEvent::SongDeleted {
        id: "beta".into(),
        result: Ok(()),
    });
    assert_eq!(s.app.songs.len(), 2);
    assert_eq!(s.store.queue().len(), 2);
    assert_eq!(s.store.current().unwrap().id, "gamma");
}

#[test]
fn media_failure_becomes_a_notice() {
    let mut s = session(&["Alpha"]);
    keys(&mut s, &[KeyCode::Enter]);
    s.handle_media(MediaEvent::Failed {
        locator: "https://cdn.example/Alpha.mp3".into(),
        reason: "no output device".into(),
    });
    assert!(!s.store.is_playing());
    assert!(s.app.notices.latest().unwrap().text.contains("no output device"));
}

#[test]
fn mouse_drag_on_progress_bar_seeks_on_release() {
    let mut s = session(&["Alpha"]);
    keys(&mut s, &[KeyCode::Enter]);
    s.store.set_duration(Duration::from_secs(100));
    s.progress_area = Rect::new(0, 10, 22, 3);

    s.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 11));
    assert_eq!(s.surface.seek_preview(), Some(0.5));
    s.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 30));
    assert_eq!(s.surface.seek_preview(), Some(1.0));
    assert!(s.surface.output().seeks.is_empty());

    s.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6));
    assert_eq!(s.surface.seek_preview(), None);
    assert_eq!(s.store.progress(), Duration::from_secs(25));
    assert_eq!(s.surface.output().seeks, vec![Duration::from_secs(25)]);
}

#[test]
fn clicks_outside_the_progress_bar_are_ignored() {
    let mut s = session(&["Alpha"]);
    s.progress_area = Rect::new(0, 10, 22, 3);
    s.handle_mouse(MouseEvent {
        row: 2,
        ..mouse(MouseEventKind::Down(MouseButton::Left), 5)
    });
    assert_eq!(s.surface.seek_preview(), None);
}

#[test]
fn playback_preferences_are_saved_when_they_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.toml");
    let (mut s, _rx) = session_with(&["Alpha"], Some(path.clone()));

    s.settle(Instant::now());
    assert!(!path.exists());

    keys(&mut s, &[KeyCode::Char('s'), KeyCode::Char('r')]);
    s.settle(Instant::now());
    let saved = PersistedPlayback::load(&path).unwrap().unwrap();
    assert!(saved.shuffle);
    assert_eq!(saved.repeat, crate::store::RepeatMode::All);
}

#[test]
fn favourite_key_needs_a_user() {
    let (mut s, rx) = session_with(&["Alpha"], None);
    keys(&mut s, &[KeyCode::Char('f')]);
    assert!(!s.app.notices.is_empty());
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn picking_from_the_queued_list_keeps_shuffled_order() {
    let mut s = session(&["Alpha", "Beta", "Gamma", "Delta"]);
    keys(&mut s, &[KeyCode::Enter, KeyCode::Char('s')]);
    let shuffled: Vec<String> = s.store.queue().iter().map(|t| t.id.clone()).collect();

    keys(&mut s, &[KeyCode::Char('G'), KeyCode::Enter]);
    let after: Vec<String> = s.store.queue().iter().map(|t| t.id.clone()).collect();
    assert_eq!(after, shuffled);
    assert_eq!(s.store.current().unwrap().id, "delta");
    assert!(s.store.is_shuffle());
}
