use std::io::Stdout;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::layout::Rect;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::{App, PlayRequest};
use crate::config::{ControlsSettings, UiSettings};
use crate::mpris::{ControlCmd, MprisHandle, Snapshot};
use crate::runtime::mpris_sync::update_mpris;
use crate::store::{PersistedPlayback, QueueStore};
use crate::surface::{MediaEvent, MediaOutput, PlaybackSurface};
use crate::sync::{NetEvent, Requests};
use crate::ui;

/// Everything the event loop owns between iterations.
pub struct Session<O: MediaOutput> {
    pub app: App,
    pub store: QueueStore,
    pub surface: PlaybackSurface<O>,
    requests: Requests,
    mpris: Option<MprisHandle>,
    ui: UiSettings,
    controls: ControlsSettings,

    /// Two-key prefixes for `gg` and `zz`.
    pending_gg: bool,
    pending_zz: bool,
    /// Where the progress bar was last drawn, for mouse seeking.
    progress_area: Rect,

    state_path: Option<PathBuf>,
    persisted: PersistedPlayback,
    last_mpris: Option<Snapshot>,
}

impl<O: MediaOutput> Session<O> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        app: App,
        store: QueueStore,
        surface: PlaybackSurface<O>,
        requests: Requests,
        mpris: Option<MprisHandle>,
        ui: UiSettings,
        controls: ControlsSettings,
        state_path: Option<PathBuf>,
    ) -> Self {
        let persisted = PersistedPlayback::from_store(&store);
        Self {
            app,
            store,
            surface,
            requests,
            mpris,
            ui,
            controls,
            pending_gg: false,
            pending_zz: false,
            progress_area: Rect::default(),
            state_path,
            persisted,
            last_mpris: None,
        }
    }

    fn play(&mut self, req: PlayRequest) {
        self.app.follow_playback_on();
        // Picking from the list that is already queued keeps its shuffled order.
        let same_list = self.store.original_queue().len() == req.queue.len()
            && self
                .store
                .original_queue()
                .iter()
                .zip(&req.queue)
                .all(|(a, b)| a.id == b.id);
        let queued_at = self
            .store
            .position_of_original(req.index)
            .filter(|&i| self.store.queue().get(i).is_some_and(|t| t.id == req.track.id));
        match queued_at {
            Some(i) if same_list => self.store.play_at_index(i),
            _ => self.store.play(req.track, Some(req.queue), Some(req.index)),
        }
    }

    /// Play the selected row, or resume whatever is loaded.
    fn play_selected_or_resume(&mut self) {
        if self.store.current().is_some() {
            self.store.resume();
        } else if let Some(req) = self.app.play_request() {
            self.play(req);
        }
    }

    /// Returns `true` when the app should quit.
    pub fn handle_control(&mut self, cmd: ControlCmd) -> bool {
        debug!(?cmd, "control command");
        match cmd {
            ControlCmd::Quit => return true,
            ControlCmd::Play => self.play_selected_or_resume(),
            ControlCmd::Pause => self.store.pause(),
            ControlCmd::PlayPause => {
                if self.store.is_playing() {
                    self.store.pause();
                } else {
                    self.play_selected_or_resume();
                }
            }
            ControlCmd::Stop => {
                self.store.pause();
                self.surface.seek_to(Duration::ZERO, &mut self.store);
            }
            ControlCmd::Next => self.store.next(),
            ControlCmd::Prev => self.store.previous(),
            ControlCmd::Seek(offset) => {
                let delta = Duration::from_micros(offset.unsigned_abs());
                self.surface
                    .seek_relative(offset >= 0, delta, &mut self.store);
            }
            ControlCmd::SetPosition(target) => self.surface.seek_to(target, &mut self.store),
            ControlCmd::SetVolume(v) => self.store.set_volume(v),
            ControlCmd::SetShuffle(on) => self.store.set_shuffle(on),
            ControlCmd::SetRepeat(mode) => self.store.set_repeat_mode(mode),
        }
        false
    }

    pub fn handle_media(&mut self, event: MediaEvent) {
        if let Err(e) = self.surface.handle_event(event, &mut self.store) {
            self.app.report_text(e.to_string());
        }
    }

    pub fn handle_net(&mut self, event: NetEvent) {
        match event {
            NetEvent::Songs { ticket, result } => {
                self.app.accept_songs(ticket, result);
            }
            NetEvent::Profile(result) => self.app.accept_profile(result),
            NetEvent::Playlists(result) => self.app.accept_playlists(result),
            NetEvent::Playlist { ticket, result } => {
                self.app.accept_playlist(ticket, result);
            }
            NetEvent::Favourite { edit, result } => self.app.finish_toggle_favourite(edit, result),
            NetEvent::PlaylistAddition {
                playlist_id,
                result,
            } => self.app.finish_add_to_playlist(&playlist_id, result),
            NetEvent::PlaylistRemoval { edit, result } => {
                self.app.finish_remove_from_playlist(edit, result)
            }
            NetEvent::SongDeleted { id, result } => {
                if self.app.finish_delete_song(&id, result) {
                    self.store.remove_track(&id);
                }
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let fraction = ui::seek_fraction(self.progress_area, mouse.column);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left)
                if ui::contains(self.progress_area, mouse.column, mouse.row) =>
            {
                self.surface.begin_seek(&self.store);
                self.surface.drag_seek(fraction);
            }
            MouseEventKind::Drag(MouseButton::Left) => self.surface.drag_seek(fraction),
            MouseEventKind::Up(MouseButton::Left) if self.surface.seek_preview().is_some() => {
                self.surface.end_seek(fraction, &mut self.store);
            }
            _ => {}
        }
    }

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        if self.app.filter_mode {
            self.pending_gg = false;
            self.pending_zz = false;
            self.handle_filter_key(key);
            return false;
        }

        let gg = std::mem::take(&mut self.pending_gg);
        let zz = std::mem::take(&mut self.pending_zz);

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                self.surface.cancel_seek();
                self.app.metadata_window = false;
            }
            KeyCode::Char('/') => self.app.enter_filter_mode(),
            KeyCode::Char('g') => {
                if gg {
                    self.app.follow_playback_off();
                    self.app.select_first();
                } else {
                    self.pending_gg = true;
                }
            }
            KeyCode::Char('G') => {
                self.app.follow_playback_off();
                self.app.select_last();
            }
            KeyCode::Char('z') => {
                if zz {
                    if let Some(id) = self.store.current().map(|t| t.id.clone()) {
                        self.app.select_track_id(&id);
                    }
                } else {
                    self.pending_zz = true;
                }
            }
            KeyCode::Char('j') => {
                self.app.follow_playback_off();
                self.app.next();
            }
            KeyCode::Char('k') => {
                self.app.follow_playback_off();
                self.app.prev();
            }
            KeyCode::Enter => {
                let already_playing = self.store.is_playing()
                    && self
                        .store
                        .current()
                        .zip(self.app.selected_track())
                        .is_some_and(|(c, s)| c.id == s.id);
                if !already_playing {
                    if let Some(req) = self.app.play_request() {
                        self.play(req);
                    }
                }
            }
            KeyCode::Char('p') => self.store.toggle_play(),
            KeyCode::Char('l') => self.store.next(),
            KeyCode::Char('h') => self.store.previous(),
            KeyCode::Char('s') => self.store.toggle_shuffle(),
            KeyCode::Char('r') => self.store.cycle_repeat(),
            KeyCode::Char('m') => self.store.toggle_mini_player(),
            KeyCode::Char('K') => self.app.toggle_metadata_window(),
            KeyCode::Char('f') => {
                if let Some(id) = self.app.selected_track().map(|t| t.id.clone()) {
                    if let Some(edit) = self.app.begin_toggle_favourite(&id) {
                        self.requests.toggle_favourite(edit, id);
                    }
                }
            }
            KeyCode::Char('1') => self.app.show_all(),
            KeyCode::Char('2') => self.app.show_favourites(),
            KeyCode::Char('3') => {
                if let Some((ticket, id)) = self.app.next_playlist() {
                    self.requests.fetch_playlist(ticket, id);
                }
            }
            KeyCode::Char('a') => {
                if let Some((playlist_id, song_id)) = self.app.begin_add_to_playlist() {
                    self.requests.add_to_playlist(playlist_id, song_id);
                }
            }
            KeyCode::Char('d') => {
                if let Some((edit, playlist_id, song_id)) = self.app.begin_remove_from_playlist() {
                    self.requests.remove_from_playlist(edit, playlist_id, song_id);
                }
            }
            KeyCode::Char('X') => {
                if let Some(track) = self.app.begin_delete_song() {
                    self.requests.delete_song(track);
                }
            }
            KeyCode::Char('o') => match self.app.spotlight_request() {
                Some(req) => self.play(req),
                None => self.app.notify("Nothing in the spotlight yet"),
            },
            KeyCode::Char('R') => self.reload(),
            code => {
                self.surface.handle_key(code, &mut self.store, false);
            }
        }
        false
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.app.clear_filter(),
            KeyCode::Backspace => self.app.pop_filter_char(),
            KeyCode::Down => self.app.next(),
            KeyCode::Up => self.app.prev(),
            KeyCode::Char('j' | 'n') if ctrl => self.app.next(),
            KeyCode::Char('k' | 'p') if ctrl => self.app.prev(),
            KeyCode::Char(c) if !c.is_control() => self.app.push_filter_char(c),
            KeyCode::Enter => {
                // No visible results, nothing to play.
                if let Some(req) = self.app.play_request() {
                    self.app.exit_filter_mode();
                    self.play(req);
                }
            }
            _ => {}
        }
    }

    fn reload(&mut self) {
        self.app.notify(format!("Reloading from {}", self.requests.source_label()));
        let ticket = self.app.request_songs();
        self.requests.fetch_songs(ticket);
        self.requests.fetch_profile();
        self.requests.fetch_playlists();
        if let Some((ticket, id)) = self.app.reload_playlist() {
            self.requests.fetch_playlist(ticket, id);
        }
    }

    /// Per-iteration bookkeeping after all input has been applied.
    pub fn settle(&mut self, now: Instant) {
        self.surface.sync(&self.store);
        self.app.follow(self.store.current());
        self.persist_if_changed();
        self.app.tick(now);
        if let Some(mpris) = &self.mpris {
            update_mpris(mpris, &self.store, &mut self.last_mpris);
        }
    }

    fn persist_if_changed(&mut self) {
        let current = PersistedPlayback::from_store(&self.store);
        if current == self.persisted {
            return;
        }
        self.persisted = current;
        if let Some(path) = &self.state_path {
            if let Err(e) = current.save(path) {
                warn!(error = %e, "failed to save playback state");
            }
        }
    }

    pub fn draw(&mut self, frame: &mut ratatui::Frame) {
        self.progress_area = ui::draw(
            frame,
            &self.app,
            &self.store,
            self.surface.seek_preview(),
            &self.ui,
            &self.controls,
        );
    }
}

/// Main terminal event loop: drains media, network and MPRIS events, draws,
/// then polls input. Returns `Ok(())` when shutdown is requested.
pub fn run<O: MediaOutput>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session<O>,
    media_rx: &Receiver<MediaEvent>,
    net_rx: &Receiver<NetEvent>,
    control_rx: &Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(event) = media_rx.try_recv() {
            session.handle_media(event);
        }
        while let Ok(event) = net_rx.try_recv() {
            session.handle_net(event);
        }
        while let Ok(cmd) = control_rx.try_recv() {
            if session.handle_control(cmd) {
                return Ok(());
            }
        }

        session.settle(Instant::now());
        terminal.draw(|f| session.draw(f))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if session.handle_key(key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => session.handle_mouse(mouse),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests;
