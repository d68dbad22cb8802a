//! Application model: `App` and the view it shows.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::{ApiError, UserRecord};
use crate::config::UiSettings;
use crate::library::{Playlist, PlaylistItem, PlaylistSummary, Track};
use crate::spotlight::Spotlight;
use crate::sync::{EditId, Generation, Ledger, Ticket};

use super::fuzzy::{fuzzy_match_positions, fuzzy_match_positions_lower};
use super::notice::{NoticeKind, Notices};

/// Which list the main pane shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum View {
    All,
    Favourites,
    Playlist,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            View::All => "All songs",
            View::Favourites => "Favourites",
            View::Playlist => "Playlist",
        }
    }
}

/// Prior state of an optimistic favourite toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct FavouriteEdit {
    pub song_id: String,
    pub was_favourite: bool,
}

/// Prior state of an optimistic removal from a playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRemoval {
    pub playlist_id: String,
    pub position: usize,
    pub item: PlaylistItem,
}

/// What Enter hands to the queue store.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub track: Track,
    pub queue: Vec<Track>,
    pub index: usize,
}

/// The main application model.
pub struct App {
    /// Whole catalogue as last fetched.
    pub songs: Vec<Track>,
    pub view: View,
    /// Tracks behind the current view, before filtering.
    rows: Vec<Track>,
    lower_titles: Option<Vec<String>>,
    /// Index into `rows`.
    pub selected: usize,

    pub user: Option<UserRecord>,
    pub favourites: HashSet<String>,
    pub playlists: Vec<PlaylistSummary>,
    playlist_cursor: Option<usize>,
    pub playlist: Option<Playlist>,
    pub loading: bool,

    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    pub metadata_window: bool,
    pub source_label: String,

    pub notices: Notices,
    pub spotlight: Spotlight,

    songs_gen: Generation,
    playlist_gen: Generation,
    favourite_edits: Ledger<FavouriteEdit>,
    playlist_edits: Ledger<PlaylistRemoval>,
}

impl App {
    pub fn new(ui: &UiSettings, source_label: String) -> Self {
        Self::with_spotlight(ui, source_label, Spotlight::new(ui.spotlight_secs))
    }

    pub fn with_spotlight(ui: &UiSettings, source_label: String, spotlight: Spotlight) -> Self {
        Self {
            songs: Vec::new(),
            view: View::All,
            rows: Vec::new(),
            lower_titles: None,
            selected: 0,

            user: None,
            favourites: HashSet::new(),
            playlists: Vec::new(),
            playlist_cursor: None,
            playlist: None,
            loading: false,

            follow_playback: ui.follow_playback,
            filter_mode: false,
            filter_query: String::new(),
            metadata_window: false,
            source_label,

            notices: Notices::new(Duration::from_secs(ui.toast_secs.max(1))),
            spotlight,

            songs_gen: Generation::default(),
            playlist_gen: Generation::default(),
            favourite_edits: Ledger::default(),
            playlist_edits: Ledger::default(),
        }
    }

    pub fn rows(&self) -> &[Track] {
        &self.rows
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserRecord::is_admin)
    }

    pub fn is_favourite(&self, id: &str) -> bool {
        self.favourites.contains(id)
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notices.push(NoticeKind::Info, text, Instant::now());
    }

    pub fn report(&mut self, err: &ApiError) {
        if err.is_auth() {
            warn!(error = %err, "request rejected");
        } else {
            debug!(error = %err, "request failed");
        }
        self.notices.push(NoticeKind::Error, err.notice(), Instant::now());
    }

    pub fn report_text(&mut self, text: impl Into<String>) {
        self.notices.push(NoticeKind::Error, text, Instant::now());
    }

    /// Periodic housekeeping. Returns whether a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = self.notices.expire(now);
        let rotated = self.spotlight.tick(&self.songs, now);
        expired || rotated
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    // ---- rows and selection -------------------------------------------------

    /// Rebuild `rows` for the current view, keeping the selected track if it
    /// is still there.
    fn refresh_rows(&mut self) {
        let keep = self.selected_track().map(|t| t.id.clone());

        self.rows = match self.view {
            View::All => self.songs.clone(),
            View::Favourites => self
                .songs
                .iter()
                .filter(|t| self.favourites.contains(&t.id))
                .cloned()
                .collect(),
            View::Playlist => self.playlist.as_ref().map(Playlist::tracks).unwrap_or_default(),
        };

        // Lowercase titles speed up filtering on larger lists.
        self.lower_titles = (self.rows.len() > 100).then(|| {
            self.rows
                .iter()
                .map(|t| t.display.to_ascii_lowercase())
                .collect()
        });

        self.selected = keep
            .and_then(|id| self.rows.iter().position(|t| t.id == id))
            .unwrap_or(0);
        self.ensure_selected_visible();
    }

    /// Indices into `rows` that pass the filter, in display order.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.rows.len()).collect();
        }

        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_ascii_lowercase();
                (0..self.rows.len())
                    .filter(|&i| fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some())
                    .collect()
            }
            None => (0..self.rows.len())
                .filter(|&i| fuzzy_match_positions(&self.rows[i].display, query).is_some())
                .collect(),
        }
    }

    /// Character positions of `query_lower` in row `index`, for highlighting.
    pub fn match_positions(&self, index: usize, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => fuzzy_match_positions_lower(&lower_titles[index], query_lower),
            None => fuzzy_match_positions(&self.rows[index].display, query_lower),
        }
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.rows.get(self.selected)
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    /// Select the row holding track `id`, if the view shows it.
    pub fn select_track_id(&mut self, id: &str) -> bool {
        let display = self.display_indices();
        match display.into_iter().find(|&i| self.rows[i].id == id) {
            Some(i) => {
                self.selected = i;
                true
            }
            None => false,
        }
    }

    /// Move the cursor to the now-playing track when following playback.
    pub fn follow(&mut self, current: Option<&Track>) {
        if self.follow_playback {
            if let Some(t) = current {
                self.select_track_id(&t.id);
            }
        }
    }

    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }
        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// The selected track, with the filtered view as its queue.
    pub fn play_request(&self) -> Option<PlayRequest> {
        let display = self.display_indices();
        let index = display.iter().position(|&i| i == self.selected)?;
        let queue: Vec<Track> = display.iter().map(|&i| self.rows[i].clone()).collect();
        Some(PlayRequest {
            track: queue[index].clone(),
            queue,
            index,
        })
    }

    /// The spotlight track, queued alone.
    pub fn spotlight_request(&self) -> Option<PlayRequest> {
        let track = self.spotlight.current()?.clone();
        Some(PlayRequest {
            queue: vec![track.clone()],
            track,
            index: 0,
        })
    }

    // ---- filter -------------------------------------------------------------

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    // ---- views --------------------------------------------------------------

    pub fn show_all(&mut self) {
        self.playlist_gen.invalidate();
        self.view = View::All;
        self.loading = false;
        self.refresh_rows();
    }

    pub fn show_favourites(&mut self) {
        self.playlist_gen.invalidate();
        self.view = View::Favourites;
        self.loading = false;
        if self.user.is_none() {
            self.notify("Favourites need a signed-in user");
        }
        self.refresh_rows();
    }

    /// Switch to the next playlist. Returns the fetch to issue.
    pub fn next_playlist(&mut self) -> Option<(Ticket, String)> {
        if self.playlists.is_empty() {
            self.notify("No playlists");
            return None;
        }
        let cursor = self
            .playlist_cursor
            .map_or(0, |c| (c + 1) % self.playlists.len());
        self.playlist_cursor = Some(cursor);
        let id = self.playlists[cursor].id.clone();
        self.open_playlist(id)
    }

    fn open_playlist(&mut self, id: String) -> Option<(Ticket, String)> {
        self.view = View::Playlist;
        self.playlist = None;
        self.loading = true;
        self.refresh_rows();
        Some((self.playlist_gen.issue(), id))
    }

    /// Re-fetch the open playlist, if one is showing.
    pub fn reload_playlist(&mut self) -> Option<(Ticket, String)> {
        if self.view != View::Playlist {
            return None;
        }
        let id = self.playlist_cursor.and_then(|c| self.playlists.get(c))?.id.clone();
        self.loading = true;
        Some((self.playlist_gen.issue(), id))
    }

    pub fn view_title(&self) -> String {
        match (self.view, &self.playlist) {
            (View::Playlist, Some(p)) => format!("Playlist: {}", p.name),
            (View::Playlist, None) => self
                .playlist_cursor
                .and_then(|c| self.playlists.get(c))
                .map_or_else(|| "Playlist".to_string(), |p| format!("Playlist: {}", p.name)),
            (v, _) => v.label().to_string(),
        }
    }

    // ---- fetch results ------------------------------------------------------

    pub fn request_songs(&mut self) -> Ticket {
        self.loading = true;
        self.songs_gen.issue()
    }

    /// Apply a catalogue fetch. Stale answers are dropped; returns whether it
    /// was applied.
    pub fn accept_songs(&mut self, ticket: Ticket, result: Result<Vec<Track>, ApiError>) -> bool {
        if !self.songs_gen.is_current(ticket) {
            debug!("dropping stale song list");
            return false;
        }
        if self.view != View::Playlist {
            self.loading = false;
        }
        match result {
            Ok(songs) => {
                info!(count = songs.len(), "catalogue loaded");
                self.songs = songs;
                self.refresh_rows();
                let gone = self
                    .spotlight
                    .current()
                    .filter(|c| !self.songs.iter().any(|t| t.id == c.id))
                    .map(|c| c.id.clone());
                if let Some(id) = gone {
                    self.spotlight.forget(&id);
                }
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn accept_playlist(&mut self, ticket: Ticket, result: Result<Playlist, ApiError>) -> bool {
        if !self.playlist_gen.is_current(ticket) {
            debug!("dropping stale playlist");
            return false;
        }
        self.loading = false;
        match result {
            Ok(p) => {
                self.playlist = Some(p);
                self.refresh_rows();
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn accept_profile(&mut self, result: Result<Option<UserRecord>, ApiError>) {
        match result {
            Ok(Some(user)) => {
                // Pending toggles are already reflected locally.
                if self.favourite_edits.is_empty() {
                    self.favourites = user.favourites.iter().cloned().collect();
                }
                self.user = Some(user);
                if self.view == View::Favourites {
                    self.refresh_rows();
                }
            }
            Ok(None) => {}
            Err(e) => self.report(&e),
        }
    }

    pub fn accept_playlists(&mut self, result: Result<Vec<PlaylistSummary>, ApiError>) {
        match result {
            Ok(list) => {
                let open = self
                    .playlist_cursor
                    .and_then(|c| self.playlists.get(c))
                    .map(|p| p.id.clone());
                self.playlists = list;
                self.playlist_cursor =
                    open.and_then(|id| self.playlists.iter().position(|p| p.id == id));
            }
            Err(e) => self.report(&e),
        }
    }

    // ---- optimistic edits ---------------------------------------------------

    /// Flip `song_id` locally and record the prior state.
    pub fn begin_toggle_favourite(&mut self, song_id: &str) -> Option<EditId> {
        if self.user.is_none() {
            self.notify("Favourites need a signed-in user");
            return None;
        }
        let was_favourite = self.favourites.contains(song_id);
        self.set_favourite(song_id, !was_favourite);
        Some(self.favourite_edits.record(FavouriteEdit {
            song_id: song_id.to_string(),
            was_favourite,
        }))
    }

    fn set_favourite(&mut self, song_id: &str, on: bool) {
        if on {
            self.favourites.insert(song_id.to_string());
        } else {
            self.favourites.remove(song_id);
        }
        if self.view == View::Favourites {
            self.refresh_rows();
        }
    }

    pub fn finish_toggle_favourite(&mut self, edit: EditId, result: Result<Vec<String>, ApiError>) {
        match result {
            Ok(server) => {
                self.favourite_edits.commit(edit);
                if self.favourite_edits.is_empty() {
                    self.favourites = server.into_iter().collect();
                    if self.view == View::Favourites {
                        self.refresh_rows();
                    }
                }
            }
            Err(e) => {
                if let Some(prior) = self.favourite_edits.rollback(edit) {
                    // Later toggles of the same song recorded this one's result as
                    // their prior. Dropping a toggle flips both.
                    let mut stacked = false;
                    for later in self
                        .favourite_edits
                        .pending_after_mut(edit)
                        .filter(|p| p.song_id == prior.song_id)
                    {
                        later.was_favourite = !later.was_favourite;
                        stacked = true;
                    }
                    let restored = if stacked {
                        !self.favourites.contains(&prior.song_id)
                    } else {
                        prior.was_favourite
                    };
                    self.set_favourite(&prior.song_id, restored);
                }
                self.report(&e);
            }
        }
    }

    /// Add the selected track to the playlist last opened with `3`.
    /// Returns the ids to send.
    pub fn begin_add_to_playlist(&mut self) -> Option<(String, String)> {
        let Some(target) = self.playlist_cursor.and_then(|c| self.playlists.get(c)) else {
            self.notify("Open a playlist first, then add songs to it");
            return None;
        };
        let playlist_id = target.id.clone();
        if self.view == View::Playlist {
            self.notify("Already in this playlist");
            return None;
        }
        let song_id = self.selected_track()?.id.clone();
        Some((playlist_id, song_id))
    }

    pub fn finish_add_to_playlist(&mut self, playlist_id: &str, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.adjust_song_count(playlist_id, 1);
                let name = self
                    .playlists
                    .iter()
                    .find(|s| s.id == playlist_id)
                    .map_or(playlist_id, |s| s.name.as_str());
                self.notify(format!("Added to {name}"));
            }
            Err(e) => self.report(&e),
        }
    }

    /// Remove the selected track from the open playlist locally.
    /// Returns the edit and the ids to send.
    pub fn begin_remove_from_playlist(&mut self) -> Option<(EditId, String, String)> {
        if self.view != View::Playlist {
            self.notify("Open a playlist to remove songs from it");
            return None;
        }
        let song_id = self.selected_track()?.id.clone();
        let playlist = self.playlist.as_mut()?;
        let position = playlist.items.iter().position(|i| i.track.id == song_id)?;
        let item = playlist.items.remove(position);
        let playlist_id = playlist.id.clone();
        self.adjust_song_count(&playlist_id, -1);
        self.refresh_rows();

        let edit = self.playlist_edits.record(PlaylistRemoval {
            playlist_id: playlist_id.clone(),
            position,
            item,
        });
        Some((edit, playlist_id, song_id))
    }

    pub fn finish_remove_from_playlist(&mut self, edit: EditId, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.playlist_edits.commit(edit);
            }
            Err(e) => {
                if let Some(prior) = self.playlist_edits.rollback(edit) {
                    for later in self
                        .playlist_edits
                        .pending_after_mut(edit)
                        .filter(|p| p.playlist_id == prior.playlist_id && p.position >= prior.position)
                    {
                        later.position += 1;
                    }
                    self.adjust_song_count(&prior.playlist_id, 1);
                    if let Some(p) = self.playlist.as_mut().filter(|p| p.id == prior.playlist_id) {
                        let at = prior.position.min(p.items.len());
                        p.items.insert(at, prior.item);
                        self.refresh_rows();
                    }
                }
                self.report(&e);
            }
        }
    }

    fn adjust_song_count(&mut self, playlist_id: &str, delta: isize) {
        if let Some(s) = self.playlists.iter_mut().find(|s| s.id == playlist_id) {
            s.song_count = s.song_count.saturating_add_signed(delta);
        }
    }

    /// The selected track, if this user may delete it.
    pub fn begin_delete_song(&mut self) -> Option<Track> {
        let track = self.selected_track()?.clone();
        if self.user.as_ref().is_some_and(|u| !u.is_admin()) {
            self.report_text("Deleting songs needs an admin account");
            return None;
        }
        Some(track)
    }

    /// Drop a deleted song from every local list.
    pub fn finish_delete_song(&mut self, id: &str, result: Result<(), ApiError>) -> bool {
        match result {
            Ok(()) => {
                self.songs.retain(|t| t.id != id);
                self.favourites.remove(id);
                if let Some(p) = self.playlist.as_mut() {
                    p.items.retain(|i| i.track.id != id);
                }
                self.spotlight.forget(id);
                self.refresh_rows();
                self.notify("Song deleted");
                true
            }
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }
}
