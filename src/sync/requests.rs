use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{trace, warn};

use crate::api::{ApiError, TrackSource, UserRecord};
use crate::library::{Playlist, PlaylistSummary, Track};

use super::generation::Ticket;
use super::ledger::EditId;

/// A finished network call, delivered to the event loop.
#[derive(Debug)]
pub enum NetEvent {
    Songs {
        ticket: Ticket,
        result: Result<Vec<Track>, ApiError>,
    },
    Profile(Result<Option<UserRecord>, ApiError>),
    Playlists(Result<Vec<PlaylistSummary>, ApiError>),
    Playlist {
        ticket: Ticket,
        result: Result<Playlist, ApiError>,
    },
    Favourite {
        edit: EditId,
        result: Result<Vec<String>, ApiError>,
    },
    PlaylistAddition {
        playlist_id: String,
        result: Result<(), ApiError>,
    },
    PlaylistRemoval {
        edit: EditId,
        result: Result<(), ApiError>,
    },
    SongDeleted {
        id: String,
        result: Result<(), ApiError>,
    },
}

/// Spawns one detached worker per call.
#[derive(Clone)]
pub struct Requests {
    source: Arc<dyn TrackSource>,
    tx: Sender<NetEvent>,
}

impl Requests {
    pub fn new(source: Arc<dyn TrackSource>, tx: Sender<NetEvent>) -> Self {
        Self { source, tx }
    }

    pub fn source_label(&self) -> String {
        self.source.label()
    }

    fn spawn<F>(&self, name: &str, job: F)
    where
        F: FnOnce(&dyn TrackSource) -> NetEvent + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let label = name.to_string();

        let spawned = thread::Builder::new()
            .name(format!("net-{name}"))
            .spawn(move || {
                let event = job(source.as_ref());
                trace!(job = %label, "request finished");
                // The loop may already be gone during shutdown.
                let _ = tx.send(event);
            });
        if let Err(e) = spawned {
            warn!(job = name, error = %e, "failed to spawn request thread");
        }
    }

    pub fn fetch_songs(&self, ticket: Ticket) {
        self.spawn("songs", move |s| NetEvent::Songs {
            ticket,
            result: s.songs(),
        });
    }

    pub fn fetch_profile(&self) {
        self.spawn("profile", |s| NetEvent::Profile(s.profile()));
    }

    pub fn fetch_playlists(&self) {
        self.spawn("playlists", |s| NetEvent::Playlists(s.playlists()));
    }

    pub fn fetch_playlist(&self, ticket: Ticket, id: String) {
        self.spawn("playlist", move |s| NetEvent::Playlist {
            ticket,
            result: s.playlist(&id),
        });
    }

    pub fn toggle_favourite(&self, edit: EditId, song_id: String) {
        self.spawn("favourite", move |s| NetEvent::Favourite {
            edit,
            result: s.toggle_favourite(&song_id),
        });
    }

    pub fn add_to_playlist(&self, playlist_id: String, song_id: String) {
        self.spawn("playlist-add", move |s| NetEvent::PlaylistAddition {
            result: s.add_to_playlist(&playlist_id, &song_id),
            playlist_id,
        });
    }

    pub fn remove_from_playlist(&self, edit: EditId, playlist_id: String, song_id: String) {
        self.spawn("playlist-remove", move |s| NetEvent::PlaylistRemoval {
            edit,
            result: s.remove_from_playlist(&playlist_id, &song_id),
        });
    }

    pub fn delete_song(&self, track: Track) {
        self.spawn("delete-song", move |s| NetEvent::SongDeleted {
            result: s.delete_song(&track),
            id: track.id,
        });
    }
}
