use std::path::PathBuf;

use tracing::info;

use crate::config::{LibrarySettings, Settings, TrackDisplayField};
use crate::library::{self, Playlist, PlaylistSummary, Track};

use super::client::{ApiClient, Resource};
use super::error::ApiError;
use super::models::{PlaylistRecord, SongRecord, UserRecord};
use super::storage::BlobStore;

/// Where tracks, favourites and playlists come from.
///
/// Every method blocks, so callers run them off the UI thread. Capabilities a
/// source lacks report `ApiError::Unsupported`.
pub trait TrackSource: Send + Sync {
    /// Short name for the header line.
    fn label(&self) -> String;

    fn songs(&self) -> Result<Vec<Track>, ApiError>;

    /// The signed-in user, if this source knows about users at all.
    fn profile(&self) -> Result<Option<UserRecord>, ApiError> {
        Ok(None)
    }

    fn playlists(&self) -> Result<Vec<PlaylistSummary>, ApiError> {
        Ok(Vec::new())
    }

    fn playlist(&self, _id: &str) -> Result<Playlist, ApiError> {
        Err(ApiError::Unsupported("playlists"))
    }

    /// Flip a song in the user's favourites and return the resulting set.
    fn toggle_favourite(&self, _song_id: &str) -> Result<Vec<String>, ApiError> {
        Err(ApiError::Unsupported("favourites"))
    }

    fn add_to_playlist(&self, _playlist_id: &str, _song_id: &str) -> Result<(), ApiError> {
        Err(ApiError::Unsupported("playlists"))
    }

    fn remove_from_playlist(&self, _playlist_id: &str, _song_id: &str) -> Result<(), ApiError> {
        Err(ApiError::Unsupported("playlists"))
    }

    fn delete_song(&self, _track: &Track) -> Result<(), ApiError> {
        Err(ApiError::Unsupported("deleting songs"))
    }
}

pub struct ApiSource {
    client: ApiClient,
    base_url: String,
    user_id: Option<String>,
    blobs: Option<BlobStore>,
    display_fields: Vec<TrackDisplayField>,
    display_separator: String,
}

impl ApiSource {
    /// `None` when no API base URL is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let base_url = settings.api.base_url.as_deref()?.trim();
        if base_url.is_empty() {
            return None;
        }

        let client = ApiClient::new(base_url, &settings.api);
        let blobs = settings
            .api
            .storage_base_url
            .as_deref()
            .map(|b| BlobStore::new(client.clone(), b));

        Some(Self {
            client,
            base_url: base_url.to_string(),
            user_id: settings.api.user_id.clone().filter(|u| !u.is_empty()),
            blobs,
            display_fields: settings.library.display_fields.clone(),
            display_separator: settings.library.display_separator.clone(),
        })
    }

    fn user_id(&self) -> Result<&str, ApiError> {
        self.user_id.as_deref().ok_or_else(|| ApiError::Unauthorized {
            message: "no api.user_id configured".to_string(),
        })
    }
}

impl TrackSource for ApiSource {
    fn label(&self) -> String {
        self.base_url.clone()
    }

    fn songs(&self) -> Result<Vec<Track>, ApiError> {
        let records: Vec<SongRecord> = self.client.list(Resource::Songs)?;
        Ok(records
            .into_iter()
            .map(|r| r.into_track(&self.display_fields, &self.display_separator))
            .collect())
    }

    fn profile(&self) -> Result<Option<UserRecord>, ApiError> {
        match &self.user_id {
            Some(id) => self.client.get(Resource::Users, id).map(Some),
            None => Ok(None),
        }
    }

    fn playlists(&self) -> Result<Vec<PlaylistSummary>, ApiError> {
        let records: Vec<PlaylistRecord> = self.client.list(Resource::Playlists)?;
        Ok(records.iter().map(PlaylistRecord::summary).collect())
    }

    fn playlist(&self, id: &str) -> Result<Playlist, ApiError> {
        let record: PlaylistRecord = self.client.get(Resource::Playlists, id)?;
        Ok(record.into_playlist(&self.display_fields, &self.display_separator))
    }

    fn toggle_favourite(&self, song_id: &str) -> Result<Vec<String>, ApiError> {
        let user = self.client.toggle_favourite(self.user_id()?, song_id)?;
        Ok(user.favourites)
    }

    fn add_to_playlist(&self, playlist_id: &str, song_id: &str) -> Result<(), ApiError> {
        self.client.add_playlist_song(playlist_id, song_id).map(drop)
    }

    fn remove_from_playlist(&self, playlist_id: &str, song_id: &str) -> Result<(), ApiError> {
        self.client.remove_playlist_song(playlist_id, song_id)
    }

    /// Deletes the record, then its uploaded blobs.
    fn delete_song(&self, track: &Track) -> Result<(), ApiError> {
        self.client.delete(Resource::Songs, &track.id)?;
        info!(id = %track.id, "song deleted");

        if let Some(blobs) = &self.blobs {
            blobs.delete(&track.media_url);
            blobs.delete(&track.artwork_url);
        }
        Ok(())
    }
}

/// A directory of audio files standing in for the API.
pub struct LocalSource {
    dir: PathBuf,
    settings: LibrarySettings,
}

impl LocalSource {
    pub fn new(dir: PathBuf, settings: LibrarySettings) -> Self {
        Self { dir, settings }
    }
}

impl TrackSource for LocalSource {
    fn label(&self) -> String {
        self.dir.display().to_string()
    }

    fn songs(&self) -> Result<Vec<Track>, ApiError> {
        Ok(library::scan(&self.dir, &self.settings))
    }
}
