//! Wire records for the streaming API, and their conversion into `Track`s.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TrackDisplayField;
use crate::library::{Playlist, PlaylistItem, PlaylistSummary, Track, display_from_fields};

/// `{ success, message, data, timestamp }` wrapper around every response body.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(rename = "songURL")]
    pub song_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default = "yes")]
    pub is_public: bool,
    #[serde(default)]
    pub play_count: u64,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl SongRecord {
    pub fn into_track(self, fields: &[TrackDisplayField], sep: &str) -> Track {
        let display = display_from_fields(
            &self.song_url,
            &self.name,
            &self.artist,
            self.album.as_deref(),
            fields,
            sep,
        );
        let duration = self
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(Duration::from_secs_f64);

        Track {
            id: self.id,
            name: self.name,
            artists: self.artist,
            album: self.album,
            media_url: self.song_url,
            artwork_url: self.image_url,
            duration,
            display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub songs: Vec<String>,
}

/// One song inside `GET /playlists/:id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub song: SongRecord,
    #[serde(default)]
    pub added_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default = "yes")]
    pub is_public: bool,
    #[serde(default)]
    pub songs: Vec<PlaylistEntry>,
}

impl PlaylistRecord {
    pub fn summary(&self) -> PlaylistSummary {
        PlaylistSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            song_count: self.songs.len(),
        }
    }

    pub fn into_playlist(self, fields: &[TrackDisplayField], sep: &str) -> Playlist {
        Playlist {
            id: self.id,
            name: self.name,
            items: self
                .songs
                .into_iter()
                .map(|e| PlaylistItem {
                    track: e.song.into_track(fields, sep),
                    added_at: e.added_at,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub favourites: Vec<String>,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
