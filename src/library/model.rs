use std::time::Duration;

/// One playable song, as loaded into views and queues.
///
/// Tracks are immutable once built and are shared by value: the same id may sit
/// in the "all songs" view, the favourites view and the active queue at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    /// URL or filesystem path of the audio bytes.
    pub media_url: String,
    pub artwork_url: String,
    /// Known duration, if the source supplied one. Otherwise filled in from the
    /// decoded media once it loads.
    pub duration: Option<Duration>,
    pub display: String,
}

impl Track {
    /// Artist names joined for a single status line, skipping blanks.
    pub fn artist_line(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Playlist entry as listed by `GET /playlists`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub song_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistItem {
    pub track: Track,
    pub added_at: Option<String>,
}

/// A playlist with its denormalized song list.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub items: Vec<PlaylistItem>,
}

impl Playlist {
    pub fn tracks(&self) -> Vec<Track> {
        self.items.iter().map(|i| i.track.clone()).collect()
    }
}
