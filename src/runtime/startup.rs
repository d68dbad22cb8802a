use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiSource, LocalSource, TrackSource};
use crate::app::App;
use crate::config;
use crate::store::{PersistedPlayback, QueueStore, state_path};
use crate::sync::Requests;

/// The REST API when a base URL is configured, else a directory of files
/// (first CLI argument, or the working directory).
pub fn build_source(settings: &config::Settings) -> Arc<dyn TrackSource> {
    if let Some(api) = ApiSource::from_settings(settings) {
        info!(source = %api.label(), "using API track source");
        return Arc::new(api);
    }

    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"));
    info!(dir = %dir.display(), "using local track source");
    Arc::new(LocalSource::new(dir, settings.library.clone()))
}

/// Config defaults first, then whatever the last session saved.
///
/// Returns the store and, when persistence is on, where to save it.
pub fn restore_store(settings: &config::Settings) -> (QueueStore, Option<PathBuf>) {
    let mut store = QueueStore::new();
    store.set_mini_player(settings.ui.mini_player);
    PersistedPlayback {
        volume: settings.playback.volume,
        shuffle: settings.playback.shuffle,
        repeat: settings.playback.repeat,
    }
    .apply(&mut store);

    if !settings.playback.persist_state {
        return (store, None);
    }

    let path = state_path();
    if let Some(p) = &path {
        match PersistedPlayback::load(p) {
            Ok(Some(saved)) => saved.apply(&mut store),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring saved playback state"),
        }
    }
    (store, path)
}

/// Kick off the fetches every session starts with.
pub fn initial_fetches(app: &mut App, requests: &Requests) {
    let ticket = app.request_songs();
    requests.fetch_songs(ticket);
    requests.fetch_profile();
    requests.fetch_playlists();
}
