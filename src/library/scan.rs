use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Split a tag's artist value on the separators taggers commonly use.
fn split_artists(raw: &str) -> Vec<String> {
    raw.split([';', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// What the file's tags and header say. Everything is optional.
#[derive(Default)]
struct Tags {
    title: Option<String>,
    artists: Vec<String>,
    album: Option<String>,
    duration: Option<Duration>,
}

fn read_tags(path: &Path) -> Tags {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return Tags::default();
        }
    };

    let mut tags = Tags {
        duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
        ..Tags::default()
    };
    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = tag.title().as_deref().and_then(non_blank);
        tags.artists = tag.artist().as_deref().map(split_artists).unwrap_or_default();
        tags.album = tag.album().as_deref().and_then(non_blank);
    }
    tags
}

/// Local tracks use their path as both id and media locator and carry no artwork.
fn track_from_file(path: &Path, settings: &LibrarySettings) -> Track {
    let tags = read_tags(path);
    let name = tags.title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string()
    });
    let locator = path.display().to_string();
    let display = display_from_fields(
        &locator,
        &name,
        &tags.artists,
        tags.album.as_deref(),
        &settings.display_fields,
        &settings.display_separator,
    );

    Track {
        id: locator.clone(),
        name,
        artists: tags.artists,
        album: tags.album,
        media_url: locator,
        artwork_url: String::new(),
        duration: tags.duration,
        display,
    }
}

/// Audio files under `dir`, honouring the walk settings.
fn audio_files(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);
    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.is_file() && is_audio_file(p, settings))
        .collect()
}

/// Walk `dir` and build a track for every audio file found, sorted by
/// display string.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = audio_files(dir, settings)
        .iter()
        .map(|p| track_from_file(p, settings))
        .collect();
    tracks.sort_by_cached_key(|t| t.display.to_lowercase());
    info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}
