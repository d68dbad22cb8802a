use std::path::Path;

use crate::config::TrackDisplayField;

/// Last path segment of a locator without query string or extension.
pub(crate) fn locator_stem(locator: &str) -> Option<&str> {
    let no_query = locator.split(['?', '#']).next().unwrap_or(locator);
    let segment = no_query.rsplit(['/', '\\']).next()?;
    Path::new(segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
}

/// Build a display string for a track according to the provided `fields` and separator.
///
/// This composes metadata fields (artist, title, album, filename, locator) in the
/// configured order and falls back to `name` when no parts were produced.
pub fn display_from_fields(
    locator: &str,
    name: &str,
    artists: &[String],
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let artist_line = artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                // "display" on its own means "artist - title".
                if !artist_line.is_empty() {
                    parts.push(artist_line.clone());
                }
                if !name.trim().is_empty() {
                    parts.push(name.trim().to_string());
                }
            }
            TrackDisplayField::Title => {
                if !name.trim().is_empty() {
                    parts.push(name.trim().to_string());
                }
            }
            TrackDisplayField::Artist => {
                if !artist_line.is_empty() {
                    parts.push(artist_line.clone());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = album.map(str::trim).filter(|s| !s.is_empty()) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = locator_stem(locator) {
                    parts.push(stem.to_string());
                }
            }
            TrackDisplayField::Locator => {
                if !locator.is_empty() {
                    parts.push(locator.to_string());
                }
            }
        }
    }

    if parts.is_empty() {
        name.to_string()
    } else {
        parts.join(sep)
    }
}
