use super::display::{display_from_fields, locator_stem};
use super::model::Track;
use crate::config::TrackDisplayField;

#[test]
fn display_from_fields_joins_all_artists() {
    let artists = vec!["Artist".to_string(), "  Guest ".to_string()];
    assert_eq!(
        display_from_fields(
            "https://cdn.example/a/song.mp3",
            "Song",
            &artists,
            None,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - ",
        ),
        "Artist, Guest - Song"
    );
}

#[test]
fn display_from_fields_falls_back_to_name() {
    assert_eq!(
        display_from_fields(
            "",
            "Song",
            &[],
            None,
            &[TrackDisplayField::Artist, TrackDisplayField::Album],
            " - ",
        ),
        "Song"
    );
}

#[test]
fn locator_stem_strips_query_and_extension() {
    assert_eq!(
        locator_stem("https://cdn.example/songs/intro.mp3?token=abc"),
        Some("intro")
    );
    assert_eq!(locator_stem("/music/local/outro.flac"), Some("outro"));
    assert_eq!(locator_stem("https://cdn.example/"), None);
}

#[test]
fn artist_line_skips_blank_names() {
    let t = Track {
        id: "1".into(),
        name: "x".into(),
        artists: vec!["A".into(), " ".into(), "B".into()],
        album: None,
        media_url: String::new(),
        artwork_url: String::new(),
        duration: None,
        display: "x".into(),
    };
    assert_eq!(t.artist_line(), "A, B");
}
