//! Application module: the view model the TUI and runtime work against.
//!
//! `App` holds the catalogue, the active view (all songs, favourites or a
//! playlist) with its filter and selection, the signed-in user's favourites
//! and playlists, and transient notices. Playback itself lives in
//! `crate::store`.

mod fuzzy;
mod model;
mod notice;

pub use fuzzy::fuzzy_match_positions;
pub use model::*;
pub use notice::{Notice, NoticeKind, Notices};
