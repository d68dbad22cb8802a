//! Track model plus the local-directory track source.
//!
//! Tracks normally come from the streaming API (see `crate::api`), but a plain
//! directory of audio files can stand in for it; `scan` builds the same `Track`
//! values from file tags.

mod display;
mod model;
mod scan;

pub use display::display_from_fields;
pub use model::*;
pub use scan::scan;

#[cfg(test)]
mod tests;
