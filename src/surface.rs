//! Playback surface: binds a media output to the queue store.
//!
//! The store says what should be playing; the surface makes a `MediaOutput`
//! agree with it (`sync`) and turns what the output reports back into store
//! updates (`handle_event`). Seek gestures and the transport keys live here too.

mod output;
mod playback;

pub use output::{MediaEvent, MediaOutput};
pub use playback::{PlaybackSurface, SurfaceError, SurfaceState};
