//! Audio output backed by `rodio`.
//!
//! A dedicated thread owns the output stream and the active `Sink`; the rest of
//! the app talks to it through `AudioPlayer`, which implements
//! `surface::MediaOutput`, and hears back through a `MediaEvent` channel.

mod fetch;
mod player;
mod sink;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::{AudioCmd, AudioError};
