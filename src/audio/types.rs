//! Commands understood by the audio thread and the errors it can hit.

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug)]
pub enum AudioCmd {
    /// Fetch and decode new media, replacing the current sink. Keeps the
    /// paused/playing state of whatever was there before.
    Load(String),
    Play,
    Pause,
    /// Jump to an absolute position in the loaded media.
    Seek(Duration),
    SetVolume(f32),
    /// Drop the loaded media.
    Stop,
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    NoDevice(String),

    #[error("cannot read {locator}: {source}")]
    Read {
        locator: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot fetch {locator}: {source}")]
    Fetch {
        locator: String,
        #[source]
        source: ureq::Error,
    },

    #[error("cannot decode {locator}: {source}")]
    Decode {
        locator: String,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}
