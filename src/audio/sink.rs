//! Building `rodio` sinks from in-memory media.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::types::AudioError;

pub(super) type MediaBytes = Arc<[u8]>;

pub(super) fn decode(
    bytes: &MediaBytes,
    locator: &str,
) -> Result<Decoder<Cursor<MediaBytes>>, AudioError> {
    Decoder::new(Cursor::new(bytes.clone())).map_err(|source| AudioError::Decode {
        locator: locator.to_string(),
        source,
    })
}

/// Total length of the media, if the container says.
pub(super) fn probe_duration(bytes: &MediaBytes, locator: &str) -> Result<Option<Duration>, AudioError> {
    Ok(decode(bytes, locator)?.total_duration())
}

/// Create a paused `Sink` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    bytes: &MediaBytes,
    locator: &str,
    start_at: Duration,
    volume: f32,
) -> Result<Sink, AudioError> {
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decode(bytes, locator)?.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.set_volume(volume);
    sink.append(source);
    sink.pause();
    Ok(sink)
}
