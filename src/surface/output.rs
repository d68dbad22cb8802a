use std::time::Duration;

/// Something that can actually make sound.
///
/// Calls are fire-and-forget; results come back later as `MediaEvent`s.
pub trait MediaOutput {
    /// Replace the loaded media. Playback stays paused until `play`.
    fn load(&mut self, locator: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    /// `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
    /// Unload everything.
    fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Media at `locator` decoded and ready; `duration` if the container knows it.
    Loaded {
        locator: String,
        duration: Option<Duration>,
    },
    /// Current position while playing.
    Progress(Duration),
    /// Reached the end of the media. Sent once per playthrough.
    Ended,
    /// Loading, decoding or seeking the media at `locator` failed. The output
    /// has dropped it.
    Failed { locator: String, reason: String },
}
