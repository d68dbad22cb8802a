use std::time::Duration;

use crossterm::event::KeyCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ControlsSettings;
use crate::store::{QueueStore, RepeatMode};

use super::output::{MediaEvent, MediaOutput};

/// `Ended` only lasts while the end of media is handled: the surface moves
/// on to `Loading` for the next track, back to `Playing` on a restart, or
/// to `Idle` when the queue stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("playback failed: {0}")]
    Media(String),
}

/// What the output was last told, so `sync` only sends differences.
struct Mirror {
    /// `(track id, media locator)` of the loaded media.
    loaded: Option<(String, String)>,
    /// Media whose load failed. Not reloaded until the store plays again.
    failed: Option<(String, String)>,
    restart_seq: u64,
    playing: bool,
    volume: Option<f32>,
}

pub struct PlaybackSurface<O: MediaOutput> {
    output: O,
    state: SurfaceState,
    mirror: Mirror,
    /// Fraction under the pointer while a seek drag is active.
    drag: Option<f32>,
    seek_step: Duration,
    volume_step: f32,
}

impl<O: MediaOutput> PlaybackSurface<O> {
    pub fn new(output: O, controls: &ControlsSettings) -> Self {
        Self {
            output,
            state: SurfaceState::Idle,
            mirror: Mirror {
                loaded: None,
                failed: None,
                restart_seq: 0,
                playing: false,
                volume: None,
            },
            drag: None,
            seek_step: Duration::from_secs(controls.seek_seconds),
            volume_step: controls.volume_step,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Bring the output in line with the store. Call after every store mutation.
    pub fn sync(&mut self, store: &QueueStore) {
        let volume = store.volume();
        if self.mirror.volume != Some(volume) {
            self.output.set_volume(volume);
            self.mirror.volume = Some(volume);
        }

        let Some(track) = store.current() else {
            if self.mirror.loaded.is_some() || self.state != SurfaceState::Idle {
                debug!("queue empty, stopping output");
                self.output.stop();
                self.mirror.loaded = None;
                self.mirror.playing = false;
                self.state = SurfaceState::Idle;
            }
            self.mirror.failed = None;
            return;
        };

        if let Some((id, url)) = &self.mirror.failed {
            if *id == track.id && *url == track.media_url && !store.is_playing() {
                return;
            }
            self.mirror.failed = None;
        }

        let changed = self
            .mirror
            .loaded
            .as_ref()
            .is_none_or(|(id, url)| *id != track.id || *url != track.media_url);

        if changed {
            debug!(id = %track.id, url = %track.media_url, "loading track");
            self.output.load(&track.media_url);
            self.mirror.loaded = Some((track.id.clone(), track.media_url.clone()));
            self.mirror.restart_seq = store.restart_seq();
            self.mirror.playing = store.is_playing();
            if self.mirror.playing {
                self.output.play();
            }
            self.state = SurfaceState::Loading;
            return;
        }

        if store.restart_seq() != self.mirror.restart_seq {
            self.mirror.restart_seq = store.restart_seq();
            self.output.seek(Duration::ZERO);
            if matches!(self.state, SurfaceState::Ended | SurfaceState::Idle) && store.is_playing() {
                self.state = SurfaceState::Playing;
            }
        }

        if store.is_playing() != self.mirror.playing {
            self.mirror.playing = store.is_playing();
            if self.mirror.playing {
                self.output.play();
                if self.state != SurfaceState::Loading {
                    self.state = SurfaceState::Playing;
                }
            } else {
                self.output.pause();
                if matches!(self.state, SurfaceState::Playing | SurfaceState::Ready) {
                    self.state = SurfaceState::Paused;
                }
            }
        }
    }

    /// Apply an event reported by the output.
    ///
    /// A failure pauses the store and is returned so the caller can show it;
    /// nothing is retried.
    pub fn handle_event(
        &mut self,
        event: MediaEvent,
        store: &mut QueueStore,
    ) -> Result<(), SurfaceError> {
        match event {
            MediaEvent::Loaded { locator, duration } => {
                if !self.is_loaded(&locator) {
                    debug!(%locator, "ignoring stale load");
                    return Ok(());
                }
                if let Some(d) = duration.filter(|d| !d.is_zero()) {
                    store.set_duration(d);
                }
                self.state = if store.is_playing() {
                    SurfaceState::Playing
                } else {
                    SurfaceState::Ready
                };
            }
            MediaEvent::Progress(position) => {
                if self.drag.is_none() {
                    store.set_progress(position);
                }
            }
            MediaEvent::Ended => {
                if store.repeat_mode() == RepeatMode::One {
                    self.output.seek(Duration::ZERO);
                    store.set_progress(Duration::ZERO);
                    self.state = SurfaceState::Playing;
                    return Ok(());
                }

                self.state = SurfaceState::Ended;
                let before = (store.current_index(), store.restart_seq());
                store.next();
                self.sync(store);

                let advanced = (store.current_index(), store.restart_seq()) != before;
                if !advanced && !store.is_playing() {
                    self.state = SurfaceState::Idle;
                }
            }
            MediaEvent::Failed { locator, reason } => {
                if !self.is_loaded(&locator) {
                    debug!(%locator, %reason, "ignoring failure of replaced media");
                    return Ok(());
                }
                warn!(%locator, %reason, "media failed");
                store.pause();
                // The output dropped the media; a later play must load it again.
                self.mirror.failed = self.mirror.loaded.take();
                self.mirror.playing = false;
                self.state = SurfaceState::Idle;
                return Err(SurfaceError::Media(reason));
            }
        }
        Ok(())
    }

    fn is_loaded(&self, locator: &str) -> bool {
        self.mirror
            .loaded
            .as_ref()
            .is_some_and(|(_, url)| url == locator)
    }

    pub fn begin_seek(&mut self, store: &QueueStore) {
        let fraction = match store.duration() {
            Some(d) if !d.is_zero() => store.progress().as_secs_f32() / d.as_secs_f32(),
            _ => 0.0,
        };
        self.drag = Some(fraction.clamp(0.0, 1.0));
    }

    /// Move the drag preview. Nothing is sent to the output.
    pub fn drag_seek(&mut self, fraction: f32) {
        if self.drag.is_some() {
            self.drag = Some(clamp_fraction(fraction));
        }
    }

    /// Commit a drag at `fraction` of the track.
    pub fn end_seek(&mut self, fraction: f32, store: &mut QueueStore) {
        self.drag = None;
        let Some(duration) = store.duration() else {
            return;
        };
        if store.current().is_none() {
            return;
        }
        let target = duration.mul_f32(clamp_fraction(fraction));
        self.output.seek(target);
        store.set_progress(target);
    }

    pub fn cancel_seek(&mut self) {
        self.drag = None;
    }

    /// Preview fraction while dragging.
    pub fn seek_preview(&self) -> Option<f32> {
        self.drag
    }

    /// Seek by `delta` from the current progress, clamped to `[0, duration]`.
    pub fn seek_relative(&mut self, forward: bool, delta: Duration, store: &mut QueueStore) {
        let progress = store.progress();
        let target = if forward {
            progress.saturating_add(delta)
        } else {
            progress.saturating_sub(delta)
        };
        self.seek_to(target, store);
    }

    /// Jump to `target`, clamped to the known duration.
    pub fn seek_to(&mut self, target: Duration, store: &mut QueueStore) {
        if store.current().is_none() {
            return;
        }
        let target = match store.duration() {
            Some(d) => target.min(d),
            None => target,
        };
        self.output.seek(target);
        store.set_progress(target);
    }

    /// Transport keys. Returns whether the key was consumed.
    pub fn handle_key(&mut self, code: KeyCode, store: &mut QueueStore, input_focused: bool) -> bool {
        if input_focused {
            return false;
        }
        match code {
            KeyCode::Char(' ') => store.toggle_play(),
            KeyCode::Left => self.seek_relative(false, self.seek_step, store),
            KeyCode::Right => self.seek_relative(true, self.seek_step, store),
            KeyCode::Up => store.set_volume(step_volume(store.volume(), self.volume_step)),
            KeyCode::Down => store.set_volume(step_volume(store.volume(), -self.volume_step)),
            _ => return false,
        }
        self.sync(store);
        true
    }
}

fn clamp_fraction(fraction: f32) -> f32 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Round to two decimals so repeated steps land on clean values.
fn step_volume(volume: f32, step: f32) -> f32 {
    (((volume + step) * 100.0).round() / 100.0).clamp(0.0, 1.0)
}
