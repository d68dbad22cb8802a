use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};
use ureq::Agent;

use crate::config::AudioSettings;
use crate::surface::MediaEvent;

use super::fetch::{load_bytes, media_agent};
use super::sink::{MediaBytes, create_sink_at, probe_duration};
use super::types::{AudioCmd, AudioError};

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

struct Loaded {
    locator: String,
    bytes: MediaBytes,
    sink: Sink,
}

/// Everything the audio thread owns.
struct Deck {
    stream: Option<OutputStream>,
    agent: Agent,
    settings: AudioSettings,
    events: Sender<MediaEvent>,

    current: Option<Loaded>,
    paused: bool,
    volume: f32,
    /// End of media already reported for this playthrough.
    finished: bool,

    // Elapsed accounting: time since the last resume plus what came before it.
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Deck {
    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn fail(&mut self, locator: &str, err: AudioError) {
        warn!(%locator, error = %err, "audio failure");
        if let Some(old) = self.current.take() {
            old.sink.stop();
        }
        self.paused = true;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.emit(MediaEvent::Failed {
            locator: locator.to_string(),
            reason: err.to_string(),
        });
    }

    fn stream(&self) -> Result<&OutputStream, AudioError> {
        self.stream
            .as_ref()
            .ok_or_else(|| AudioError::NoDevice("output stream unavailable".to_string()))
    }

    fn prepare(&self, locator: &str) -> Result<(MediaBytes, Option<Duration>, Sink), AudioError> {
        let stream = self.stream()?;
        let bytes = load_bytes(&self.agent, locator)?;
        let duration = probe_duration(&bytes, locator)?;
        let sink = create_sink_at(stream, &bytes, locator, Duration::ZERO, self.volume)?;
        Ok((bytes, duration, sink))
    }

    fn load(&mut self, locator: String) {
        let (bytes, duration, new_sink) = match self.prepare(&locator) {
            Ok(v) => v,
            Err(e) => return self.fail(&locator, e),
        };

        // Crossfade if currently playing a sink; otherwise just swap.
        if let Some(old) = self.current.take() {
            if !self.paused && !self.finished {
                self.crossfade(&old.sink, &new_sink);
            }
            old.sink.stop();
        }
        if !self.paused {
            new_sink.play();
            self.started_at = Some(Instant::now());
        } else {
            self.started_at = None;
        }

        debug!(%locator, ?duration, "media loaded");
        self.current = Some(Loaded {
            locator: locator.clone(),
            bytes,
            sink: new_sink,
        });
        self.accumulated = Duration::ZERO;
        self.finished = false;
        self.emit(MediaEvent::Loaded { locator, duration });
    }

    fn crossfade(&self, old: &Sink, new: &Sink) {
        let crossfade_ms = self.settings.crossfade_ms;
        let crossfade_steps = self.settings.crossfade_steps.max(1);
        if crossfade_ms == 0 {
            return;
        }

        new.set_volume(0.0);
        new.play();
        // Fade volumes in a short blocking loop; audio continues in rodio's mixer thread.
        for step in 1..=crossfade_steps {
            let t = (step as f32) / (crossfade_steps as f32);
            old.set_volume(self.volume * (1.0 - t));
            new.set_volume(self.volume * t);
            thread::sleep(Duration::from_millis((crossfade_ms / crossfade_steps).max(1)));
        }
        new.set_volume(self.volume);
    }

    /// Rebuild the sink at `position`, keeping the play/pause state.
    fn seek(&mut self, position: Duration) {
        let Some(loaded) = self.current.take() else {
            return;
        };
        loaded.sink.stop();

        let sink = match self
            .stream()
            .and_then(|s| create_sink_at(s, &loaded.bytes, &loaded.locator, position, self.volume))
        {
            Ok(s) => s,
            Err(e) => return self.fail(&loaded.locator, e),
        };

        if self.paused {
            self.started_at = None;
        } else {
            sink.play();
            self.started_at = Some(Instant::now());
        }
        self.current = Some(Loaded { sink, ..loaded });
        self.accumulated = position;
        self.finished = false;
        self.emit(MediaEvent::Progress(position));
    }

    fn play(&mut self) {
        if self.current.is_none() {
            self.paused = false;
            return;
        }
        if self.finished {
            self.paused = false;
            self.seek(Duration::ZERO);
            return;
        }
        if self.paused {
            if let Some(loaded) = &self.current {
                loaded.sink.play();
            }
            self.started_at = Some(Instant::now());
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        if let Some(loaded) = &self.current {
            loaded.sink.pause();
        }
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
        self.paused = true;
    }

    fn stop(&mut self) {
        if let Some(old) = self.current.take() {
            old.sink.stop();
        }
        self.paused = true;
        self.finished = false;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(loaded) = &self.current {
            loaded.sink.set_volume(self.volume);
        }
    }

    /// Periodic progress report and end-of-media check.
    fn tick(&mut self) {
        let Some(loaded) = &self.current else {
            return;
        };
        if self.paused || self.finished {
            return;
        }

        if loaded.sink.empty() {
            if let Some(st) = self.started_at.take() {
                self.accumulated += st.elapsed();
            }
            self.finished = true;
            self.emit(MediaEvent::Ended);
        } else {
            self.emit(MediaEvent::Progress(self.elapsed()));
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(loaded) = self.current.take() {
            if !self.paused {
                // Fade out gently before stopping.
                fade_out_sink(&loaded.sink, self.volume, fade_out_ms);
            }
            loaded.sink.stop();
        }
    }
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

fn open_stream() -> Option<OutputStream> {
    match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            // rodio logs to stderr when OutputStream is dropped, which would
            // scribble over the TUI.
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            warn!(error = %e, "no audio output device");
            None
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<MediaEvent>,
    settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let interval = Duration::from_millis(settings.progress_interval_ms.clamp(1, 999));
        let mut deck = Deck {
            stream: open_stream(),
            agent: media_agent(FETCH_TIMEOUT),
            settings,
            events,
            current: None,
            paused: true,
            volume: 1.0,
            finished: false,
            started_at: None,
            accumulated: Duration::ZERO,
        };
        let mut last_tick = Instant::now();

        loop {
            match rx.recv_timeout(interval) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load(locator) => deck.load(locator),
                    AudioCmd::Play => deck.play(),
                    AudioCmd::Pause => deck.pause(),
                    AudioCmd::Seek(position) => deck.seek(position),
                    AudioCmd::SetVolume(v) => deck.set_volume(v),
                    AudioCmd::Stop => deck.stop(),
                    AudioCmd::Quit { fade_out_ms } => {
                        deck.quit(fade_out_ms);
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_tick.elapsed() >= interval {
                deck.tick();
                last_tick = Instant::now();
            }
        }
        debug!("audio thread exiting");
    })
}
