use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::library::Track;

use super::types::RepeatMode;

/// Past this point `previous` restarts the current track instead of going back.
const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// The playback queue and its transport operations.
///
/// Invariant: whenever `current` is `Some`, `queue[index]` holds the same track.
/// Every transport operation on an empty queue is a silent no-op, as is any
/// index-based operation with an out-of-range index.
pub struct QueueStore {
    current: Option<Track>,
    queue: Vec<Track>,
    /// Queue order from before shuffle was enabled.
    original: Vec<Track>,
    /// `queue[i]` is `original[slots[i]]`.
    slots: Vec<usize>,
    index: usize,
    playing: bool,
    shuffle: bool,
    repeat: RepeatMode,
    volume: f32,
    progress: Duration,
    duration: Option<Duration>,
    mini_player: bool,
    /// Bumped whenever the current track must start over from zero without a
    /// track change, so the playback surface knows to seek.
    restart_seq: u64,
    rng: StdRng,
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// A store whose shuffle and random picks are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            current: None,
            queue: Vec::new(),
            original: Vec::new(),
            slots: Vec::new(),
            index: 0,
            playing: false,
            shuffle: false,
            repeat: RepeatMode::None,
            volume: 1.0,
            progress: Duration::ZERO,
            duration: None,
            mini_player: false,
            restart_seq: 0,
            rng,
        }
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Position of the current track in `queue()`.
    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|_| self.index)
    }

    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    pub fn original_queue(&self) -> &[Track] {
        &self.original
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn progress(&self) -> Duration {
        self.progress
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn mini_player(&self) -> bool {
        self.mini_player
    }

    pub fn restart_seq(&self) -> u64 {
        self.restart_seq
    }

    /// Make `queue[index]` current and mark it playing. Selecting the track that
    /// is already current restarts it. Another copy of the same track counts as
    /// the same media, so it restarts too.
    fn select(&mut self, index: usize) {
        let track = self.queue[index].clone();
        let same = self.current.as_ref().is_some_and(|c| c.id == track.id);

        self.index = index;
        self.playing = true;
        self.progress = Duration::ZERO;
        if same {
            self.restart_seq += 1;
        } else {
            self.duration = track.duration;
        }
        trace!(index, id = %track.id, restart = same, "select");
        self.current = Some(track);
    }

    /// Start playing `track`, replacing the queue wholesale.
    ///
    /// With no `queue` the new queue is just `[track]`. When a queue is given,
    /// `index` is used if it points at `track`; otherwise the track is looked up by
    /// id, and a queue that does not contain it at all is replaced by `[track]`.
    pub fn play(&mut self, track: Track, queue: Option<Vec<Track>>, index: Option<usize>) {
        let (queue, index) = match queue {
            Some(q) => {
                let at = index
                    .filter(|&i| q.get(i).is_some_and(|t| t.id == track.id))
                    .or_else(|| q.iter().position(|t| t.id == track.id));
                match at {
                    Some(i) => (q, i),
                    None => {
                        debug!(id = %track.id, "track not in supplied queue, playing it alone");
                        (vec![track], 0)
                    }
                }
            }
            None => (vec![track], 0),
        };

        self.original = queue.clone();
        self.slots = (0..queue.len()).collect();
        self.queue = queue;
        self.select(index);
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn resume(&mut self) {
        if self.current.is_some() {
            self.playing = true;
        }
    }

    pub fn toggle_play(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Advance the queue.
    ///
    /// Repeat-one re-selects (and so restarts) the current track. Shuffle picks
    /// uniformly over the whole queue, the current track included. Otherwise the
    /// queue advances by one, wrapping under repeat-all and stopping on the last
    /// track otherwise.
    pub fn next(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        let next = if self.repeat == RepeatMode::One {
            self.index
        } else if self.shuffle {
            self.rng.random_range(0..self.queue.len())
        } else if self.index + 1 < self.queue.len() {
            self.index + 1
        } else if self.repeat == RepeatMode::All {
            0
        } else {
            debug!("queue exhausted");
            self.playing = false;
            return;
        };

        self.select(next);
    }

    /// Restart the current track if it is more than a few seconds in, otherwise
    /// step back one track (wrapping to the end).
    pub fn previous(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        if self.progress > RESTART_THRESHOLD {
            self.progress = Duration::ZERO;
            self.restart_seq += 1;
            return;
        }

        let prev = if self.index == 0 {
            self.queue.len() - 1
        } else {
            self.index - 1
        };
        self.select(prev);
    }

    /// Where the track at `original_index` of the unshuffled queue sits now.
    pub fn position_of_original(&self, original_index: usize) -> Option<usize> {
        self.slots.iter().position(|&s| s == original_index)
    }

    pub fn play_at_index(&mut self, index: usize) {
        if index < self.queue.len() {
            self.select(index);
        }
    }

    /// Enabling shuffles the queue and moves the current track to the front so
    /// playback carries on; disabling restores the exact pre-shuffle order.
    pub fn toggle_shuffle(&mut self) {
        let current_slot = self
            .current
            .as_ref()
            .and_then(|_| self.slots.get(self.index).copied());

        if self.shuffle {
            self.queue = self.original.clone();
            self.slots = (0..self.queue.len()).collect();
            self.index = current_slot.unwrap_or(0);
            self.shuffle = false;
        } else {
            let mut order: Vec<usize> = (0..self.original.len()).collect();
            order.shuffle(&mut self.rng);
            if let Some(pos) = current_slot.and_then(|slot| order.iter().position(|&s| s == slot)) {
                order.swap(0, pos);
            }
            self.queue = order.iter().map(|&s| self.original[s].clone()).collect();
            self.slots = order;
            self.index = 0;
            self.shuffle = true;
        }
        debug!(shuffle = self.shuffle, "shuffle toggled");
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled != self.shuffle {
            self.toggle_shuffle();
        }
    }

    pub fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.cycled();
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_progress(&mut self, progress: Duration) {
        self.progress = progress;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = Some(duration);
    }

    pub fn toggle_mini_player(&mut self) {
        self.mini_player = !self.mini_player;
    }

    pub fn set_mini_player(&mut self, on: bool) {
        self.mini_player = on;
    }

    /// Drop every copy of track `id` from the queue.
    ///
    /// If it was the current track, whatever slides into its slot becomes
    /// current (the last track if it was at the end). An emptied queue stops
    /// playback.
    pub fn remove_track(&mut self, id: &str) {
        let before = self.queue.len();
        let removed_ahead = self.queue[..self.index.min(before)]
            .iter()
            .filter(|t| t.id == id)
            .count();

        if !self.queue.iter().any(|t| t.id == id) {
            return;
        }

        // Old original position -> new one, for the slots that survive.
        let mut kept = 0;
        let remap: Vec<Option<usize>> = self
            .original
            .iter()
            .map(|t| {
                (t.id != id).then(|| {
                    kept += 1;
                    kept - 1
                })
            })
            .collect();
        self.slots = self
            .queue
            .iter()
            .zip(&self.slots)
            .filter(|(t, _)| t.id != id)
            .filter_map(|(_, &slot)| remap.get(slot).copied().flatten())
            .collect();
        self.queue.retain(|t| t.id != id);
        self.original.retain(|t| t.id != id);

        if self.queue.is_empty() {
            self.current = None;
            self.index = 0;
            self.playing = false;
            self.progress = Duration::ZERO;
            self.duration = None;
            return;
        }

        let was_current = self.current.as_ref().is_some_and(|c| c.id == id);
        if was_current {
            let index = (self.index - removed_ahead).min(self.queue.len() - 1);
            let track = self.queue[index].clone();
            self.index = index;
            self.progress = Duration::ZERO;
            self.duration = track.duration;
            self.current = Some(track);
        } else {
            self.index = (self.index - removed_ahead).min(self.queue.len() - 1);
        }
        debug!(id, remaining = self.queue.len(), "track removed from queue");
    }
}
