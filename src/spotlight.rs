//! Featured track rotation for the header.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::library::Track;

pub struct Spotlight {
    rng: StdRng,
    every: Option<Duration>,
    current: Option<Track>,
    picked_at: Option<Instant>,
}

impl Spotlight {
    /// Rotates every `every_secs` seconds; 0 picks once and keeps it.
    pub fn new(every_secs: u64) -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()), every_secs)
    }

    pub fn with_seed(seed: u64, every_secs: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), every_secs)
    }

    fn with_rng(rng: StdRng, every_secs: u64) -> Self {
        Self {
            rng,
            every: (every_secs > 0).then(|| Duration::from_secs(every_secs)),
            current: None,
            picked_at: None,
        }
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Pick a new featured track. Landing on the previous pick re-rolls once.
    pub fn rotate(&mut self, tracks: &[Track], now: Instant) {
        self.picked_at = Some(now);
        if tracks.is_empty() {
            self.current = None;
            return;
        }

        let mut i = self.rng.random_range(0..tracks.len());
        let repeat = self.current.as_ref().is_some_and(|c| c.id == tracks[i].id);
        if repeat && tracks.len() > 1 {
            i = self.rng.random_range(0..tracks.len());
        }
        trace!(id = %tracks[i].id, "spotlight");
        self.current = Some(tracks[i].clone());
    }

    /// Rotate if the interval has passed (or nothing was picked yet).
    /// Returns whether the pick changed.
    pub fn tick(&mut self, tracks: &[Track], now: Instant) -> bool {
        let due = match (self.picked_at, self.every) {
            (None, _) => true,
            (Some(at), Some(every)) => now.duration_since(at) >= every,
            (Some(_), None) => false,
        };
        if !due {
            return false;
        }
        let before = self.current.as_ref().map(|t| t.id.clone());
        self.rotate(tracks, now);
        before != self.current.as_ref().map(|t| t.id.clone())
    }

    /// Forget a pick that no longer exists in the library.
    pub fn forget(&mut self, id: &str) {
        if self.current.as_ref().is_some_and(|c| c.id == id) {
            self.current = None;
            self.picked_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: &str) -> Track {
        Track {
            id: id.into(),
            name: id.into(),
            artists: vec![],
            album: None,
            media_url: String::new(),
            artwork_url: String::new(),
            duration: None,
            display: id.into(),
        }
    }

    #[test]
    fn empty_library_has_no_spotlight() {
        let mut s = Spotlight::with_seed(1, 30);
        assert!(!s.tick(&[], Instant::now()));
        assert!(s.current().is_none());
    }

    #[test]
    fn single_track_is_always_picked() {
        let mut s = Spotlight::with_seed(1, 30);
        let tracks = [t("a")];
        let now = Instant::now();
        assert!(s.tick(&tracks, now));
        s.rotate(&tracks, now);
        assert_eq!(s.current().unwrap().id, "a");
    }

    #[test]
    fn rotation_waits_for_interval() {
        let mut s = Spotlight::with_seed(5, 30);
        let tracks: Vec<Track> = ["a", "b", "c"].iter().map(|id| t(id)).collect();
        let start = Instant::now();

        s.tick(&tracks, start);
        let first = s.current().unwrap().id.clone();
        assert!(!s.tick(&tracks, start + Duration::from_secs(10)));
        assert_eq!(s.current().unwrap().id, first);
    }

    #[test]
    fn rerolling_makes_repeats_rarer_than_uniform() {
        let tracks: Vec<Track> = ["a", "b"].iter().map(|id| t(id)).collect();
        let mut s = Spotlight::with_seed(42, 1);
        let mut now = Instant::now();
        s.tick(&tracks, now);

        let mut repeats = 0;
        let rounds = 2000;
        for _ in 0..rounds {
            let before = s.current().unwrap().id.clone();
            now += Duration::from_secs(1);
            s.tick(&tracks, now);
            if s.current().unwrap().id == before {
                repeats += 1;
            }
        }
        // Uniform picks repeat half the time; one re-roll brings it to a quarter.
        assert!(repeats < rounds * 35 / 100, "repeats = {repeats}");
    }

    #[test]
    fn zero_interval_never_rotates_after_first_pick() {
        let tracks: Vec<Track> = ["a", "b", "c"].iter().map(|id| t(id)).collect();
        let mut s = Spotlight::with_seed(9, 0);
        let now = Instant::now();
        s.tick(&tracks, now);
        assert!(!s.tick(&tracks, now + Duration::from_secs(3600)));
    }

    #[test]
    fn forgetting_current_pick_clears_it() {
        let mut s = Spotlight::with_seed(1, 30);
        s.rotate(&[t("a")], Instant::now());
        s.forget("a");
        assert!(s.current().is_none());
    }
}
