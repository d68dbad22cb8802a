use crate::mpris::{MprisHandle, PlaybackStatus, Snapshot, TrackMeta};
use crate::store::QueueStore;

pub fn snapshot(store: &QueueStore) -> Snapshot {
    let track = store.current().map(|t| TrackMeta {
        id: t.id.clone(),
        title: t.name.clone(),
        artists: t.artists.clone(),
        album: t.album.clone(),
        art_url: t.artwork_url.clone(),
        url: t.media_url.clone(),
        length: store.duration().or(t.duration),
    });

    let status = match (&track, store.is_playing()) {
        (None, _) => PlaybackStatus::Stopped,
        (Some(_), true) => PlaybackStatus::Playing,
        (Some(_), false) => PlaybackStatus::Paused,
    };

    Snapshot {
        status,
        track,
        position: store.progress(),
        volume: store.volume(),
        shuffle: store.is_shuffle(),
        repeat: store.repeat_mode(),
    }
}

/// Publish the store to MPRIS when it differs from what was last sent.
pub fn update_mpris(mpris: &MprisHandle, store: &QueueStore, last: &mut Option<Snapshot>) {
    let next = snapshot(store);
    if last.as_ref() != Some(&next) {
        mpris.update(next.clone());
        *last = Some(next);
    }
}
