//! Playback queue state machine.
//!
//! `QueueStore` owns the active queue, the current position and the transient
//! playback flags. It is an owned context object handed to whoever needs it; the
//! only way to change it is through its transport operations.

mod persist;
mod queue;
mod types;

pub use persist::{PersistError, PersistedPlayback, state_path};
pub use queue::QueueStore;
pub use types::RepeatMode;
