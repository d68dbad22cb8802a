use serde::{Deserialize, Serialize};

/// What happens when the queue runs out or a track ends.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Stop after the last track of the queue.
    #[default]
    #[serde(alias = "no-loop", alias = "no_loop", alias = "off")]
    None,
    /// Wrap around to the start of the queue.
    #[serde(alias = "loop-all", alias = "loop_all", alias = "loopall")]
    All,
    /// Loop the current track.
    #[serde(alias = "repeat-one", alias = "loop-one", alias = "loop_one")]
    One,
}

impl RepeatMode {
    /// Next mode in the `none -> all -> one -> none` cycle.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::None => "No-repeat",
            RepeatMode::All => "Repeat-all",
            RepeatMode::One => "Repeat-one",
        }
    }
}
