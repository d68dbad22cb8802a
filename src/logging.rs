//! File logging via `tracing-subscriber`.
//!
//! The terminal belongs to the UI, so everything goes to a log file instead:
//! `logging.file`, else `encore.log` in the state directory.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LoggingSettings, default_state_dir};

const FILTER_ENV: &str = "ENCORE_LOG";

pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings
        .file
        .clone()
        .or_else(|| default_state_dir().map(|d| d.join("encore.log")))
}

/// `$ENCORE_LOG` if set and valid, else the configured level, else `info`.
fn filter(settings: &LoggingSettings) -> EnvFilter {
    if let Ok(directive) = env::var(FILTER_ENV) {
        match EnvFilter::try_new(&directive) {
            Ok(f) => return f,
            Err(e) => eprintln!("Ignoring {FILTER_ENV}={directive:?}: {e}"),
        }
    }
    EnvFilter::try_new(&settings.level).unwrap_or_else(|e| {
        eprintln!("Invalid logging.level {:?}: {e}", settings.level);
        EnvFilter::new("info")
    })
}

/// Install the global subscriber. Returns the log file in use, or `None` when
/// logging could not be set up (the app still runs, just silently).
pub fn init(settings: &LoggingSettings) -> Option<PathBuf> {
    let path = log_path(settings)?;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Cannot create log directory {}: {e}", parent.display());
            return None;
        }
    }

    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter(settings))
        .with(layer)
        .try_init()
        .ok()?;

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_file_wins() {
        let settings = LoggingSettings {
            level: "debug".into(),
            file: Some(PathBuf::from("/tmp/encore-test.log")),
        };
        assert_eq!(
            log_path(&settings),
            Some(PathBuf::from("/tmp/encore-test.log"))
        );
    }

    #[test]
    fn configured_level_is_used_when_valid() {
        let settings = LoggingSettings {
            level: "encore=debug".into(),
            file: None,
        };
        assert_eq!(filter(&settings).to_string(), "encore=debug");
    }
}
