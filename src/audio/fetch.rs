use std::fs;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use super::types::AudioError;

/// Upper bound on a single media download.
const MAX_MEDIA_BYTES: u64 = 512 * 1024 * 1024;

pub(super) fn is_remote(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub(super) fn media_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Read the whole media file into memory, from disk or over HTTP.
///
/// Keeping the bytes lets a seek rebuild the decoder without fetching again.
pub(super) fn load_bytes(agent: &Agent, locator: &str) -> Result<Arc<[u8]>, AudioError> {
    if !is_remote(locator) {
        let bytes = fs::read(locator).map_err(|source| AudioError::Read {
            locator: locator.to_string(),
            source,
        })?;
        return Ok(bytes.into());
    }

    let response = agent.get(locator).call().map_err(|source| AudioError::Fetch {
        locator: locator.to_string(),
        source,
    })?;

    let mut bytes = Vec::new();
    response
        .into_body()
        .into_reader()
        .take(MAX_MEDIA_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|source| AudioError::Read {
            locator: locator.to_string(),
            source,
        })?;
    debug!(locator, len = bytes.len(), "media fetched");
    Ok(bytes.into())
}
