use tracing::{debug, warn};

use super::client::ApiClient;

/// Best-effort removal of uploaded media and artwork.
///
/// Only locators under `base_url` are ours to delete; anything else (external
/// links, empty strings) is left alone. Failures are logged and swallowed: the
/// record is already gone by the time blobs are cleaned up.
#[derive(Clone)]
pub struct BlobStore {
    client: ApiClient,
    base_url: String,
}

impl BlobStore {
    pub fn new(client: ApiClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn owns(&self, locator: &str) -> bool {
        !self.base_url.is_empty()
            && locator
                .strip_prefix(&self.base_url)
                .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }

    /// Returns whether the blob was actually deleted.
    pub fn delete(&self, locator: &str) -> bool {
        if !self.owns(locator) {
            debug!(locator, "not a stored blob, skipping");
            return false;
        }

        let req = self.client.authorize(self.client.agent().delete(locator));
        match req.call() {
            Ok(resp) if resp.status().is_success() || resp.status().as_u16() == 404 => true,
            Ok(resp) => {
                warn!(locator, status = resp.status().as_u16(), "blob delete refused");
                false
            }
            Err(e) => {
                warn!(locator, error = %e, "blob delete failed");
                false
            }
        }
    }
}
