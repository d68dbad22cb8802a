use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::config::ApiSettings;

use super::error::ApiError;
use super::models::{Envelope, PlaylistRecord, UserRecord};

/// CRUD collections exposed by the API. They all share one shape.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource {
    Songs,
    Artists,
    Albums,
    Playlists,
    Users,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Songs => "songs",
            Resource::Artists => "artists",
            Resource::Albums => "albums",
            Resource::Playlists => "playlists",
            Resource::Users => "users",
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Blocking HTTP client for the streaming API.
///
/// Calls block the calling thread; the UI only ever calls these from a worker
/// (see `crate::sync`).
#[derive(Clone)]
pub struct ApiClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, settings: &ApiSettings) -> Self {
        // Error statuses still carry an envelope, so read the body ourselves.
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs.max(1))))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone().filter(|t| !t.trim().is_empty()),
        }
    }

    pub(crate) fn agent(&self) -> &Agent {
        &self.agent
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn authorize<B>(&self, req: RequestBuilder<B>) -> RequestBuilder<B> {
        match &self.token {
            Some(t) => req.header("Authorization", format!("Bearer {t}")),
            None => req,
        }
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(path);
        debug!(?method, %url, "api request");

        let body = body.unwrap_or(serde_json::Value::Null);
        let response = match method {
            Method::Get => self.authorize(self.agent.get(&url)).call(),
            Method::Delete => self.authorize(self.agent.delete(&url)).call(),
            Method::Post => self.authorize(self.agent.post(&url)).send_json(&body),
            Method::Put => self.authorize(self.agent.put(&url)).send_json(&body),
        };
        let mut response = response?;

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        decode_envelope(status, &text)
    }

    fn send_data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        self.send(method, path, body)?.ok_or_else(|| ApiError::Status {
            status: 200,
            message: format!("response to {path} carried no data"),
        })
    }

    pub fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ApiError> {
        Ok(self
            .send::<Vec<T>>(Method::Get, resource.path(), None)?
            .unwrap_or_default())
    }

    pub fn get<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, ApiError> {
        self.send_data(Method::Get, &format!("{}/{id}", resource.path()), None)
    }

    pub fn create<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: Resource,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.send_data(Method::Post, resource.path(), Some(body))
    }

    pub fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        self.send_data(Method::Put, &format!("{}/{id}", resource.path()), Some(body))
    }

    pub fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(Method::Delete, &format!("{}/{id}", resource.path()), None)?;
        Ok(())
    }

    pub fn add_playlist_song(
        &self,
        playlist_id: &str,
        song_id: &str,
    ) -> Result<PlaylistRecord, ApiError> {
        self.send_data(
            Method::Post,
            &format!("playlists/{playlist_id}/songs"),
            Some(json!({ "songId": song_id })),
        )
    }

    pub fn remove_playlist_song(&self, playlist_id: &str, song_id: &str) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(
            Method::Delete,
            &format!("playlists/{playlist_id}/songs/{song_id}"),
            None,
        )?;
        Ok(())
    }

    /// Flip `song_id` in the user's favourites; returns the updated user.
    pub fn toggle_favourite(&self, user_id: &str, song_id: &str) -> Result<UserRecord, ApiError> {
        self.send_data(
            Method::Put,
            &format!("users/{user_id}/favourites"),
            Some(json!({ "songId": song_id })),
        )
    }
}

/// Turn a status code and raw body into the envelope's data or an `ApiError`.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &str,
) -> Result<Option<T>, ApiError> {
    let ok_status = (200..300).contains(&status);

    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(e) => e,
        Err(e) if ok_status => return Err(ApiError::Decode(e)),
        Err(_) => {
            // Proxies and gateways answer errors without an envelope.
            let message = body.trim();
            let message = if message.is_empty() {
                format!("HTTP {status}")
            } else {
                message.chars().take(200).collect()
            };
            return Err(status_error(status, message));
        }
    };

    if !ok_status || !envelope.success {
        let message = if envelope.message.is_empty() {
            format!("HTTP {status}")
        } else {
            envelope.message
        };
        warn!(status, %message, "api call failed");
        return Err(status_error(status, message));
    }

    Ok(envelope.data)
}

fn status_error(status: u16, message: String) -> ApiError {
    match status {
        401 => ApiError::Unauthorized { message },
        403 => ApiError::Forbidden { message },
        _ => ApiError::Status { status, message },
    }
}
