use thiserror::Error;

/// Normalized failure of a call against the track source.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the token is missing, invalid or expired.
    #[error("not signed in: {message}")]
    Unauthorized { message: String },

    /// 403: signed in, but the route needs a different role.
    #[error("not allowed: {message}")]
    Forbidden { message: String },

    /// Any other non-2xx status, or a 2xx envelope with `success: false`.
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0} is not available for this library")]
    Unsupported(&'static str),
}

impl ApiError {
    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized { .. } | ApiError::Forbidden { .. }
        )
    }

    /// One-line text for a notice.
    pub fn notice(&self) -> String {
        match self {
            ApiError::Unauthorized { .. } => "Session expired, sign in again".to_string(),
            ApiError::Forbidden { .. } => "That action needs an admin account".to_string(),
            other => other.to_string(),
        }
    }
}
