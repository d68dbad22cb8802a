//! Client side of the streaming API.
//!
//! Every response is wrapped in a `{ success, message, data, timestamp }`
//! envelope; `client` unwraps it and normalizes failures into `ApiError`.
//! `TrackSource` is the seam the rest of the app talks to, implemented by the
//! REST client and by a plain local directory.

mod client;
mod error;
mod models;
mod source;
mod storage;

pub use client::{ApiClient, Resource};
pub use error::ApiError;
pub use models::*;
pub use source::{ApiSource, LocalSource, TrackSource};
pub use storage::BlobStore;

#[cfg(test)]
mod tests;
